//! Flipper actuator
//!
//! Each flipper is a bar pinned at its pivot and dragged around by an invisible
//! lever body. The actuator never touches the bar directly: it interpolates a
//! target angle and places the lever at `pivot - dir(angle) * LEVER_LENGTH`
//! every tick, and the link constraint swings the bar after it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::world::{BodyHandle, RigidBodyWorld};
use crate::consts::*;
use crate::cue::Side;
use crate::direction_from_deg;

/// Motion state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlipperState {
    Rest,
    Activating,
    Active,
    Deactivating,
}

/// One flipper's controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flipper {
    pub side: Side,
    pub pivot: Vec2,
    pub bar: BodyHandle,
    pub lever: BodyHandle,
    pub state: FlipperState,
    rest_deg: f32,
    active_deg: f32,
    /// Current target angle in degrees
    angle_deg: f32,
    /// Angle when the current motion began
    from_deg: f32,
    /// Motion progress in `[0, 1]`
    progress: f32,
    duration_ms: f64,
    frame: u8,
}

impl Flipper {
    /// Rest and fully-extended angles for a side
    pub fn angles(side: Side) -> (f32, f32) {
        match side {
            Side::Left => (LEFT_REST_DEG, LEFT_REST_DEG - FLIPPER_SWEEP_DEG),
            Side::Right => (RIGHT_REST_DEG, RIGHT_REST_DEG + FLIPPER_SWEEP_DEG),
        }
    }

    /// Pivot of the flipper on `side` of a rig whose left pivot is `origin`
    pub fn pivot_for(side: Side, origin: Vec2) -> Vec2 {
        match side {
            Side::Left => origin,
            Side::Right => origin + Vec2::new(FLIPPER_DIST, 0.0),
        }
    }

    /// Lever position for a target angle
    pub fn lever_position(pivot: Vec2, angle_deg: f32) -> Vec2 {
        pivot - direction_from_deg(angle_deg) * LEVER_LENGTH
    }

    /// Bar center and orientation (radians) for a target angle
    ///
    /// The link swings the bar to point at the lever, so its axis is the
    /// target angle turned half a revolution.
    pub fn bar_pose(pivot: Vec2, angle_deg: f32) -> (Vec2, f32) {
        let axis = angle_deg + 180.0;
        (
            pivot + direction_from_deg(axis) * FLIPPER_PIVOT_OFFSET,
            axis.to_radians(),
        )
    }

    pub fn new(side: Side, pivot: Vec2, bar: BodyHandle, lever: BodyHandle, duration_ms: f64) -> Self {
        let (rest_deg, active_deg) = Self::angles(side);
        Self {
            side,
            pivot,
            bar,
            lever,
            state: FlipperState::Rest,
            rest_deg,
            active_deg,
            angle_deg: rest_deg,
            from_deg: rest_deg,
            progress: 1.0,
            duration_ms,
            frame: 0,
        }
    }

    /// Key down. Returns true if this press started a new extension.
    pub fn press(&mut self) -> bool {
        match self.state {
            FlipperState::Rest | FlipperState::Deactivating => {
                self.begin(FlipperState::Activating);
                true
            }
            FlipperState::Activating | FlipperState::Active => false,
        }
    }

    /// Key up
    pub fn release(&mut self) {
        if matches!(self.state, FlipperState::Activating | FlipperState::Active) {
            self.begin(FlipperState::Deactivating);
        }
    }

    fn begin(&mut self, state: FlipperState) {
        self.state = state;
        self.from_deg = self.angle_deg;
        self.progress = 0.0;
    }

    /// Advance the interpolation and drive the lever
    pub fn update<W: RigidBodyWorld>(&mut self, world: &mut W, dt_ms: f64) {
        let target = match self.state {
            FlipperState::Rest | FlipperState::Active => return,
            FlipperState::Activating => self.active_deg,
            FlipperState::Deactivating => self.rest_deg,
        };

        self.progress = (self.progress + (dt_ms / self.duration_ms) as f32).min(1.0);
        self.angle_deg = self.from_deg + (target - self.from_deg) * self.progress;
        let extending = self.state == FlipperState::Activating;
        self.frame = animation_frame(self.progress, extending);

        world.set_position(self.lever, Self::lever_position(self.pivot, self.angle_deg));

        if self.progress >= 1.0 {
            self.state = if extending {
                FlipperState::Active
            } else {
                FlipperState::Rest
            };
        }
    }

    pub fn angle_deg(&self) -> f32 {
        self.angle_deg
    }

    /// Sprite frame: 0/1/2 by interpolation third, 2 only while extending
    pub fn frame(&self) -> u8 {
        self.frame
    }
}

fn animation_frame(progress: f32, extending: bool) -> u8 {
    if progress <= 1.0 / 3.0 {
        0
    } else if progress <= 2.0 / 3.0 {
        1
    } else if extending {
        2
    } else {
        0
    }
}
