//! Orbit Pinball - a space-themed pinball table
//!
//! Core modules:
//! - `sim`: Deterministic table simulation (collision routing, scoring, missions)
//! - `tuning`: Versioned, data-driven table configuration with named presets
//! - `cue`: Fire-and-forget audio/visual cue requests for the presentation layer
//! - `error`: Construction and configuration errors

pub mod cue;
pub mod error;
pub mod sim;
pub mod tuning;

pub use cue::{Cue, CueQueue, CueRequest};
pub use error::{TableError, TableResult};
pub use tuning::{TablePreset, Tuning};

use glam::Vec2;

/// Table geometry and timing constants
pub mod consts {
    use glam::Vec2;

    /// Fixed simulation timestep in milliseconds (60 Hz, matching the board's integrator)
    pub const STEP_MS: f64 = 1000.0 / 60.0;

    /// Visible screen height; the table is two screens tall
    pub const SCREEN_HEIGHT: f32 = 144.0;

    /// Ball is considered drained below this line
    pub const BALL_LOST_Y: f32 = SCREEN_HEIGHT * 2.0 + 40.0;
    /// Balls left of this x drained from the refuel table, not the main board
    pub const REFUEL_DRAIN_X: f32 = 0.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 6.0;
    pub const BALL_MASS: f32 = 3.0;
    pub const BALL_FRICTION: f32 = 0.00035;
    pub const BALL_RESTITUTION: f32 = 0.15;

    /// Where a fresh ball is placed (top of the launch lane)
    pub const BALL_START: Vec2 = Vec2::new(169.0, 250.0);
    /// Plunger only fires while the ball sits inside this corner of the lane
    pub const LAUNCH_LANE_MIN: Vec2 = Vec2::new(160.0, 260.0);

    /// Refuel loop endpoints
    pub const REFUEL_ZONE: Vec2 = Vec2::new(-100.0, 140.0);
    pub const REFUEL_RETURN: Vec2 = Vec2::new(52.0, 145.0);

    /// Horizontal offset of the refuel table relative to the main board
    pub const REFUEL_OFFSET_X: f32 = -180.0;

    /// Slingshots left of this line kick right, the others kick left
    pub const TABLE_CENTER_X: f32 = 80.0;

    /// Flipper rig (main board; the refuel pair is shifted by `REFUEL_OFFSET_X`)
    pub const FLIPPER_X: f32 = 53.0;
    pub const FLIPPER_Y: f32 = 260.0;
    pub const FLIPPER_DIST: f32 = 54.0;
    pub const FLIPPER_LENGTH: f32 = 25.0;
    pub const FLIPPER_THICKNESS: f32 = 3.0;
    /// Pivot sits this far behind the flipper's center, along its axis
    pub const FLIPPER_PIVOT_OFFSET: f32 = 10.0;
    pub const LEVER_LENGTH: f32 = 32.0;
    /// Degrees swept between rest and fully extended
    pub const FLIPPER_SWEEP_DEG: f32 = 58.0;
    pub const LEFT_REST_DEG: f32 = 210.0;
    pub const RIGHT_REST_DEG: f32 = 330.0;

    /// Bumper radius
    pub const BUMPER_SIZE: f32 = 5.0;

    /// Blink period for lights in the blinking state
    pub const BLINK_PERIOD_MS: f64 = 1000.0;

    /// How long an on-screen message stays up
    pub const MESSAGE_MS: f64 = 2000.0;
}

/// Convert degrees to radians
#[inline]
pub fn deg_to_rad(deg: f32) -> f32 {
    deg.to_radians()
}

/// Unit vector for an angle in degrees (screen space, y grows downward)
#[inline]
pub fn direction_from_deg(deg: f32) -> Vec2 {
    let rad = deg_to_rad(deg);
    Vec2::new(rad.cos(), rad.sin())
}

/// Wrap an index into `[0, len)`, accepting negative offsets
#[inline]
pub fn wrap_index(i: isize, len: usize) -> usize {
    let len = len as isize;
    (((i % len) + len) % len) as usize
}
