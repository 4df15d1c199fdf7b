//! Autoflip and autoplay
//!
//! A small seeded player for the headless demo and attract mode. It flips when
//! the ball drops toward a flipper and plunges when the ball rests in the
//! launch lane. Given the same seed and table it plays the same game.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::ball::in_launch_lane;
use crate::cue::Side;
use crate::sim::table::TickInput;

/// How close (px) the ball must be to a pivot before the pilot flips
const FLIP_REACH: f32 = 26.0;
/// Random extra reach so the pilot doesn't flip at the same spot every time
const FLIP_REACH_JITTER: f32 = 8.0;
/// How long a flip is held (ms)
const FLIP_HOLD_MS: f64 = 160.0;
/// Ball slower than this in the lane counts as resting
const REST_SPEED: f32 = 0.2;

/// What the pilot sees each step
#[derive(Debug, Clone, PartialEq)]
pub struct PilotView {
    pub now: f64,
    pub ball: Vec2,
    pub velocity: Vec2,
    /// Flipper pivots by side
    pub pivots: Vec<(Side, Vec2)>,
    /// Plunger charge start, if held
    pub charging_since: Option<f64>,
    /// Full plunger charge (ms)
    pub full_charge_ms: f64,
}

#[derive(Debug, Clone)]
pub struct Autopilot {
    rng: Pcg32,
    hold_left_until: f64,
    hold_right_until: f64,
    /// Charge target for the current plunge
    charge_ms: Option<f64>,
}

impl Autopilot {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            hold_left_until: f64::NEG_INFINITY,
            hold_right_until: f64::NEG_INFINITY,
            charge_ms: None,
        }
    }

    /// Decide the buttons for this step
    pub fn drive(&mut self, view: &PilotView) -> TickInput {
        let falling = view.velocity.y > 0.0;
        for (side, pivot) in &view.pivots {
            let reach = FLIP_REACH + self.rng.random_range(0.0..FLIP_REACH_JITTER);
            if falling && view.ball.distance(*pivot) < reach {
                let until = view.now + FLIP_HOLD_MS;
                match side {
                    Side::Left => self.hold_left_until = self.hold_left_until.max(until),
                    Side::Right => self.hold_right_until = self.hold_right_until.max(until),
                }
            }
        }

        TickInput {
            flip_left: view.now < self.hold_left_until,
            flip_right: view.now < self.hold_right_until,
            launch: self.plunge(view),
            autoplay: true,
            ..Default::default()
        }
    }

    /// Hold the plunger while the ball rests in the lane, release at the target charge
    fn plunge(&mut self, view: &PilotView) -> bool {
        let resting = in_launch_lane(view.ball) && view.velocity.length() < REST_SPEED;
        match (view.charging_since, self.charge_ms) {
            (None, _) if resting => {
                // Never less than a full charge; the lane needs all of it
                let extra = self.rng.random_range(0.0..250.0);
                self.charge_ms = Some(view.full_charge_ms + extra);
                true
            }
            (Some(since), Some(target)) => {
                if view.now - since < target {
                    true
                } else {
                    self.charge_ms = None;
                    false
                }
            }
            _ => {
                self.charge_ms = None;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(ball: Vec2, velocity: Vec2) -> PilotView {
        PilotView {
            now: 1000.0,
            ball,
            velocity,
            pivots: vec![
                (Side::Left, Vec2::new(53.0, 260.0)),
                (Side::Right, Vec2::new(107.0, 260.0)),
            ],
            charging_since: None,
            full_charge_ms: 2000.0,
        }
    }

    #[test]
    fn test_flips_side_the_ball_falls_to() {
        let mut pilot = Autopilot::new(7);
        let input = pilot.drive(&view(Vec2::new(60.0, 250.0), Vec2::new(0.0, 2.0)));
        assert!(input.flip_left);
        assert!(!input.flip_right);
    }

    #[test]
    fn test_rising_ball_is_left_alone() {
        let mut pilot = Autopilot::new(7);
        let input = pilot.drive(&view(Vec2::new(60.0, 250.0), Vec2::new(0.0, -2.0)));
        assert!(!input.flip_left && !input.flip_right);
    }

    #[test]
    fn test_flip_is_held_briefly() {
        let mut pilot = Autopilot::new(1);
        pilot.drive(&view(Vec2::new(100.0, 255.0), Vec2::new(0.0, 2.0)));
        let mut later = view(Vec2::new(80.0, 100.0), Vec2::new(0.0, -3.0));
        later.now += 100.0;
        assert!(pilot.drive(&later).flip_right);
        later.now += 100.0;
        assert!(!pilot.drive(&later).flip_right);
    }

    #[test]
    fn test_plunges_with_full_charge() {
        let mut pilot = Autopilot::new(3);
        let mut v = view(Vec2::new(172.0, 268.0), Vec2::ZERO);
        assert!(pilot.drive(&v).launch);

        v.charging_since = Some(1000.0);
        v.now = 2500.0;
        assert!(pilot.drive(&v).launch);
        v.now = 3300.0;
        assert!(!pilot.drive(&v).launch);
    }

    #[test]
    fn test_same_seed_same_decisions() {
        let mut a = Autopilot::new(42);
        let mut b = Autopilot::new(42);
        for i in 0..50 {
            let v = view(Vec2::new(40.0 + i as f32, 240.0), Vec2::new(0.0, 1.0));
            assert_eq!(a.drive(&v), b.drive(&v));
        }
    }
}
