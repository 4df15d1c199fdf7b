//! Ball controller
//!
//! The single ball body is never destroyed; it is repositioned (warped), held
//! asleep, fired and reset. This module owns the ball-side bookkeeping and the
//! [`Table`] operations that move it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::scheduler::TimerId;
use super::state::{GamePhase, ScoreEvent};
use super::table::{Deferred, Table, WarpFollowup};
use super::world::{BodyHandle, RigidBodyWorld};
use crate::consts::*;
use crate::cue::{Cue, CueRequest, Side};
use crate::tuning::{MissionLaunch, Tuning};

/// Degrees per ball sprite rotation frame
const ROTATION_FRAME_DEG: f32 = 22.5;

/// How a warp moves the ball
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WarpMode {
    /// Move now, sleep briefly, wake
    Instant,
    /// Fade out, move, fade in, then run the followup
    Choreographed(WarpFollowup),
}

/// Ball-side bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BallController {
    pub body: BodyHandle,
    /// Set once the ball drains; cleared on reset
    pub lost: bool,
    /// When the current ball was launched
    pub start_time: f64,
    /// Plunger charge start, while held
    pub plunge_start: Option<f64>,
    pub plunge_timer: Option<TimerId>,
    /// Upward force applied every step while a spinner boost lasts
    pub boost: f32,
    pub boost_timer: Option<TimerId>,
    pub tilts_left: u8,
    /// Tilted: flippers and plunger are dead until the next ball
    pub blocked: bool,
}

impl BallController {
    pub fn new(body: BodyHandle, tuning: &Tuning) -> Self {
        Self {
            body,
            lost: false,
            start_time: 0.0,
            plunge_start: None,
            plunge_timer: None,
            boost: 0.0,
            boost_timer: None,
            tilts_left: tuning.tilts_per_ball,
            blocked: false,
        }
    }
}

/// Clamp each axis to `±max` independently
pub fn clamp_velocity(velocity: Vec2, max: f32) -> Vec2 {
    Vec2::new(velocity.x.clamp(-max, max), velocity.y.clamp(-max, max))
}

/// Plunger force for a charge held `elapsed_ms`
pub fn plunge_force(elapsed_ms: f64, tuning: &Tuning) -> f32 {
    let charge = elapsed_ms.clamp(0.0, tuning.plunge_max_ms);
    (charge / (tuning.plunge_max_ms * tuning.plunge_force_divisor as f64)) as f32
}

/// Ball is resting in the launch lane, where the plunger can reach it
pub fn in_launch_lane(position: Vec2) -> bool {
    position.x > LAUNCH_LANE_MIN.x && position.y > LAUNCH_LANE_MIN.y
}

/// Ball sprite frame for a body angle in radians
pub fn rotation_frame(angle_rad: f32) -> u8 {
    let deg = angle_rad.to_degrees().rem_euclid(360.0);
    ((deg / ROTATION_FRAME_DEG).floor() as u8).min(15)
}

impl<W: RigidBodyWorld> Table<W> {
    /// Cap the ball speed and push any active boost, before the world steps
    pub(crate) fn check_ball_speed(&mut self) {
        let body = self.ball.body;
        let Some(velocity) = self.world.velocity(body) else {
            return;
        };
        let clamped = clamp_velocity(velocity, self.tuning.max_speed);
        if clamped != velocity {
            self.world.set_velocity(body, clamped);
        }
        if self.ball.boost > 0.0 {
            self.world.apply_force(body, Vec2::new(0.0, -self.ball.boost));
        }
    }

    pub fn ball_position(&self) -> Vec2 {
        self.world.position(self.ball.body).unwrap_or(BALL_START)
    }

    pub fn ball_velocity(&self) -> Vec2 {
        self.world.velocity(self.ball.body).unwrap_or(Vec2::ZERO)
    }

    /// Plunger held
    pub fn launch_charge_start(&mut self) {
        if self.ball.blocked || self.ball.plunge_start.is_some() {
            return;
        }
        self.ball.plunge_start = Some(self.now);
        self.cues.emit(CueRequest::new(Cue::Click).volume(0.5));
        self.cues.emit(Cue::PlungerPull);
        let delay = self.tuning.plunge_max_ms + self.tuning.plunge_safety_ms;
        self.ball.plunge_timer = Some(self.scheduler.schedule(self.now, delay, Deferred::PlungeTimeout));
    }

    /// Plunger released. Returns the force applied to the ball, if any.
    pub fn launch_release(&mut self) -> Option<f32> {
        let start = self.ball.plunge_start.take()?;
        if let Some(timer) = self.ball.plunge_timer.take() {
            self.scheduler.cancel(timer);
        }

        let force = plunge_force(self.now - start, &self.tuning);
        if force > self.tuning.plunge_shake_threshold {
            self.cues.emit(Cue::CameraShake);
        }
        self.cues.emit(CueRequest::new(Cue::Plunger).volume(force * 5.0));
        self.cues.emit(Cue::PlungerRelease);

        if self.ball.blocked || !in_launch_lane(self.ball_position()) {
            return None;
        }
        let body = self.ball.body;
        self.world.set_sleeping(body, false);
        self.world.apply_force(body, Vec2::new(0.0, -force));
        self.ball.start_time = self.now;
        log::debug!("Plunge {:.4}", force);
        Some(force)
    }

    /// Move the ball somewhere, dead still
    pub(crate) fn place_ball(&mut self, to: Vec2) {
        let body = self.ball.body;
        self.world.set_position(body, to);
        self.world.set_velocity(body, Vec2::ZERO);
        self.world.set_angular_velocity(body, 0.0);
    }

    pub fn warp_ball(&mut self, to: Vec2, mode: WarpMode) {
        let body = self.ball.body;
        match mode {
            WarpMode::Instant => {
                self.place_ball(to);
                self.world.set_sleeping(body, true);
                self.scheduler
                    .schedule(self.now, self.tuning.wake_delay_ms, Deferred::WakeBall);
            }
            WarpMode::Choreographed(followup) => {
                let fade = self.tuning.warp_fade_ms;
                self.world.set_gravity_scale(body, 0.0);
                self.world.set_velocity(body, Vec2::ZERO);
                self.cues.emit(CueRequest::new(Cue::FadeOut).duration(fade));
                self.scheduler
                    .schedule(self.now, fade, Deferred::WarpReposition { to });
                self.scheduler
                    .schedule(self.now, fade + self.tuning.warp_gap_ms, Deferred::WarpFadeIn);
                self.scheduler.schedule(
                    self.now,
                    self.tuning.choreographed_warp_ms(),
                    Deferred::WarpComplete(followup),
                );
            }
        }
    }

    pub(crate) fn finish_warp(&mut self, followup: WarpFollowup) {
        self.world.set_gravity_scale(self.ball.body, 1.0);
        match followup {
            WarpFollowup::Nothing => {}
            WarpFollowup::ClearBallLost => self.ball.lost = false,
            WarpFollowup::Launch(launch) => self.fire_ball(launch),
        }
    }

    /// Hold the ball still, then fire it with `launch`
    pub fn hold_ball(&mut self, launch: MissionLaunch) {
        let body = self.ball.body;
        self.world.set_velocity(body, Vec2::ZERO);
        self.world.set_sleeping(body, true);
        self.scheduler
            .schedule(self.now, launch.hold_ms, Deferred::ReleaseHeld { launch });
    }

    /// End of a hold. Launches with an exit point cross the table first and
    /// fire once the warp completes; the ball stays asleep until then.
    pub(crate) fn release_held(&mut self, launch: MissionLaunch) {
        match launch.exit {
            Some(exit) => self.warp_ball(exit, WarpMode::Choreographed(WarpFollowup::Launch(launch))),
            None => self.fire_ball(launch),
        }
    }

    /// Fire the ball at an angle, optionally from an exit point
    pub fn fire_ball(&mut self, launch: MissionLaunch) {
        let body = self.ball.body;
        if let Some(exit) = launch.exit {
            self.place_ball(exit);
        }
        self.world.set_sleeping(body, false);
        self.cues.emit(CueRequest::new(Cue::KickBall).volume(0.5));
        self.world
            .apply_force_from_angle(body, launch.force, launch.angle_deg);
    }

    /// Nudge the table
    pub fn tilt(&mut self, side: Side) {
        if self.ball.blocked || self.state.phase != GamePhase::Playing {
            return;
        }
        if self.ball.tilts_left > 0 {
            self.ball.tilts_left -= 1;
            let angle = match side {
                Side::Left => 180.0,
                Side::Right => 0.0,
            };
            self.world
                .apply_force_from_angle(self.ball.body, self.tuning.tilt_force, angle);
            self.cues.emit(Cue::CameraShake);
            return;
        }
        self.ball.blocked = true;
        for flipper in &mut self.flippers {
            flipper.release();
        }
        self.state.show_message("Tilt!", self.now);
        self.cues.emit(CueRequest::new(Cue::Tilt).volume(0.5));
        log::info!("Tilted");
    }

    /// Drain detection, run every frame
    pub(crate) fn check_ball_lost(&mut self) {
        if self.ball.lost {
            return;
        }
        let position = self.ball_position();
        if position.y <= BALL_LOST_Y {
            return;
        }
        if position.x < REFUEL_DRAIN_X {
            // Drained off the refuel table: back to the main board
            self.ball.lost = true;
            self.state
                .earn_score(ScoreEvent::RefuelLoop, &self.tuning.scores);
            self.warp_ball(
                REFUEL_RETURN,
                WarpMode::Choreographed(WarpFollowup::ClearBallLost),
            );
            return;
        }
        self.on_ball_lost();
    }

    /// The ball drained. Saved if it was launched recently.
    pub fn on_ball_lost(&mut self) {
        if self.ball.lost || self.state.is_game_over() {
            return;
        }
        self.ball.lost = true;
        self.scheduler
            .schedule(self.now, self.tuning.ball_reset_delay_ms, Deferred::ResetBall);

        if self.now - self.ball.start_time < self.tuning.ball_save_ms {
            self.state.show_message("Ball saved!", self.now);
            self.cues.emit(Cue::BallSaved);
            log::info!("Ball saved");
        } else {
            self.state.show_message("Ball lost", self.now);
            self.cues.emit(Cue::BallLost);
            self.state.lose_ball();
            log::info!("Ball lost, {} left", self.state.balls);
        }
    }

    /// Put a fresh ball in the launch lane, or end the game
    pub fn reset_ball(&mut self) {
        if self.state.is_game_over() {
            return;
        }
        if self.state.balls == 0 {
            self.game_over();
            return;
        }

        self.ball.lost = false;
        self.ball.blocked = false;
        self.ball.tilts_left = self.tuning.tilts_per_ball;
        self.ball.boost = 0.0;
        if let Some(timer) = self.ball.boost_timer.take() {
            self.scheduler.cancel(timer);
        }
        self.ball.start_time = self.now;
        self.world.set_gravity_scale(self.ball.body, 1.0);
        self.warp_ball(BALL_START, WarpMode::Instant);
        self.gates.reset_all(&mut self.world);
    }

    fn game_over(&mut self) {
        self.state.phase = GamePhase::GameOver;
        self.scheduler.clear();
        self.ball.plunge_start = None;
        self.ball.plunge_timer = None;
        self.ball.boost_timer = None;
        self.cues.emit(Cue::FadeOut);
        self.cues.emit(Cue::StopMusic);
        self.cues.emit(Cue::ShowMenu);
        log::info!("Game over, final score {}", self.state.score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::arcade::ArcadeWorld;
    use crate::sim::table::TickInput;
    use proptest::prelude::*;

    fn table() -> Table<ArcadeWorld> {
        Table::new(ArcadeWorld::default(), Tuning::default()).unwrap()
    }

    #[test]
    fn test_clamp_is_per_axis() {
        let v = clamp_velocity(Vec2::new(20.0, -3.0), 11.0);
        assert_eq!(v, Vec2::new(11.0, -3.0));
        let v = clamp_velocity(Vec2::new(-12.0, 15.0), 11.0);
        assert_eq!(v, Vec2::new(-11.0, 11.0));
    }

    #[test]
    fn test_plunge_force_caps_at_full_charge() {
        let tuning = Tuning::default();
        let full = 1.0 / tuning.plunge_force_divisor;
        assert!((plunge_force(tuning.plunge_max_ms, &tuning) - full).abs() < 1e-6);
        assert!((plunge_force(tuning.plunge_max_ms * 3.0, &tuning) - full).abs() < 1e-6);
        assert!((plunge_force(tuning.plunge_max_ms / 2.0, &tuning) - full / 2.0).abs() < 1e-6);
        assert_eq!(plunge_force(-5.0, &tuning), 0.0);
    }

    #[test]
    fn test_rotation_frames() {
        assert_eq!(rotation_frame(0.0), 0);
        assert_eq!(rotation_frame(23.0_f32.to_radians()), 1);
        assert_eq!(rotation_frame(-1.0_f32.to_radians()), 15);
        assert_eq!(rotation_frame(720.0_f32.to_radians() + 0.1), 0);
    }

    #[test]
    fn test_launch_lane() {
        assert!(in_launch_lane(Vec2::new(172.0, 268.0)));
        assert!(!in_launch_lane(BALL_START));
        assert!(!in_launch_lane(Vec2::new(80.0, 270.0)));
        assert!(!in_launch_lane(Vec2::new(170.0, 200.0)));
    }

    #[test]
    fn test_plunge_from_lane_applies_force() {
        let mut t = table();
        t.place_ball(Vec2::new(172.0, 268.0));
        t.now = 1000.0;
        t.launch_charge_start();
        assert_eq!(t.pending_events(), 2); // wake + safety net
        t.now = 2000.0;
        let force = t.launch_release().unwrap();
        assert!((force - 1.0 / 16.0).abs() < 1e-6);
        assert_eq!(t.pending_events(), 1); // safety net cancelled
        assert_eq!(t.world().pending_force(t.ball.body), Some(Vec2::new(0.0, -force)));
        assert_eq!(t.ball.start_time, 2000.0);
        assert_eq!(t.cues().count(Cue::PlungerRelease), 1);
    }

    #[test]
    fn test_plunge_outside_lane_only_animates() {
        let mut t = table();
        t.place_ball(Vec2::new(80.0, 150.0));
        t.launch_charge_start();
        t.now = 2500.0;
        assert_eq!(t.launch_release(), None);
        assert_eq!(t.world().pending_force(t.ball.body), Some(Vec2::ZERO));
        assert_eq!(t.cues().count(Cue::Plunger), 1);
    }

    #[test]
    fn test_plunge_safety_net_releases() {
        let mut t = table();
        t.tick(&TickInput {
            launch: true,
            ..Default::default()
        });
        let steps = ((t.tuning.plunge_max_ms + t.tuning.plunge_safety_ms) / t.tuning.step_ms) as usize + 2;
        for _ in 0..steps {
            t.tick(&TickInput {
                launch: true,
                ..Default::default()
            });
        }
        assert!(t.ball.plunge_start.is_none());
        assert_eq!(t.cues().count(Cue::PlungerRelease), 1);
    }

    #[test]
    fn test_loss_inside_save_window_keeps_ball() {
        let mut t = table();
        t.ball.start_time = 0.0;
        t.now = 8000.0;
        t.on_ball_lost();
        assert_eq!(t.state().balls, 3);
        assert_eq!(t.cues().count(Cue::BallSaved), 1);
        assert_eq!(t.state().current_message(8000.0).map(|m| m.text.as_str()), Some("Ball saved!"));
    }

    #[test]
    fn test_loss_after_save_window_costs_one_ball() {
        let mut t = table();
        t.ball.start_time = 0.0;
        t.now = 15000.0;
        t.on_ball_lost();
        t.on_ball_lost();
        assert_eq!(t.state().balls, 2);
        assert_eq!(t.cues().count(Cue::BallLost), 1);
    }

    #[test]
    fn test_reset_with_no_balls_ends_game_once() {
        let mut t = table();
        let parked = Vec2::new(80.0, 100.0);
        t.place_ball(parked);
        t.state.balls = 0;
        t.reset_ball();
        t.reset_ball();
        assert_eq!(t.phase(), GamePhase::GameOver);
        assert_eq!(t.cues().count(Cue::ShowMenu), 1);
        assert_eq!(t.cues().count(Cue::StopMusic), 1);
        assert_eq!(t.world().position(t.ball.body), Some(parked));
        assert_eq!(t.pending_events(), 0);
    }

    #[test]
    fn test_reset_returns_ball_to_lane() {
        let mut t = table();
        t.place_ball(Vec2::new(80.0, 330.0));
        t.ball.lost = true;
        t.gates.open(&mut t.world, crate::sim::label::DoorKind::Secret);
        t.reset_ball();
        assert_eq!(t.ball_position(), BALL_START);
        assert!(!t.ball.lost);
        assert!(!t.gates().is_open(crate::sim::label::DoorKind::Secret));
        assert_eq!(t.world().is_sleeping(t.ball.body), Some(true));
    }

    #[test]
    fn test_tilt_warns_then_blocks() {
        let mut t = table();
        for _ in 0..3 {
            t.tilt(Side::Left);
        }
        assert!(!t.ball.blocked);
        assert_eq!(t.cues().count(Cue::CameraShake), 3);
        t.tilt(Side::Right);
        assert!(t.ball.blocked);
        assert_eq!(t.cues().count(Cue::Tilt), 1);

        t.flip_left_down();
        assert_eq!(t.cues().count(Cue::Flipper), 0);
        t.reset_ball();
        assert!(!t.ball.blocked);
    }

    #[test]
    fn test_choreographed_warp_sequence() {
        let mut t = table();
        let to = Vec2::new(-100.0, 140.0);
        t.warp_ball(to, WarpMode::Choreographed(WarpFollowup::Nothing));
        assert_eq!(t.world().gravity_scale(t.ball.body), Some(0.0));
        assert_eq!(t.cues().count(Cue::FadeOut), 1);

        let total = t.tuning.choreographed_warp_ms();
        let steps = (total / t.tuning.step_ms) as usize + 2;
        for _ in 0..steps {
            t.tick(&TickInput::default());
        }
        assert_eq!(t.cues().count(Cue::FadeIn), 1);
        assert_eq!(t.cues().count(Cue::CameraRecenter), 1);
        assert_eq!(t.world().gravity_scale(t.ball.body), Some(1.0));
    }

    fn held(launch: bool) -> TickInput {
        TickInput {
            launch,
            ..Default::default()
        }
    }

    #[test]
    fn test_full_plunge_reaches_playfield() {
        let mut t = table();
        for _ in 0..60 {
            t.tick(&TickInput::default());
        }
        assert!(in_launch_lane(t.ball_position()));

        let charge = (t.tuning.plunge_max_ms / t.tuning.step_ms) as usize + 5;
        for _ in 0..charge {
            t.tick(&held(true));
        }
        t.tick(&held(false));
        assert_eq!(t.cues().count(Cue::PlungerRelease), 1);

        let mut min_x = f32::MAX;
        let mut min_y = f32::MAX;
        for _ in 0..60 {
            t.tick(&TickInput::default());
            let pos = t.ball_position();
            min_x = min_x.min(pos.x);
            min_y = min_y.min(pos.y);
        }
        assert!(min_y < 40.0, "ball topped out at y={}", min_y);
        assert!(min_x < LAUNCH_LANE_MIN.x - BALL_RADIUS, "ball stayed in the lane, min x={}", min_x);
    }

    #[test]
    fn test_drain_through_tick_costs_a_ball_and_resets() {
        let mut t = table();
        t.now = 20000.0;
        t.place_ball(Vec2::new(80.0, BALL_LOST_Y + 10.0));
        t.tick(&TickInput::default());
        assert!(t.ball.lost);
        assert_eq!(t.state().balls, 2);
        assert_eq!(t.cues().count(Cue::BallLost), 1);

        let steps = (t.tuning.ball_reset_delay_ms / t.tuning.step_ms) as usize + 2;
        for _ in 0..steps {
            t.tick(&TickInput::default());
        }
        assert!(!t.ball.lost);
        assert_eq!(t.state().balls, 2);
        assert_eq!(t.cues().count(Cue::BallLost), 1);
        assert!(t.ball_position().distance(BALL_START) < 5.0);
    }

    #[test]
    fn test_refuel_drain_warps_back_without_losing_a_ball() {
        let mut t = table();
        t.place_ball(Vec2::new(-100.0, BALL_LOST_Y + 10.0));
        t.tick(&TickInput::default());
        assert!(t.ball.lost);
        assert_eq!(t.state().balls, 3);
        assert_eq!(t.state().score, t.tuning.scores.refuel_loop);
        assert_eq!(t.world().gravity_scale(t.ball.body), Some(0.0));

        let steps = (t.tuning.choreographed_warp_ms() / t.tuning.step_ms) as usize + 2;
        for _ in 0..steps {
            t.tick(&TickInput::default());
        }
        assert!(!t.ball.lost);
        assert_eq!(t.state().balls, 3);
        assert_eq!(t.cues().count(Cue::BallLost), 0);
        assert_eq!(t.world().gravity_scale(t.ball.body), Some(1.0));
        assert!(t.ball_position().distance(REFUEL_RETURN) < 2.0);
    }

    #[test]
    fn test_hold_then_fire_in_place() {
        let mut t = table();
        let launch = t.tuning.hyperspace_launch;
        assert!(launch.exit.is_none());
        t.hold_ball(launch);
        assert_eq!(t.world().is_sleeping(t.ball.body), Some(true));
        t.now += launch.hold_ms;
        t.run_deferred(Deferred::ReleaseHeld { launch });
        assert_eq!(t.world().is_sleeping(t.ball.body), Some(false));
        assert_eq!(t.ball_position(), BALL_START);
        assert_eq!(t.cues().count(Cue::KickBall), 1);
        assert_eq!(t.cues().count(Cue::FadeOut), 0);
    }

    #[test]
    fn test_held_launch_with_exit_crosses_the_table() {
        let mut t = table();
        let launch = t.tuning.wormhole_launch;
        let exit = launch.exit.unwrap();
        t.hold_ball(launch);
        t.now += launch.hold_ms;
        t.run_deferred(Deferred::ReleaseHeld { launch });
        assert_eq!(t.world().is_sleeping(t.ball.body), Some(true));
        assert_eq!(t.world().gravity_scale(t.ball.body), Some(0.0));
        assert_eq!(t.cues().count(Cue::FadeOut), 1);
        assert_eq!(t.cues().count(Cue::KickBall), 0);

        let mut fired_at = None;
        let steps = (t.tuning.choreographed_warp_ms() / t.tuning.step_ms) as usize + 2;
        for _ in 0..steps {
            t.tick(&TickInput::default());
            if fired_at.is_none() && t.cues().count(Cue::KickBall) == 1 {
                fired_at = Some(t.ball_position());
            }
        }
        let fired_at = fired_at.expect("launch never fired");
        assert!(fired_at.distance(exit) < 5.0);
        assert_eq!(t.cues().count(Cue::CameraRecenter), 1);
        assert_eq!(t.world().is_sleeping(t.ball.body), Some(false));
        assert_eq!(t.world().gravity_scale(t.ball.body), Some(1.0));
    }

    proptest! {
        #[test]
        fn test_clamp_idempotent(x in -100.0f32..100.0, y in -100.0f32..100.0, max in 0.1f32..50.0) {
            let once = clamp_velocity(Vec2::new(x, y), max);
            prop_assert_eq!(clamp_velocity(once, max), once);
            prop_assert!(once.x.abs() <= max && once.y.abs() <= max);
        }
    }
}
