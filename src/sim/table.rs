//! The table controller
//!
//! [`Table`] owns the world and every piece of game state, and advances them
//! one fixed step at a time:
//!
//! 1. input edges (flippers, plunger, tilt, pause)
//! 2. clock, then deferred events that fell due
//! 3. flipper levers and the pre-step ball speed check
//! 4. world step
//! 5. contact routing
//! 6. per-frame upkeep: spinners, lights, travel status, drain check

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::autopilot::{Autopilot, PilotView};
use super::ball::BallController;
use super::flipper::Flipper;
use super::gate::GateBank;
use super::label::{DoorKind, LightGroup};
use super::layout::{TableGeometry, TableLayout};
use super::lights::LightMatrix;
use super::router::CollisionRouter;
use super::scheduler::Scheduler;
use super::spinner::Spinner;
use super::state::{GamePhase, MissionState, ScoreEvent};
use super::world::RigidBodyWorld;
use crate::cue::{Cue, CueQueue, CueRequest, Side};
use crate::error::TableResult;
use crate::tuning::{MissionLaunch, Tuning};

/// Work scheduled for a later step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Deferred {
    /// Slingshot kick, once the flash has registered
    SlingForce { angle_deg: f32 },
    /// Out-lane kicker fires
    Kick,
    CloseDoor(DoorKind),
    /// End of a mission hold: launch the ball, crossing the table first if needed
    ReleaseHeld { launch: MissionLaunch },
    /// Clear a completed light group and pay its bonus
    ResetLightGroup(LightGroup),
    ResetBall,
    /// Plunger safety net in case the release never arrives
    PlungeTimeout,
    WakeBall,
    WarpReposition { to: Vec2 },
    WarpFadeIn,
    WarpComplete(WarpFollowup),
    BoostEnd,
}

/// What happens when a choreographed warp finishes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WarpFollowup {
    Nothing,
    /// Release the ball-lost latch held during a refuel drain
    ClearBallLost,
    Launch(MissionLaunch),
}

/// Player actions for one step
///
/// Buttons are levels; the table detects presses and releases itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// Left flipper button held
    pub flip_left: bool,
    /// Right flipper button held
    pub flip_right: bool,
    /// Plunger held; releasing fires it
    pub launch: bool,
    /// Nudge the table this step
    pub tilt: Option<Side>,
    /// Pause toggle
    pub pause: bool,
    /// Autopilot plays instead of the buttons above
    pub autoplay: bool,
}

/// Out-of-lane button hit counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonCounters {
    pub button: u8,
    pub diagonal: u8,
}

/// A whole pinball table on top of a rigid-body world
pub struct Table<W: RigidBodyWorld> {
    pub(crate) world: W,
    pub(crate) tuning: Tuning,
    pub(crate) layout: TableLayout,
    pub(crate) state: MissionState,
    pub(crate) lights: LightMatrix,
    pub(crate) flippers: Vec<Flipper>,
    pub(crate) spinners: Vec<Spinner>,
    pub(crate) gates: GateBank,
    pub(crate) ball: BallController,
    pub(crate) router: CollisionRouter,
    pub(crate) scheduler: Scheduler<Deferred>,
    pub(crate) cues: CueQueue,
    pub(crate) buttons: ButtonCounters,
    pub(crate) autopilot: Autopilot,
    /// Simulation clock in ms
    pub(crate) now: f64,
    /// Button levels from the previous step
    held: TickInput,
}

impl<W: RigidBodyWorld> Table<W> {
    /// Build the classic table
    pub fn new(world: W, tuning: Tuning) -> TableResult<Self> {
        Self::with_geometry(world, tuning, &TableGeometry::classic())
    }

    /// Build a table from custom geometry
    pub fn with_geometry(mut world: W, tuning: Tuning, geometry: &TableGeometry) -> TableResult<Self> {
        tuning.validate()?;
        let layout = TableLayout::build(&mut world, geometry, &tuning)?;

        let flippers = layout
            .flippers
            .iter()
            .map(|rig| Flipper::new(rig.side, rig.pivot, rig.bar, rig.lever, tuning.flipper_duration_ms))
            .collect();
        let spinners = vec![Spinner::default(); layout.spinners.len()];
        let gates = GateBank::new(&mut world, &layout.doors);
        let ball = BallController::new(layout.ball, &tuning);
        let router = CollisionRouter::new(tuning.debounce.clone());
        let state = MissionState::new(&tuning);

        let mut table = Self {
            world,
            layout,
            state,
            lights: LightMatrix::new(),
            flippers,
            spinners,
            gates,
            ball,
            router,
            scheduler: Scheduler::new(),
            cues: CueQueue::new(),
            buttons: ButtonCounters::default(),
            autopilot: Autopilot::new(0),
            now: 0.0,
            held: TickInput::default(),
            tuning,
        };
        table.reset_ball();
        log::info!(
            "Table ready ({} preset, {} balls)",
            table.tuning.preset.as_str(),
            table.state.balls
        );
        Ok(table)
    }

    /// Reseed the autopilot
    pub fn with_autopilot_seed(mut self, seed: u64) -> Self {
        self.autopilot = Autopilot::new(seed);
        self
    }

    // === Read access ===

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn state(&self) -> &MissionState {
        &self.state
    }

    pub fn lights(&self) -> &LightMatrix {
        &self.lights
    }

    pub fn gates(&self) -> &GateBank {
        &self.gates
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn flippers(&self) -> &[Flipper] {
        &self.flippers
    }

    pub fn spinners(&self) -> &[Spinner] {
        &self.spinners
    }

    pub fn buttons(&self) -> ButtonCounters {
        self.buttons
    }

    pub fn ball(&self) -> &BallController {
        &self.ball
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    /// Cues emitted since the last drain
    pub fn cues(&self) -> &CueQueue {
        &self.cues
    }

    /// Hand pending cues to the presentation layer
    pub fn drain_cues(&mut self) -> Vec<CueRequest> {
        self.cues.drain()
    }

    /// Deferred events still waiting
    pub fn pending_events(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    /// What the autopilot gets to see
    pub fn pilot_view(&self) -> PilotView {
        PilotView {
            now: self.now,
            ball: self.ball_position(),
            velocity: self.ball_velocity(),
            pivots: self.flippers.iter().map(|f| (f.side, f.pivot)).collect(),
            charging_since: self.ball.plunge_start,
            full_charge_ms: self.tuning.plunge_max_ms,
        }
    }

    // === Input actions ===

    pub fn flip_left_down(&mut self) {
        self.flip_down(Side::Left);
    }

    pub fn flip_left_up(&mut self) {
        self.flip_up(Side::Left);
    }

    pub fn flip_right_down(&mut self) {
        self.flip_down(Side::Right);
    }

    pub fn flip_right_up(&mut self) {
        self.flip_up(Side::Right);
    }

    /// Every flipper on `side` (main and refuel tables move together)
    fn flip_down(&mut self, side: Side) {
        if self.ball.blocked || self.state.phase != GamePhase::Playing {
            return;
        }
        let mut started = false;
        for flipper in self.flippers.iter_mut().filter(|f| f.side == side) {
            started |= flipper.press();
        }
        if started {
            // Once per press, however many flippers share the side
            self.cues.emit(CueRequest::new(Cue::Flipper).volume(0.1).rate(0.5));
            self.lights.flip_lights(match side {
                Side::Left => -1,
                Side::Right => 1,
            });
            self.world.set_sleeping(self.ball.body, false);
        }
    }

    fn flip_up(&mut self, side: Side) {
        for flipper in self.flippers.iter_mut().filter(|f| f.side == side) {
            flipper.release();
        }
    }

    pub fn toggle_pause(&mut self) {
        self.state.phase = match self.state.phase {
            GamePhase::Playing => GamePhase::Paused,
            GamePhase::Paused => GamePhase::Playing,
            GamePhase::GameOver => GamePhase::GameOver,
        };
        log::info!("Phase: {:?}", self.state.phase);
    }

    fn apply_input(&mut self, input: &TickInput) {
        if input.pause && !self.held.pause {
            self.toggle_pause();
        }
        if self.state.phase != GamePhase::Playing {
            self.held = *input;
            return;
        }

        let held = self.held;
        match (held.flip_left, input.flip_left) {
            (false, true) => self.flip_left_down(),
            (true, false) => self.flip_left_up(),
            _ => {}
        }
        match (held.flip_right, input.flip_right) {
            (false, true) => self.flip_right_down(),
            (true, false) => self.flip_right_up(),
            _ => {}
        }
        match (held.launch, input.launch) {
            (false, true) => self.launch_charge_start(),
            (true, false) => {
                self.launch_release();
            }
            _ => {}
        }
        if let Some(side) = input.tilt {
            self.tilt(side);
        }
        self.held = *input;
    }

    // === Simulation ===

    /// Advance one fixed step
    pub fn tick(&mut self, input: &TickInput) {
        let input = if input.autoplay && self.state.phase == GamePhase::Playing {
            let view = self.pilot_view();
            let mut driven = self.autopilot.drive(&view);
            driven.pause = input.pause;
            driven
        } else {
            *input
        };
        self.apply_input(&input);
        if self.state.phase != GamePhase::Playing {
            return;
        }

        let dt = self.tuning.step_ms;
        self.now += dt;
        self.run_due_events();
        if self.state.is_game_over() {
            return;
        }

        for flipper in &mut self.flippers {
            flipper.update(&mut self.world, dt);
        }
        self.check_ball_speed();
        self.world.step(dt);

        for contact in self.world.drain_contacts() {
            self.handle_contact(contact);
        }
        self.update_frame();
    }

    /// Run every deferred event due by now, in due order
    fn run_due_events(&mut self) {
        while let Some((_, event)) = self.scheduler.pop_due(self.now) {
            log::debug!("deferred {:?} at {:.0}", event, self.now);
            self.run_deferred(event);
            if self.state.is_game_over() {
                break;
            }
        }
    }

    pub(crate) fn run_deferred(&mut self, event: Deferred) {
        match event {
            Deferred::SlingForce { angle_deg } => {
                self.world
                    .apply_force_from_angle(self.ball.body, self.tuning.sling_force, angle_deg);
            }
            Deferred::Kick => self.fire_kicker(),
            Deferred::CloseDoor(door) => {
                self.gates.close(&mut self.world, door);
            }
            Deferred::ReleaseHeld { launch } => self.release_held(launch),
            Deferred::ResetLightGroup(group) => {
                self.lights.reset_group(group);
                self.state.earn_score(ScoreEvent::LightGroupComplete, &self.tuning.scores);
            }
            Deferred::ResetBall => self.reset_ball(),
            Deferred::PlungeTimeout => {
                log::debug!("Plunger safety net fired");
                self.ball.plunge_timer = None;
                self.launch_release();
            }
            Deferred::WakeBall => self.world.set_sleeping(self.ball.body, false),
            Deferred::WarpReposition { to } => {
                self.place_ball(to);
                self.cues.emit(Cue::CameraRecenter);
            }
            Deferred::WarpFadeIn => {
                self.cues
                    .emit(CueRequest::new(Cue::FadeIn).duration(self.tuning.warp_fade_ms));
            }
            Deferred::WarpComplete(followup) => self.finish_warp(followup),
            Deferred::BoostEnd => {
                self.ball.boost = 0.0;
                self.ball.boost_timer = None;
            }
        }
    }

    /// Per-frame upkeep after contacts are routed
    fn update_frame(&mut self) {
        for i in 0..self.spinners.len() {
            let tick = self.spinners[i].update(&self.tuning);
            if tick.click {
                self.cues.emit(Cue::Click);
            }
            if tick.award {
                self.state.earn_score(ScoreEvent::Spinner, &self.tuning.scores);
            }
        }

        self.state
            .update_travel_status(&self.tuning.planet_scores, self.now, &mut self.cues);
        let progress = self.state.travel_progress(&self.tuning.planet_scores);
        let index = self.state.travel_index(&self.tuning.planet_scores);
        self.lights.update_travel_lights(progress, index);
        self.lights.update(self.now);

        self.check_ball_lost();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::arcade::ArcadeWorld;
    use crate::sim::flipper::FlipperState;

    fn table() -> Table<ArcadeWorld> {
        Table::new(ArcadeWorld::default(), Tuning::default()).unwrap()
    }

    #[test]
    fn test_new_table_places_ball() {
        let t = table();
        assert_eq!(t.world().position(t.ball.body), Some(BALL_START));
        assert_eq!(t.state().balls, 3);
        assert_eq!(t.phase(), GamePhase::Playing);
        assert_eq!(t.pending_events(), 1); // wake after the placement warp
    }

    #[test]
    fn test_flipper_press_is_edge_triggered() {
        let mut t = table();
        let hold = TickInput {
            flip_left: true,
            ..Default::default()
        };
        t.tick(&hold);
        t.tick(&hold);
        t.tick(&hold);
        assert_eq!(t.cues().count(Cue::Flipper), 1);
        assert!(t.flippers().iter().filter(|f| f.side == Side::Left).all(|f| f.state != FlipperState::Rest));
        assert!(t.flippers().iter().filter(|f| f.side == Side::Right).all(|f| f.state == FlipperState::Rest));

        for _ in 0..5 {
            t.tick(&TickInput::default());
        }
        assert!(t.flippers().iter().all(|f| f.state == FlipperState::Rest));
    }

    #[test]
    fn test_pause_freezes_clock() {
        let mut t = table();
        t.tick(&TickInput::default());
        let before = t.now();
        t.tick(&TickInput {
            pause: true,
            ..Default::default()
        });
        t.tick(&TickInput::default());
        assert_eq!(t.now(), before);
        assert_eq!(t.phase(), GamePhase::Paused);

        t.tick(&TickInput {
            pause: true,
            ..Default::default()
        });
        assert_eq!(t.phase(), GamePhase::Playing);
        assert!(t.now() > before);
    }

    #[test]
    fn test_missing_board_fails_construction() {
        let geometry = TableGeometry {
            board: vec![],
            ..TableGeometry::classic()
        };
        assert!(Table::with_geometry(ArcadeWorld::default(), Tuning::default(), &geometry).is_err());
    }

    #[test]
    fn test_invalid_tuning_fails_construction() {
        let tuning = Tuning {
            planet_scores: vec![],
            ..Tuning::default()
        };
        assert!(Table::new(ArcadeWorld::default(), tuning).is_err());
    }

    #[test]
    fn test_light_group_reset_pays_bonus() {
        let mut t = table();
        t.run_deferred(Deferred::ResetLightGroup(LightGroup::Post));
        assert_eq!(t.state().score, t.tuning().scores.light_group_complete);
    }
}
