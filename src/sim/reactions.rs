//! Reaction handlers
//!
//! One handler per entity kind, called by the router once a contact is
//! classified. Handlers mutate state, schedule deferred work and emit cues;
//! they never fail. A debounced handler checks its window before doing
//! anything, so a suppressed contact leaves no trace.

use glam::Vec2;

use super::ball::WarpMode;
use super::debounce::ReactionKind;
use super::label::{DoorKind, LightId};
use super::lights::ToggleOutcome;
use super::state::{AsteroidOutcome, ScoreEvent};
use super::table::{Deferred, Table, WarpFollowup};
use super::world::{BodyHandle, CollisionFilter, RigidBodyWorld};
use crate::consts::*;
use crate::cue::{Cue, CueRequest, Side};

/// Ding volume divisor
const DING_VOLUME_SCALE: f32 = 160.0;
const DING_MAX_VOLUME: f32 = 3.0;

impl<W: RigidBodyWorld> Table<W> {
    fn ball_speed(&self) -> f32 {
        self.ball_velocity().length()
    }

    fn fire(&mut self, kind: ReactionKind) -> bool {
        self.router.debounce.try_fire(kind, self.now)
    }

    fn score(&mut self, event: ScoreEvent) {
        self.state.earn_score(event, &self.tuning.scores);
    }

    /// Board, post, flipper or door clipped
    pub(crate) fn on_ding(&mut self) {
        let speed = self.ball_speed();
        if speed <= self.tuning.ding_min_speed || !self.fire(ReactionKind::Ding) {
            return;
        }
        self.cues.emit(
            CueRequest::new(Cue::Ding)
                .volume((speed / DING_VOLUME_SCALE).min(DING_MAX_VOLUME))
                .rate(2.0),
        );
    }

    pub(crate) fn on_bumper(&mut self, index: u8) {
        if !self.fire(ReactionKind::Bumper) {
            return;
        }
        self.cues
            .emit(CueRequest::new(Cue::BumperFlash(index)).duration(self.tuning.flash_ms));
        self.score(ScoreEvent::Bumper);
        if self.ball_speed() > self.tuning.bumper_sound_min_speed {
            self.cues.emit(CueRequest::new(Cue::BumperHit).volume(0.2));
        }
    }

    pub(crate) fn on_sling(&mut self, index: u8, sling: BodyHandle) {
        let x = self.world.position(sling).map_or(self.ball_position().x, |p| p.x);
        let angle_deg = if x < TABLE_CENTER_X {
            self.tuning.sling_left_deg
        } else {
            self.tuning.sling_right_deg
        };
        self.cues
            .emit(CueRequest::new(Cue::SlingFlash(index)).duration(self.tuning.flash_ms));
        self.cues.emit(CueRequest::new(Cue::Sling).volume(0.2));
        self.scheduler
            .schedule(self.now, self.tuning.sling_delay_ms, Deferred::SlingForce { angle_deg });
        self.score(ScoreEvent::Sling);
    }

    /// One-way: only a ball on its way down arms the kicker
    pub(crate) fn on_kick(&mut self) {
        if self.ball_velocity().y < 0.0 || !self.fire(ReactionKind::Kick) {
            return;
        }
        self.scheduler
            .schedule(self.now, self.tuning.kick_delay_ms, Deferred::Kick);
    }

    /// Kicker fires: pop the ball back up through its out-lane door
    pub(crate) fn fire_kicker(&mut self) {
        let side = if self.ball_position().x < TABLE_CENTER_X {
            Side::Left
        } else {
            Side::Right
        };
        let door = match side {
            Side::Left => DoorKind::LeftOutlane,
            Side::Right => DoorKind::RightOutlane,
        };
        self.world
            .apply_force(self.ball.body, Vec2::new(0.0, -self.tuning.kick_force));
        self.cues
            .emit(CueRequest::new(Cue::Kicker(side)).duration(self.tuning.kicker_pulse_ms));
        if self.gates.open(&mut self.world, door) {
            self.scheduler
                .schedule(self.now, self.tuning.kicker_pulse_ms, Deferred::CloseDoor(door));
        }
    }

    pub(crate) fn on_light(&mut self, id: LightId) {
        let outcome = self.lights.toggle(id);
        self.score(ScoreEvent::LightToggle);
        if outcome == ToggleOutcome::GroupComplete {
            self.cues.emit(Cue::LightGroupComplete);
            self.scheduler.schedule(
                self.now,
                self.tuning.light_reset_delay_ms,
                Deferred::ResetLightGroup(id.group),
            );
        }
    }

    /// Toggle a light by its `group:index` label; malformed labels are logged and ignored
    pub fn toggle_light(&mut self, label: &str) {
        match LightId::parse(label) {
            Ok(id) => self.on_light(id),
            Err(e) => log::warn!("Ignoring light toggle: {}", e),
        }
    }

    /// Armed: open the asteroid field and fling the ball back out
    pub(crate) fn on_hyperspace(&mut self) {
        if !self.fire(ReactionKind::Hyperspace) {
            return;
        }
        if !self.state.hyperspace_armed {
            self.score(ScoreEvent::HyperspaceConsolation);
            self.cues.emit(Cue::Consolation);
            return;
        }

        self.state.hyperspace_armed = false;
        let count = self.layout.asteroids.len() as u8;
        self.state.open_mission(count, self.tuning.asteroid_health);
        for (_, body) in &self.layout.asteroids {
            self.world.set_filter(*body, CollisionFilter::DEFAULT);
        }
        self.score(ScoreEvent::Hyperspace);
        self.cues.emit(Cue::MissionStart);
        self.state.show_message("Clear the asteroids!", self.now);
        self.hold_ball(self.tuning.hyperspace_launch);
    }

    /// Armed after a mission: pays the away bonus
    pub(crate) fn on_away_ramp(&mut self) {
        if !self.fire(ReactionKind::AwayRamp) {
            return;
        }
        if !self.state.away_armed {
            self.score(ScoreEvent::AwayConsolation);
            self.cues.emit(Cue::Consolation);
            return;
        }

        self.state.away_armed = false;
        self.score(ScoreEvent::AwayMission);
        self.cues.emit(Cue::MissionStart);
        self.state.show_message("Away mission!", self.now);
        self.hold_ball(self.tuning.away_launch);
    }

    pub(crate) fn on_wormhole(&mut self) {
        if !self.fire(ReactionKind::Wormhole) {
            return;
        }
        self.score(ScoreEvent::Wormhole);
        self.hold_ball(self.tuning.wormhole_launch);
    }

    pub(crate) fn on_secret(&mut self) {
        if !self.fire(ReactionKind::Secret) {
            return;
        }
        self.score(ScoreEvent::Secret);
        self.gates.close(&mut self.world, DoorKind::Secret);
        self.hold_ball(self.tuning.secret_launch);
    }

    pub(crate) fn on_chute(&mut self) {
        if !self.fire(ReactionKind::Chute) {
            return;
        }
        self.score(ScoreEvent::Chute);
        self.world
            .apply_force(self.ball.body, Vec2::new(0.0, -self.tuning.chute_force));
    }

    pub(crate) fn on_refuel_warp(&mut self) {
        if !self.fire(ReactionKind::RefuelWarp) {
            return;
        }
        log::debug!("Warping to the refuel table");
        self.warp_ball(REFUEL_ZONE, WarpMode::Choreographed(WarpFollowup::Nothing));
    }

    /// Every third hit opens the secret door. The hit counter runs 1..=cap
    /// and wraps back to 1 after the cap.
    pub(crate) fn on_button(&mut self) {
        if !self.fire(ReactionKind::Button) {
            return;
        }
        self.buttons.button = self.buttons.button % self.tuning.button_hit_cap + 1;
        self.score(ScoreEvent::Button);
        if self.buttons.button % self.tuning.button_effect_every == 0
            && self.gates.open(&mut self.world, DoorKind::Secret)
        {
            self.cues.emit(Cue::DoorOpen);
        }
    }

    /// Every third hit closes the out-lanes again. Counts and wraps like
    /// [`Table::on_button`].
    pub(crate) fn on_diagonal_button(&mut self) {
        if !self.fire(ReactionKind::DiagonalButton) {
            return;
        }
        self.buttons.diagonal = self.buttons.diagonal % self.tuning.button_hit_cap + 1;
        self.score(ScoreEvent::Button);
        if self.buttons.diagonal % self.tuning.button_effect_every == 0 {
            self.gates.reset_outlanes(&mut self.world);
        }
    }

    pub(crate) fn on_asteroid(&mut self, index: u8, body: BodyHandle) {
        if self.ball_speed() <= self.tuning.asteroid_min_speed || !self.fire(ReactionKind::Asteroid) {
            return;
        }
        match self.state.hit_asteroid(index) {
            AsteroidOutcome::Ignored => {}
            AsteroidOutcome::Damaged { remaining } => {
                log::debug!("Asteroid {} hit, {} left", index, remaining);
                self.score(ScoreEvent::AsteroidHit);
                self.cues.emit(Cue::AsteroidHit);
            }
            AsteroidOutcome::Destroyed => {
                self.score(ScoreEvent::AsteroidHit);
                self.cues.emit(Cue::AsteroidDestroyed);
                self.world.set_filter(body, CollisionFilter::PASS_THROUGH);
            }
            AsteroidOutcome::FieldCleared => {
                self.score(ScoreEvent::AsteroidHit);
                self.cues.emit(Cue::AsteroidDestroyed);
                self.world.set_filter(body, CollisionFilter::PASS_THROUGH);
                let rank = self.state.complete_mission();
                self.score(ScoreEvent::MissionComplete { rank });
                self.cues.emit(Cue::MissionComplete);
                self.state.show_message("Mission complete!", self.now);
            }
        }
    }

    /// Spin up a spinner the ball passes through
    pub(crate) fn on_spinner(&mut self, index: u8) {
        let velocity = self.ball_velocity();
        let Some(spinner) = self.spinners.get_mut(index as usize) else {
            log::warn!("No spinner {}", index);
            return;
        };
        if !spinner.hit(velocity.y, &self.tuning) {
            return;
        }

        let body = self.ball.body;
        self.world
            .set_velocity(body, velocity - Vec2::new(0.0, self.tuning.spinner_nudge));
        if velocity.y < 0.0 {
            self.ball.boost = self.tuning.spinner_boost;
            if let Some(timer) = self.ball.boost_timer.take() {
                self.scheduler.cancel(timer);
            }
            self.ball.boost_timer = Some(self.scheduler.schedule(
                self.now,
                self.tuning.spinner_boost_ms,
                Deferred::BoostEnd,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::consts::*;
    use crate::cue::{Cue, Side};
    use crate::sim::arcade::ArcadeWorld;
    use crate::sim::label::{DoorKind, EntityKind, LightGroup, LightId};
    use crate::sim::table::{Deferred, Table};
    use crate::sim::world::{CollisionFilter, ContactEvent, ContactPhase, RigidBodyWorld};
    use crate::tuning::Tuning;
    use glam::Vec2;

    fn table() -> Table<ArcadeWorld> {
        Table::new(ArcadeWorld::default(), Tuning::default()).unwrap()
    }

    fn touch(t: &mut Table<ArcadeWorld>, phase: ContactPhase, kind: EntityKind) {
        let other = t.layout().first(kind).unwrap();
        let ball = t.layout().ball;
        t.handle_contact(ContactEvent { phase, a: ball, b: other });
    }

    fn hit(t: &mut Table<ArcadeWorld>, kind: EntityKind) {
        touch(t, ContactPhase::Begin, kind);
    }

    fn set_ball_velocity(t: &mut Table<ArcadeWorld>, v: Vec2) {
        let ball = t.layout().ball;
        t.world_mut().set_velocity(ball, v);
    }

    #[test]
    fn test_sling_scores_and_defers_force() {
        let mut t = table();
        hit(&mut t, EntityKind::Sling(0));
        assert_eq!(t.state().score, t.tuning().scores.sling);
        assert_eq!(t.cues().count(Cue::SlingFlash(0)), 1);
        assert_eq!(t.pending_events(), 2);

        // Right-hand sling kicks the other way
        hit(&mut t, EntityKind::Sling(1));
        assert_eq!(t.cues().count(Cue::Sling), 2);
        assert_eq!(t.state().score, 2 * t.tuning().scores.sling);
    }

    #[test]
    fn test_ding_needs_speed_and_window() {
        let mut t = table();
        set_ball_velocity(&mut t, Vec2::new(0.2, 0.2));
        hit(&mut t, EntityKind::Board);
        assert_eq!(t.cues().count(Cue::Ding), 0);

        set_ball_velocity(&mut t, Vec2::new(3.0, 0.0));
        hit(&mut t, EntityKind::Post);
        t.now += 50.0;
        hit(&mut t, EntityKind::Board);
        assert_eq!(t.cues().count(Cue::Ding), 1);
        t.now += 40.0;
        hit(&mut t, EntityKind::Flipper);
        assert_eq!(t.cues().count(Cue::Ding), 2);
        assert_eq!(t.state().score, 0);
    }

    #[test]
    fn test_bumper_sound_only_when_fast() {
        let mut t = table();
        hit(&mut t, EntityKind::Bumper(2));
        assert_eq!(t.cues().count(Cue::BumperHit), 0);
        assert_eq!(t.cues().count(Cue::BumperFlash(2)), 1);

        t.now += 20.0;
        set_ball_velocity(&mut t, Vec2::new(0.0, 4.0));
        hit(&mut t, EntityKind::Bumper(2));
        assert_eq!(t.cues().count(Cue::BumperHit), 1);
    }

    #[test]
    fn test_kick_is_one_way() {
        let mut t = table();
        set_ball_velocity(&mut t, Vec2::new(0.0, -2.0));
        hit(&mut t, EntityKind::Kick);
        assert_eq!(t.pending_events(), 1);

        set_ball_velocity(&mut t, Vec2::new(0.0, 2.0));
        hit(&mut t, EntityKind::Kick);
        assert_eq!(t.pending_events(), 2);
    }

    #[test]
    fn test_kicker_opens_its_outlane_briefly() {
        let mut t = table();
        t.place_ball(Vec2::new(149.0, 265.0));
        t.run_deferred(Deferred::Kick);
        assert!(t.gates().is_open(DoorKind::RightOutlane));
        assert!(!t.gates().is_open(DoorKind::LeftOutlane));
        assert_eq!(t.cues().count(Cue::Kicker(Side::Right)), 1);
        assert_eq!(
            t.world().pending_force(t.layout().ball),
            Some(Vec2::new(0.0, -t.tuning().kick_force))
        );

        t.run_deferred(Deferred::CloseDoor(DoorKind::RightOutlane));
        assert!(!t.gates().is_open(DoorKind::RightOutlane));
    }

    #[test]
    fn test_light_group_completion_schedules_reset() {
        let mut t = table();
        for index in 0..3 {
            hit(
                &mut t,
                EntityKind::Light(LightId {
                    group: LightGroup::Post,
                    index,
                }),
            );
        }
        assert_eq!(t.cues().count(Cue::LightGroupComplete), 1);
        assert_eq!(t.state().score, 3 * t.tuning().scores.light_toggle);
        assert_eq!(t.pending_events(), 2);
        assert!(t.lights().row(LightGroup::Post).iter().all(|l| l.is_lit()));
    }

    #[test]
    fn test_toggle_light_by_label() {
        let mut t = table();
        t.toggle_light("base-light");
        t.toggle_light("base-light:9");
        t.toggle_light("warp-light:0");
        assert_eq!(t.state().score, 0);

        t.toggle_light("base-light:2");
        assert!(t.lights().row(LightGroup::Base)[2].is_lit());
        assert_eq!(t.state().score, t.tuning().scores.light_toggle);
    }

    #[test]
    fn test_unarmed_hyperspace_consoles() {
        let mut t = table();
        let events = t.pending_events();
        hit(&mut t, EntityKind::Hyperspace);
        assert_eq!(t.state().score, t.tuning().scores.hyperspace_consolation);
        assert_eq!(t.cues().count(Cue::Consolation), 1);
        assert!(!t.state().mission_open);
        assert_eq!(t.pending_events(), events);
    }

    #[test]
    fn test_armed_hyperspace_opens_mission() {
        let mut t = table();
        t.state.hyperspace_armed = true;
        let events = t.pending_events();
        hit(&mut t, EntityKind::Hyperspace);
        assert!(t.state().mission_open);
        assert!(!t.state().hyperspace_armed);
        assert_eq!(t.state().score, t.tuning().scores.hyperspace);
        assert_eq!(t.cues().count(Cue::MissionStart), 1);
        assert_eq!(t.pending_events(), events + 1);
        for (_, body) in &t.layout().asteroids {
            assert_eq!(t.world().filter(*body), Some(CollisionFilter::DEFAULT));
        }

        // Inside the cooldown a second entry is ignored
        t.now += 100.0;
        hit(&mut t, EntityKind::Hyperspace);
        assert_eq!(t.state().score, t.tuning().scores.hyperspace);
    }

    #[test]
    fn test_asteroid_field_to_mission_complete() {
        let mut t = table();
        t.state.hyperspace_armed = true;
        hit(&mut t, EntityKind::Hyperspace);
        set_ball_velocity(&mut t, Vec2::new(5.0, 0.0));

        // Too slow to count
        t.now += 300.0;
        set_ball_velocity(&mut t, Vec2::new(1.0, 0.0));
        hit(&mut t, EntityKind::Asteroid(0));
        assert_eq!(t.state().asteroids[&0], 3);

        set_ball_velocity(&mut t, Vec2::new(5.0, 0.0));
        for index in 0..3u8 {
            for _ in 0..3 {
                t.now += 300.0;
                hit(&mut t, EntityKind::Asteroid(index));
            }
            let body = t.layout().asteroid(index).unwrap();
            assert_eq!(t.world().filter(body), Some(CollisionFilter::PASS_THROUGH));
        }
        assert_eq!(t.state().rank, 1);
        assert!(!t.state().mission_open);
        assert!(t.state().away_armed);
        assert_eq!(t.cues().count(Cue::AsteroidDestroyed), 3);
        assert_eq!(t.cues().count(Cue::MissionComplete), 1);
    }

    #[test]
    fn test_away_ramp_pays_after_mission() {
        let mut t = table();
        hit(&mut t, EntityKind::AwayRamp);
        assert_eq!(t.state().score, t.tuning().scores.away_consolation);

        t.now += 2500.0;
        t.state.away_armed = true;
        hit(&mut t, EntityKind::AwayRamp);
        assert_eq!(
            t.state().score,
            t.tuning().scores.away_consolation + t.tuning().scores.away_mission
        );
        assert!(!t.state().away_armed);
    }

    #[test]
    fn test_secret_closes_its_door_and_holds() {
        let mut t = table();
        t.gates.open(&mut t.world, DoorKind::Secret);
        hit(&mut t, EntityKind::Secret);
        assert!(!t.gates().is_open(DoorKind::Secret));
        assert_eq!(t.state().score, t.tuning().scores.secret);
        assert_eq!(t.world().is_sleeping(t.layout().ball), Some(true));
    }

    #[test]
    fn test_third_button_hit_opens_secret() {
        let mut t = table();
        for i in 0..3 {
            assert!(!t.gates().is_open(DoorKind::Secret));
            t.now = 1000.0 + 2000.0 * i as f64;
            touch(&mut t, ContactPhase::Active, EntityKind::Button);
        }
        assert!(t.gates().is_open(DoorKind::Secret));
        assert_eq!(t.cues().count(Cue::DoorOpen), 1);
        assert_eq!(t.buttons().button, 3);
    }

    #[test]
    fn test_button_counter_wraps_after_cap() {
        let mut t = table();
        let mut seen = Vec::new();
        for i in 0..10 {
            t.now = 2000.0 * (i + 1) as f64;
            hit(&mut t, EntityKind::Button);
            seen.push(t.buttons().button);
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 1]);
        assert_eq!(t.state().score, 10 * t.tuning().scores.button);
    }

    #[test]
    fn test_diagonal_button_resets_outlanes() {
        let mut t = table();
        t.gates.open(&mut t.world, DoorKind::LeftOutlane);
        for i in 0..3 {
            t.now = 2000.0 * (i + 1) as f64;
            hit(&mut t, EntityKind::DiagonalButton);
        }
        assert!(!t.gates().is_open(DoorKind::LeftOutlane));
    }

    #[test]
    fn test_spinner_spins_and_boosts_upward_ball() {
        let mut t = table();
        set_ball_velocity(&mut t, Vec2::new(0.0, -4.0));
        touch(&mut t, ContactPhase::Active, EntityKind::Spinner(0));
        assert!(t.spinners()[0].is_spinning());
        assert_eq!(t.spinners()[0].speed, -16.0);
        assert!(t.ball().boost > 0.0);
        assert_eq!(t.ball_velocity().y, -4.0 - t.tuning().spinner_nudge);

        // Still fast: a second pass changes nothing
        touch(&mut t, ContactPhase::Active, EntityKind::Spinner(0));
        assert_eq!(t.spinners()[0].speed, -16.0);

        t.run_deferred(Deferred::BoostEnd);
        assert_eq!(t.ball().boost, 0.0);
    }

    #[test]
    fn test_chute_nudges_up() {
        let mut t = table();
        hit(&mut t, EntityKind::ChuteSensor);
        hit(&mut t, EntityKind::ChuteSensor);
        assert_eq!(t.state().score, t.tuning().scores.chute);
        assert_eq!(
            t.world().pending_force(t.layout().ball),
            Some(Vec2::new(0.0, -t.tuning().chute_force))
        );
    }

    #[test]
    fn test_refuel_warp_is_choreographed() {
        let mut t = table();
        touch(&mut t, ContactPhase::Active, EntityKind::RefuelWarp);
        touch(&mut t, ContactPhase::Active, EntityKind::RefuelWarp);
        assert_eq!(t.cues().count(Cue::FadeOut), 1);
        t.run_deferred(Deferred::WarpReposition { to: REFUEL_ZONE });
        assert_eq!(t.ball_position(), REFUEL_ZONE);
    }

    #[test]
    fn test_wormhole_holds_then_exits() {
        let mut t = table();
        hit(&mut t, EntityKind::Wormhole);
        assert_eq!(t.state().score, t.tuning().scores.wormhole);
        assert_eq!(t.world().is_sleeping(t.layout().ball), Some(true));
    }
}
