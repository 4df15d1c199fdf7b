//! Contact routing
//!
//! Every raw contact from the world is classified into a (ball, kind) pair and
//! dispatched to exactly one reaction. Contacts that don't involve the ball are
//! dropped. Discrete impacts react on `Begin`; only the linger zones (spinners,
//! refuel warp, buttons) also react while the contact stays `Active`.

use super::debounce::Debouncer;
use super::label::EntityKind;
use super::table::Table;
use super::world::{BodyHandle, ContactEvent, ContactPhase, RigidBodyWorld};
use crate::tuning::DebounceWindows;

/// A contact with the ball, classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BallContact {
    pub phase: ContactPhase,
    pub ball: BodyHandle,
    pub other: BodyHandle,
    pub kind: EntityKind,
}

/// Debounce state and routing counters
#[derive(Debug, Clone)]
pub struct CollisionRouter {
    pub debounce: Debouncer,
    /// Ball contacts with bodies the world could not label
    pub unclassified: u64,
}

impl CollisionRouter {
    pub fn new(windows: DebounceWindows) -> Self {
        Self {
            debounce: Debouncer::new(windows),
            unclassified: 0,
        }
    }

    /// Pick the ball side of a contact and label the other body
    pub fn classify<W: RigidBodyWorld>(&mut self, world: &W, event: ContactEvent) -> Option<BallContact> {
        let (ball, other) = if world.label(event.a) == Some(EntityKind::Ball) {
            (event.a, event.b)
        } else if world.label(event.b) == Some(EntityKind::Ball) {
            (event.b, event.a)
        } else {
            return None;
        };

        let Some(kind) = world.label(other) else {
            self.unclassified += 1;
            log::warn!("Ball touched unknown body {:?}", other);
            return None;
        };
        Some(BallContact {
            phase: event.phase,
            ball,
            other,
            kind,
        })
    }
}

/// Whether `kind` keeps reacting while the ball lingers in it
pub fn reacts_while_active(kind: EntityKind) -> bool {
    matches!(
        kind,
        EntityKind::Spinner(_) | EntityKind::RefuelWarp | EntityKind::Button | EntityKind::DiagonalButton
    )
}

impl<W: RigidBodyWorld> Table<W> {
    /// Route one contact to its reaction
    pub fn handle_contact(&mut self, event: ContactEvent) {
        if self.state.is_game_over() {
            return;
        }
        let Some(contact) = self.router.classify(&self.world, event) else {
            return;
        };
        log::debug!("{:?} {} at {:.0}", contact.phase, contact.kind, self.now);

        let active = contact.phase == ContactPhase::Active;
        match contact.kind {
            EntityKind::Ball | EntityKind::Lever => {}
            kind if active && !reacts_while_active(kind) => {}

            EntityKind::Spinner(index) => self.on_spinner(index),
            EntityKind::RefuelWarp => self.on_refuel_warp(),
            EntityKind::Button => self.on_button(),
            EntityKind::DiagonalButton => self.on_diagonal_button(),

            EntityKind::Board | EntityKind::Post | EntityKind::Flipper | EntityKind::Door(_) => self.on_ding(),
            EntityKind::Bumper(index) => self.on_bumper(index),
            EntityKind::Sling(index) => self.on_sling(index, contact.other),
            EntityKind::Kick => self.on_kick(),
            EntityKind::Light(id) => self.on_light(id),
            EntityKind::Hyperspace => self.on_hyperspace(),
            EntityKind::AwayRamp => self.on_away_ramp(),
            EntityKind::Wormhole => self.on_wormhole(),
            EntityKind::Secret => self.on_secret(),
            EntityKind::ChuteSensor => self.on_chute(),
            EntityKind::Asteroid(index) => self.on_asteroid(index, contact.other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::Cue;
    use crate::sim::arcade::ArcadeWorld;
    use crate::tuning::Tuning;

    fn table() -> Table<ArcadeWorld> {
        Table::new(ArcadeWorld::default(), Tuning::default()).unwrap()
    }

    fn contact(t: &Table<ArcadeWorld>, phase: ContactPhase, kind: EntityKind) -> ContactEvent {
        let other = t.layout().first(kind).unwrap();
        ContactEvent {
            phase,
            a: other,
            b: t.layout().ball,
        }
    }

    #[test]
    fn test_contacts_without_ball_change_nothing() {
        let mut t = table();
        let bumper = t.layout().first(EntityKind::Bumper(0)).unwrap();
        let sling = t.layout().first(EntityKind::Sling(0)).unwrap();
        let cues_before = t.cues().pending().len();
        let events_before = t.pending_events();

        t.handle_contact(ContactEvent {
            phase: ContactPhase::Begin,
            a: bumper,
            b: sling,
        });
        assert_eq!(t.state().score, 0);
        assert_eq!(t.cues().pending().len(), cues_before);
        assert_eq!(t.pending_events(), events_before);
    }

    #[test]
    fn test_unknown_body_is_counted_and_ignored() {
        let mut t = table();
        let ball = t.layout().ball;
        t.handle_contact(ContactEvent {
            phase: ContactPhase::Begin,
            a: ball,
            b: BodyHandle(9999),
        });
        assert_eq!(t.router.unclassified, 1);
        assert_eq!(t.state().score, 0);
    }

    #[test]
    fn test_ball_side_may_be_either_body() {
        let mut t = table();
        let bumper = t.layout().first(EntityKind::Bumper(1)).unwrap();
        let ball = t.layout().ball;
        t.handle_contact(ContactEvent {
            phase: ContactPhase::Begin,
            a: ball,
            b: bumper,
        });
        assert_eq!(t.state().score, t.tuning().scores.bumper);
    }

    #[test]
    fn test_active_contact_ignored_for_impacts() {
        let mut t = table();
        let event = contact(&t, ContactPhase::Active, EntityKind::Bumper(0));
        t.handle_contact(event);
        let event = contact(&t, ContactPhase::Active, EntityKind::Sling(0));
        t.handle_contact(event);
        assert_eq!(t.state().score, 0);
        assert_eq!(t.cues().count(Cue::Sling), 0);
    }

    #[test]
    fn test_bumper_pair_inside_window_fires_once() {
        let mut t = table();
        t.now = 1000.0;
        let event = contact(&t, ContactPhase::Begin, EntityKind::Bumper(0));
        t.handle_contact(event);
        t.now = 1005.0;
        t.handle_contact(event);
        assert_eq!(t.state().score, t.tuning().scores.bumper);
        assert_eq!(t.cues().count(Cue::BumperFlash(0)), 1);

        t.now = 1015.0;
        t.handle_contact(event);
        assert_eq!(t.state().score, 2 * t.tuning().scores.bumper);
    }

    #[test]
    fn test_game_over_stops_routing() {
        let mut t = table();
        t.state.balls = 0;
        t.reset_ball();
        let event = contact(&t, ContactPhase::Begin, EntityKind::Bumper(0));
        t.handle_contact(event);
        assert_eq!(t.state().score, 0);
    }

    #[test]
    fn test_linger_zones() {
        assert!(reacts_while_active(EntityKind::Spinner(1)));
        assert!(reacts_while_active(EntityKind::Button));
        assert!(!reacts_while_active(EntityKind::Bumper(0)));
        assert!(!reacts_while_active(EntityKind::Hyperspace));
    }
}
