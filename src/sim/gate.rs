//! Gates
//!
//! A gate keeps its shape and label forever; only its collision filter
//! changes. Open gates let the ball through, closed gates block it.

use serde::{Deserialize, Serialize};

use super::label::DoorKind;
use super::world::{BodyHandle, CollisionFilter, RigidBodyWorld};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateMode {
    Open,
    Closed,
}

impl GateMode {
    pub fn filter(&self) -> CollisionFilter {
        match self {
            GateMode::Open => CollisionFilter::PASS_THROUGH,
            GateMode::Closed => CollisionFilter::DEFAULT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Gate {
    kind: DoorKind,
    body: BodyHandle,
    mode: GateMode,
    default_mode: GateMode,
}

/// Every gate on the table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateBank {
    gates: Vec<Gate>,
}

impl GateBank {
    /// Register gates; every door starts closed
    pub fn new<W: RigidBodyWorld>(world: &mut W, doors: &[(DoorKind, BodyHandle)]) -> Self {
        let mut bank = Self {
            gates: doors
                .iter()
                .map(|(kind, body)| Gate {
                    kind: *kind,
                    body: *body,
                    mode: GateMode::Closed,
                    default_mode: GateMode::Closed,
                })
                .collect(),
        };
        bank.reset_all(world);
        bank
    }

    pub fn mode(&self, kind: DoorKind) -> Option<GateMode> {
        self.gates.iter().find(|g| g.kind == kind).map(|g| g.mode)
    }

    pub fn is_open(&self, kind: DoorKind) -> bool {
        self.mode(kind) == Some(GateMode::Open)
    }

    /// Switch a gate. Returns false if the table has no such gate.
    pub fn set<W: RigidBodyWorld>(&mut self, world: &mut W, kind: DoorKind, mode: GateMode) -> bool {
        let Some(gate) = self.gates.iter_mut().find(|g| g.kind == kind) else {
            log::warn!("No gate {} on this table", kind.name());
            return false;
        };
        if gate.mode != mode {
            log::debug!("{} -> {:?}", kind.name(), mode);
        }
        gate.mode = mode;
        world.set_filter(gate.body, mode.filter());
        true
    }

    pub fn open<W: RigidBodyWorld>(&mut self, world: &mut W, kind: DoorKind) -> bool {
        self.set(world, kind, GateMode::Open)
    }

    pub fn close<W: RigidBodyWorld>(&mut self, world: &mut W, kind: DoorKind) -> bool {
        self.set(world, kind, GateMode::Closed)
    }

    /// Put every gate back to its default mode
    pub fn reset_all<W: RigidBodyWorld>(&mut self, world: &mut W) {
        for gate in &mut self.gates {
            gate.mode = gate.default_mode;
            world.set_filter(gate.body, gate.mode.filter());
        }
    }

    /// Put the out-lane gates back to their default mode
    pub fn reset_outlanes<W: RigidBodyWorld>(&mut self, world: &mut W) {
        for gate in self
            .gates
            .iter_mut()
            .filter(|g| matches!(g.kind, DoorKind::LeftOutlane | DoorKind::RightOutlane))
        {
            gate.mode = gate.default_mode;
            world.set_filter(gate.body, gate.mode.filter());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::arcade::ArcadeWorld;
    use crate::sim::label::EntityKind;
    use crate::sim::world::{BodyConfig, Shape};
    use glam::Vec2;

    fn bank() -> (ArcadeWorld, GateBank, Vec<(DoorKind, BodyHandle)>) {
        let mut world = ArcadeWorld::new(0.0);
        let doors: Vec<_> = DoorKind::ALL
            .iter()
            .map(|kind| {
                let body = world.create_static_body(
                    Shape::Circle { radius: 3.0 },
                    BodyConfig::new(EntityKind::Door(*kind), Vec2::ZERO),
                );
                (*kind, body)
            })
            .collect();
        let bank = GateBank::new(&mut world, &doors);
        (world, bank, doors)
    }

    #[test]
    fn test_open_and_close_switch_filter() {
        let (mut world, mut gates, doors) = bank();
        let (kind, body) = doors[2];
        assert!(gates.open(&mut world, kind));
        assert!(gates.is_open(kind));
        assert_eq!(world.filter(body), Some(CollisionFilter::PASS_THROUGH));
        assert_eq!(world.label(body), Some(EntityKind::Door(kind)));

        gates.close(&mut world, kind);
        assert_eq!(gates.mode(kind), Some(GateMode::Closed));
        assert_eq!(world.filter(body), Some(CollisionFilter::DEFAULT));
    }

    #[test]
    fn test_reset_outlanes_leaves_secret_alone() {
        let (mut world, mut gates, _) = bank();
        for kind in DoorKind::ALL {
            gates.open(&mut world, kind);
        }
        gates.reset_outlanes(&mut world);
        assert!(!gates.is_open(DoorKind::LeftOutlane));
        assert!(!gates.is_open(DoorKind::RightOutlane));
        assert!(gates.is_open(DoorKind::Secret));

        gates.reset_all(&mut world);
        assert!(DoorKind::ALL.iter().all(|k| !gates.is_open(*k)));
    }

    #[test]
    fn test_unknown_gate() {
        let mut world = ArcadeWorld::new(0.0);
        let mut gates = GateBank::new(&mut world, &[]);
        assert!(!gates.open(&mut world, DoorKind::Secret));
        assert_eq!(gates.mode(DoorKind::Secret), None);
    }
}
