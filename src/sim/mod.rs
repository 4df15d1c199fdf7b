//! Deterministic table simulation
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (autopilot)
//! - Stable contact order (by body handle)
//! - No rendering, audio or platform dependencies; those consume cues

pub mod arcade;
pub mod autopilot;
pub mod ball;
pub mod collision;
pub mod debounce;
pub mod flipper;
pub mod gate;
pub mod label;
pub mod layout;
pub mod lights;
pub mod reactions;
pub mod router;
pub mod scheduler;
pub mod snapshot;
pub mod spinner;
pub mod state;
pub mod table;
pub mod world;

pub use arcade::ArcadeWorld;
pub use autopilot::{Autopilot, PilotView};
pub use ball::{BallController, WarpMode, clamp_velocity};
pub use debounce::{Debouncer, ReactionKind};
pub use flipper::{Flipper, FlipperState};
pub use gate::{GateBank, GateMode};
pub use label::{DoorKind, EntityKind, LightGroup, LightId};
pub use layout::{TableGeometry, TableLayout};
pub use lights::{LightMatrix, LightValue, ToggleOutcome};
pub use router::{BallContact, CollisionRouter};
pub use scheduler::{Scheduler, TimerId};
pub use snapshot::TableSnapshot;
pub use spinner::Spinner;
pub use state::{AsteroidOutcome, GamePhase, Message, MissionState, ScoreEvent};
pub use table::{Deferred, Table, TickInput, WarpFollowup};
pub use world::{
    BodyConfig, BodyHandle, CollisionFilter, Constraint, ContactEvent, ContactPhase, RigidBodyWorld, Shape,
};
