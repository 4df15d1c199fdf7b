//! Rigid-body world interface
//!
//! The table consumes a physics engine through this trait: body and constraint
//! creation, velocity/force/position mutators, collision filters and a contact
//! stream. Integration, constraint solving and collision detection all live on
//! the other side of it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::label::EntityKind;

/// Opaque handle to a body owned by the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle(pub u32);

/// Collision shape, in body-local space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    /// Axis-aligned in body space; the body angle rotates it
    Rect { width: f32, height: f32 },
    /// Open polyline of wall segments (static bodies only)
    Chain { points: Vec<Vec2> },
}

/// Group/category/mask collision filter
///
/// Two bodies sharing a non-zero group always collide when it is positive and
/// never when it is negative. Otherwise each body's mask must contain the
/// other's category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionFilter {
    pub group: i32,
    pub category: u32,
    pub mask: u32,
}

impl CollisionFilter {
    /// Default for most bodies: collides with everything
    pub const DEFAULT: CollisionFilter = CollisionFilter {
        group: 0,
        category: 0x0001,
        mask: u32::MAX,
    };

    /// Static board parts
    pub const BOARD: CollisionFilter = CollisionFilter {
        group: 1,
        category: 0x0001,
        mask: 0x0001,
    };

    /// Flippers and bumpers share the ball's group so they always meet it
    pub const PLAYFIELD: CollisionFilter = CollisionFilter {
        group: 3,
        category: 0x0001,
        mask: 0x0002,
    };

    pub const BALL: CollisionFilter = CollisionFilter {
        group: 3,
        category: 0x0003,
        mask: u32::MAX,
    };

    /// Interacts with nothing (open gates, cleared asteroids)
    pub const PASS_THROUGH: CollisionFilter = CollisionFilter {
        group: 0,
        category: 0,
        mask: 0,
    };

    pub fn can_collide(&self, other: &CollisionFilter) -> bool {
        if self.group == other.group && self.group != 0 {
            return self.group > 0;
        }
        (self.mask & other.category) != 0 && (other.mask & self.category) != 0
    }
}

/// Creation parameters for a body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyConfig {
    /// Immutable semantic label
    pub label: EntityKind,
    pub position: Vec2,
    pub angle: f32,
    pub is_sensor: bool,
    pub restitution: f32,
    pub friction: f32,
    pub mass: f32,
    pub filter: CollisionFilter,
}

impl BodyConfig {
    pub fn new(label: EntityKind, position: Vec2) -> Self {
        Self {
            label,
            position,
            angle: 0.0,
            is_sensor: false,
            restitution: 0.0,
            friction: 0.1,
            mass: 1.0,
            filter: CollisionFilter::DEFAULT,
        }
    }

    pub fn sensor(mut self) -> Self {
        self.is_sensor = true;
        self
    }

    pub fn angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    pub fn restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn filter(mut self, filter: CollisionFilter) -> Self {
        self.filter = filter;
        self
    }
}

/// A constraint between a body and the world or another body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Constraint {
    /// Pin a body-local point to a fixed world anchor
    World {
        body: BodyHandle,
        anchor: Vec2,
        local: Vec2,
        stiffness: f32,
    },
    /// Swing `a` about its world pin so it points at body `b`; `local_a` is
    /// the offset from the pin to `a`'s center
    Link {
        a: BodyHandle,
        b: BodyHandle,
        local_a: Vec2,
        stiffness: f32,
    },
}

/// Discrete impact vs continuing overlap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactPhase {
    Begin,
    Active,
}

/// Raw, untyped contact between two bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEvent {
    pub phase: ContactPhase,
    pub a: BodyHandle,
    pub b: BodyHandle,
}

/// What the table needs from a physics engine
pub trait RigidBodyWorld {
    fn create_static_body(&mut self, shape: Shape, config: BodyConfig) -> BodyHandle;
    fn create_dynamic_body(&mut self, shape: Shape, config: BodyConfig) -> BodyHandle;
    fn create_constraint(&mut self, constraint: Constraint);

    /// Label assigned at creation; `None` for unknown handles
    fn label(&self, body: BodyHandle) -> Option<EntityKind>;
    fn position(&self, body: BodyHandle) -> Option<Vec2>;
    fn velocity(&self, body: BodyHandle) -> Option<Vec2>;
    fn angle(&self, body: BodyHandle) -> Option<f32>;

    fn set_position(&mut self, body: BodyHandle, position: Vec2);
    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec2);
    fn set_angular_velocity(&mut self, body: BodyHandle, angular_velocity: f32);
    /// Force accumulated into the next step
    fn apply_force(&mut self, body: BodyHandle, force: Vec2);
    fn set_filter(&mut self, body: BodyHandle, filter: CollisionFilter);
    fn set_gravity_scale(&mut self, body: BodyHandle, scale: f32);
    fn set_sleeping(&mut self, body: BodyHandle, sleeping: bool);

    /// Advance one fixed step
    fn step(&mut self, dt_ms: f64);
    /// Contacts produced by the last step, in report order
    fn drain_contacts(&mut self) -> Vec<ContactEvent>;

    /// Apply a force of `magnitude` along an angle in degrees
    fn apply_force_from_angle(&mut self, body: BodyHandle, magnitude: f32, angle_deg: f32) {
        self.apply_force(body, crate::direction_from_deg(angle_deg) * magnitude);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ball_meets_board_and_playfield() {
        assert!(CollisionFilter::BALL.can_collide(&CollisionFilter::BOARD));
        assert!(CollisionFilter::BALL.can_collide(&CollisionFilter::PLAYFIELD));
        assert!(CollisionFilter::BALL.can_collide(&CollisionFilter::DEFAULT));
    }

    #[test]
    fn test_pass_through_meets_nothing() {
        assert!(!CollisionFilter::BALL.can_collide(&CollisionFilter::PASS_THROUGH));
        assert!(!CollisionFilter::PASS_THROUGH.can_collide(&CollisionFilter::DEFAULT));
    }

    #[test]
    fn test_negative_group_never_collides() {
        let ghost = CollisionFilter {
            group: -2,
            ..CollisionFilter::DEFAULT
        };
        assert!(!ghost.can_collide(&ghost));
    }
}
