//! Arcade rigid-body world
//!
//! A small, deterministic implementation of [`RigidBodyWorld`] good enough to
//! drive the table headless: gravity, force accumulation, anchored springs,
//! lever-driven flippers and circle-vs-shape contacts for free bodies (the
//! ball). Velocities are in pixels per step and forces follow the Verlet
//! convention `dv = F / m * dt²`, so board tuning values carry over unchanged.

use std::collections::BTreeSet;

use glam::Vec2;

use super::collision::{
    CollisionResult, ball_chain_collision, ball_circle_collision, ball_rect_collision,
    bounce_velocity,
};
use super::label::EntityKind;
use super::world::{
    BodyConfig, BodyHandle, CollisionFilter, Constraint, ContactEvent, ContactPhase,
    RigidBodyWorld, Shape,
};

/// Gravity scale applied to the configured gravity, per ms²
const GRAVITY_SCALE: f32 = 0.001;

/// Cap on how hard a bouncy surface can throw the ball back
const MAX_RESTITUTION: f32 = 1.5;

const MAX_SUBSTEPS: u32 = 8;

#[derive(Debug, Clone)]
struct Body {
    label: EntityKind,
    shape: Shape,
    pos: Vec2,
    vel: Vec2,
    angle: f32,
    angular_vel: f32,
    is_static: bool,
    is_sensor: bool,
    restitution: f32,
    friction: f32,
    mass: f32,
    filter: CollisionFilter,
    gravity_scale: f32,
    sleeping: bool,
    force: Vec2,
    /// World anchor of a `Constraint::World` pin
    pivot: Option<Vec2>,
}

impl Body {
    fn is_free(&self) -> bool {
        !self.is_static && self.pivot.is_none()
    }

    fn collide(&self, ball_pos: Vec2, ball_radius: f32) -> CollisionResult {
        match &self.shape {
            Shape::Circle { radius } => ball_circle_collision(ball_pos, ball_radius, self.pos, *radius),
            Shape::Rect { width, height } => ball_rect_collision(
                ball_pos,
                ball_radius,
                self.pos,
                self.angle,
                Vec2::new(width / 2.0, height / 2.0),
            ),
            Shape::Chain { points } => ball_chain_collision(ball_pos, ball_radius, self.pos, points),
        }
    }

    /// Surface velocity at a world point, including spin about the pin
    fn velocity_at(&self, point: Vec2) -> Vec2 {
        let r = point - self.pivot.unwrap_or(self.pos);
        self.vel + Vec2::new(-r.y, r.x) * self.angular_vel
    }
}

/// Deterministic reference world
#[derive(Debug, Clone)]
pub struct ArcadeWorld {
    bodies: Vec<Body>,
    constraints: Vec<Constraint>,
    gravity: Vec2,
    /// Pairs touching at the end of the previous step (ordered handles)
    touching: BTreeSet<(BodyHandle, BodyHandle)>,
    contacts: Vec<ContactEvent>,
    /// Contacts queued by `inject_contact`, reported after the next step's own
    injected: Vec<ContactEvent>,
}

impl ArcadeWorld {
    /// Create a world with downward gravity `gravity_y` (board units)
    pub fn new(gravity_y: f32) -> Self {
        Self {
            bodies: Vec::new(),
            constraints: Vec::new(),
            gravity: Vec2::new(0.0, gravity_y),
            touching: BTreeSet::new(),
            contacts: Vec::new(),
            injected: Vec::new(),
        }
    }

    /// Queue a synthetic contact, e.g. to replay a recorded session
    pub fn inject_contact(&mut self, phase: ContactPhase, a: BodyHandle, b: BodyHandle) {
        self.injected.push(ContactEvent { phase, a, b });
    }

    /// Number of bodies created so far
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Current filter of a body
    pub fn filter(&self, body: BodyHandle) -> Option<CollisionFilter> {
        self.get(body).map(|b| b.filter)
    }

    pub fn is_sleeping(&self, body: BodyHandle) -> Option<bool> {
        self.get(body).map(|b| b.sleeping)
    }

    pub fn gravity_scale(&self, body: BodyHandle) -> Option<f32> {
        self.get(body).map(|b| b.gravity_scale)
    }

    /// Force waiting to be applied on the next step
    pub fn pending_force(&self, body: BodyHandle) -> Option<Vec2> {
        self.get(body).map(|b| b.force)
    }

    fn get(&self, body: BodyHandle) -> Option<&Body> {
        self.bodies.get(body.0 as usize)
    }

    fn get_mut(&mut self, body: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(body.0 as usize)
    }

    fn insert(&mut self, shape: Shape, config: BodyConfig, is_static: bool) -> BodyHandle {
        let handle = BodyHandle(self.bodies.len() as u32);
        self.bodies.push(Body {
            label: config.label,
            shape,
            pos: config.position,
            vel: Vec2::ZERO,
            angle: config.angle,
            angular_vel: 0.0,
            is_static,
            is_sensor: config.is_sensor,
            restitution: config.restitution,
            friction: config.friction,
            mass: config.mass.max(1e-4),
            filter: config.filter,
            gravity_scale: 1.0,
            sleeping: false,
            force: Vec2::ZERO,
            pivot: None,
        });
        handle
    }

    fn integrate(&mut self, dt_sq: f32) {
        let gravity = self.gravity * GRAVITY_SCALE;
        for body in &mut self.bodies {
            if body.is_static || body.sleeping {
                body.force = Vec2::ZERO;
                continue;
            }
            // Pinned bodies only answer to their springs
            let fall = if body.is_free() {
                gravity * body.gravity_scale
            } else {
                Vec2::ZERO
            };
            body.vel += (body.force / body.mass + fall) * dt_sq;
            body.force = Vec2::ZERO;
        }
    }

    fn solve_constraints(&mut self) {
        for i in 0..self.constraints.len() {
            match self.constraints[i] {
                Constraint::World {
                    body,
                    anchor,
                    local,
                    stiffness,
                } => {
                    let has_link = self
                        .constraints
                        .iter()
                        .any(|c| matches!(c, Constraint::Link { a, .. } if *a == body));
                    let Some(b) = self.get_mut(body) else { continue };
                    if has_link {
                        // Orientation comes from the lever; only the pivot is pinned here
                        continue;
                    }
                    // Spring the pinned point back to its anchor and bleed off energy
                    let pinned_point = b.pos + Vec2::from_angle(b.angle).rotate(local);
                    b.vel += (anchor - pinned_point) * stiffness;
                    b.vel *= 1.0 - stiffness;
                }
                Constraint::Link { a, b, local_a, .. } => {
                    let Some(target) = self.get(b).map(|lever| lever.pos) else { continue };
                    let pivot = self.constraints.iter().find_map(|c| match c {
                        Constraint::World { body, anchor, .. } if *body == a => Some(*anchor),
                        _ => None,
                    });
                    let Some(pivot) = pivot else { continue };
                    let Some(body) = self.get_mut(a) else { continue };

                    // Swing about the pivot so the body's axis points at the lever
                    let to_target = target - pivot;
                    if to_target.length_squared() < 1e-6 {
                        continue;
                    }
                    let new_angle = to_target.y.atan2(to_target.x);
                    let mut delta = new_angle - body.angle;
                    while delta > std::f32::consts::PI {
                        delta -= std::f32::consts::TAU;
                    }
                    while delta < -std::f32::consts::PI {
                        delta += std::f32::consts::TAU;
                    }
                    body.angular_vel = delta;
                    body.angle = new_angle;
                    let reach = local_a.length();
                    body.pos = pivot + Vec2::from_angle(new_angle) * reach;
                    body.vel = Vec2::ZERO;
                }
            }
        }
    }

    fn advance_positions(&mut self, fraction: f32) {
        for body in &mut self.bodies {
            if body.is_static || body.sleeping {
                continue;
            }
            if body.pivot.is_some() && is_driven(&body.shape) {
                // Flippers are posed by their lever link
                continue;
            }
            body.pos += body.vel * fraction;
            body.angle += body.angular_vel * fraction;
        }
    }

    /// Enough sub-steps that no free circle moves more than half its radius
    fn substeps(&self) -> u32 {
        let worst = self
            .bodies
            .iter()
            .filter(|b| b.is_free() && !b.sleeping)
            .filter_map(|b| match b.shape {
                Shape::Circle { radius } if radius > 0.0 => Some(b.vel.length() / (radius * 0.5)),
                _ => None,
            })
            .fold(0.0_f32, f32::max);
        (worst.ceil() as u32).clamp(1, MAX_SUBSTEPS)
    }

    fn detect_contacts(&mut self, now_touching: &mut BTreeSet<(BodyHandle, BodyHandle)>) {
        for i in 0..self.bodies.len() {
            if !self.bodies[i].is_free() || self.bodies[i].sleeping {
                continue;
            }
            let Shape::Circle { radius } = self.bodies[i].shape else { continue };

            for j in 0..self.bodies.len() {
                if i == j {
                    continue;
                }
                let (ball, other) = pair_mut(&mut self.bodies, i, j);
                if !ball.filter.can_collide(&other.filter) {
                    continue;
                }
                let result = other.collide(ball.pos, radius);
                if !result.hit {
                    continue;
                }

                let key = ordered(BodyHandle(i as u32), BodyHandle(j as u32));
                now_touching.insert(key);

                if ball.is_sensor || other.is_sensor {
                    continue;
                }

                // Push out and bounce off the surface
                ball.pos += result.normal * result.penetration;
                let surface = other.velocity_at(result.point);
                let restitution = ball.restitution.max(other.restitution).min(MAX_RESTITUTION);
                let friction = ball.friction.max(other.friction);
                let before = ball.vel;
                ball.vel = bounce_velocity(ball.vel, surface, result.normal, restitution, friction);

                // Anchored bodies (bumpers) recoil a little and spring back
                if other.pivot.is_some() && !is_driven(&other.shape) {
                    let impulse = (before - ball.vel) * (ball.mass / (ball.mass + other.mass));
                    other.vel += impulse * 0.1;
                }
            }
        }
    }
}

/// Pinned rectangles are lever-driven flippers
fn is_driven(shape: &Shape) -> bool {
    matches!(shape, Shape::Rect { .. })
}

fn ordered(a: BodyHandle, b: BodyHandle) -> (BodyHandle, BodyHandle) {
    if a <= b { (a, b) } else { (b, a) }
}

/// Two distinct mutable borrows from one slice
fn pair_mut(bodies: &mut [Body], i: usize, j: usize) -> (&mut Body, &mut Body) {
    if i < j {
        let (head, tail) = bodies.split_at_mut(j);
        (&mut head[i], &mut tail[0])
    } else {
        let (head, tail) = bodies.split_at_mut(i);
        (&mut tail[0], &mut head[j])
    }
}

impl Default for ArcadeWorld {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl RigidBodyWorld for ArcadeWorld {
    fn create_static_body(&mut self, shape: Shape, config: BodyConfig) -> BodyHandle {
        self.insert(shape, config, true)
    }

    fn create_dynamic_body(&mut self, shape: Shape, config: BodyConfig) -> BodyHandle {
        self.insert(shape, config, false)
    }

    fn create_constraint(&mut self, constraint: Constraint) {
        if let Constraint::World { body, anchor, .. } = constraint {
            if let Some(b) = self.get_mut(body) {
                b.pivot = Some(anchor);
            }
        }
        self.constraints.push(constraint);
    }

    fn label(&self, body: BodyHandle) -> Option<EntityKind> {
        self.get(body).map(|b| b.label)
    }

    fn position(&self, body: BodyHandle) -> Option<Vec2> {
        self.get(body).map(|b| b.pos)
    }

    fn velocity(&self, body: BodyHandle) -> Option<Vec2> {
        self.get(body).map(|b| b.vel)
    }

    fn angle(&self, body: BodyHandle) -> Option<f32> {
        self.get(body).map(|b| b.angle)
    }

    fn set_position(&mut self, body: BodyHandle, position: Vec2) {
        if let Some(b) = self.get_mut(body) {
            b.pos = position;
        }
    }

    fn set_velocity(&mut self, body: BodyHandle, velocity: Vec2) {
        if let Some(b) = self.get_mut(body) {
            b.vel = velocity;
        }
    }

    fn set_angular_velocity(&mut self, body: BodyHandle, angular_velocity: f32) {
        if let Some(b) = self.get_mut(body) {
            b.angular_vel = angular_velocity;
        }
    }

    fn apply_force(&mut self, body: BodyHandle, force: Vec2) {
        if let Some(b) = self.get_mut(body) {
            b.force += force;
        }
    }

    fn set_filter(&mut self, body: BodyHandle, filter: CollisionFilter) {
        if let Some(b) = self.get_mut(body) {
            b.filter = filter;
        }
    }

    fn set_gravity_scale(&mut self, body: BodyHandle, scale: f32) {
        if let Some(b) = self.get_mut(body) {
            b.gravity_scale = scale;
        }
    }

    fn set_sleeping(&mut self, body: BodyHandle, sleeping: bool) {
        if let Some(b) = self.get_mut(body) {
            b.sleeping = sleeping;
            if sleeping {
                b.vel = Vec2::ZERO;
                b.angular_vel = 0.0;
            }
        }
    }

    fn step(&mut self, dt_ms: f64) {
        let dt = dt_ms as f32;
        self.integrate(dt * dt);
        self.solve_constraints();

        let substeps = self.substeps();
        let mut now_touching = BTreeSet::new();
        for _ in 0..substeps {
            self.advance_positions(1.0 / substeps as f32);
            self.detect_contacts(&mut now_touching);
        }

        for &(a, b) in &now_touching {
            let phase = if self.touching.contains(&(a, b)) {
                ContactPhase::Active
            } else {
                ContactPhase::Begin
            };
            self.contacts.push(ContactEvent { phase, a, b });
        }
        self.touching = now_touching;
        self.contacts.append(&mut self.injected);
    }

    fn drain_contacts(&mut self) -> Vec<ContactEvent> {
        std::mem::take(&mut self.contacts)
    }
}
