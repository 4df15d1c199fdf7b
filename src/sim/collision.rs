//! Narrow-phase collision tests for the ball
//!
//! The ball is always a circle; everything it can touch is a circle, an
//! oriented rectangle or a chain of wall segments. Each test returns the
//! contact normal pointing from the surface toward the ball center.

use glam::Vec2;

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Closest point on the surface (if hit)
    pub point: Vec2,
    /// Surface normal, pointing toward the ball center
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec2::ZERO,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }

    fn deeper(self, other: CollisionResult) -> CollisionResult {
        match (self.hit, other.hit) {
            (false, _) => other,
            (true, false) => self,
            (true, true) if other.penetration > self.penetration => other,
            _ => self,
        }
    }
}

/// Ball vs circle
pub fn ball_circle_collision(
    ball_pos: Vec2,
    ball_radius: f32,
    center: Vec2,
    radius: f32,
) -> CollisionResult {
    let delta = ball_pos - center;
    let dist = delta.length();
    let reach = ball_radius + radius;
    if dist >= reach {
        return CollisionResult::miss();
    }
    // Concentric: push straight up
    let normal = if dist > 1e-6 { delta / dist } else { Vec2::NEG_Y };
    CollisionResult {
        hit: true,
        point: center + normal * radius,
        normal,
        penetration: reach - dist,
    }
}

/// Ball vs rectangle of half extents `half`, rotated by `angle` about `center`
pub fn ball_rect_collision(
    ball_pos: Vec2,
    ball_radius: f32,
    center: Vec2,
    angle: f32,
    half: Vec2,
) -> CollisionResult {
    let rot = Vec2::from_angle(angle);
    let local = Vec2::from_angle(-angle).rotate(ball_pos - center);
    let clamped = local.clamp(-half, half);

    if clamped == local {
        // Center inside the box: leave through the nearest face
        let to_x = half.x - local.x.abs();
        let to_y = half.y - local.y.abs();
        let (normal_local, face_dist) = if to_x < to_y {
            (Vec2::new(local.x.signum(), 0.0), to_x)
        } else {
            (Vec2::new(0.0, local.y.signum()), to_y)
        };
        let face_point = local + normal_local * face_dist;
        return CollisionResult {
            hit: true,
            point: center + rot.rotate(face_point),
            normal: rot.rotate(normal_local),
            penetration: face_dist + ball_radius,
        };
    }

    let offset = local - clamped;
    let dist = offset.length();
    if dist >= ball_radius {
        return CollisionResult::miss();
    }
    CollisionResult {
        hit: true,
        point: center + rot.rotate(clamped),
        normal: rot.rotate(offset / dist),
        penetration: ball_radius - dist,
    }
}

/// Ball vs a single wall segment
pub fn ball_segment_collision(ball_pos: Vec2, ball_radius: f32, a: Vec2, b: Vec2) -> CollisionResult {
    let seg = b - a;
    let len_sq = seg.length_squared();
    if len_sq < 0.0001 {
        return ball_circle_collision(ball_pos, ball_radius, a, 0.0);
    }

    let t = ((ball_pos - a).dot(seg) / len_sq).clamp(0.0, 1.0);
    let closest = a + seg * t;
    let offset = ball_pos - closest;
    let dist = offset.length();
    if dist >= ball_radius {
        return CollisionResult::miss();
    }

    let normal = if dist > 1e-6 {
        offset / dist
    } else {
        // Ball center on the line - use the segment's left-hand perpendicular
        Vec2::new(-seg.y, seg.x).normalize()
    };
    CollisionResult {
        hit: true,
        point: closest,
        normal,
        penetration: ball_radius - dist,
    }
}

/// Ball vs polyline; reports the deepest segment contact
pub fn ball_chain_collision(
    ball_pos: Vec2,
    ball_radius: f32,
    origin: Vec2,
    points: &[Vec2],
) -> CollisionResult {
    points
        .windows(2)
        .map(|w| ball_segment_collision(ball_pos, ball_radius, origin + w[0], origin + w[1]))
        .fold(CollisionResult::miss(), CollisionResult::deeper)
}

/// Bounce off a (possibly moving) surface with restitution and tangential friction
///
/// Only the velocity relative to the surface is reflected, so a swinging
/// flipper hands its own speed to the ball.
pub fn bounce_velocity(
    velocity: Vec2,
    surface_velocity: Vec2,
    normal: Vec2,
    restitution: f32,
    friction: f32,
) -> Vec2 {
    let relative = velocity - surface_velocity;
    let approach = relative.dot(normal);
    if approach >= 0.0 {
        // Already separating
        return velocity;
    }
    let normal_part = normal * approach;
    let tangent_part = (relative - normal_part) * (1.0 - friction.clamp(0.0, 1.0));
    surface_velocity + tangent_part - normal_part * restitution
}
