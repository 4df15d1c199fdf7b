//! Table layout
//!
//! [`TableGeometry`] is the static description of the table: boundary chains,
//! bumpers, slingshots, spinners, posts, kickers, gates and every sensor zone.
//! [`TableLayout::build`] turns it into bodies once at startup and keeps the
//! handles so other components can find bodies by kind.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::flipper::Flipper;
use super::label::{DoorKind, EntityKind, LightGroup, LightId};
use super::world::{BodyConfig, BodyHandle, CollisionFilter, Constraint, RigidBodyWorld, Shape};
use crate::consts::*;
use crate::cue::Side;
use crate::error::{TableError, TableResult};
use crate::tuning::Tuning;

/// Anchor spring holding bumpers in place
const BUMPER_STIFFNESS: f32 = 0.1;
const BUMPER_RESTITUTION: f32 = 5.0;
const BUMPER_MASS: f32 = 2.0;

const FLIPPER_MASS: f32 = 60.0;
const FLIPPER_RESTITUTION: f32 = 0.1;
const FLIPPER_PIN_STIFFNESS: f32 = 0.1;
const FLIPPER_LINK_STIFFNESS: f32 = 0.15;

const POST_RADIUS: f32 = 3.0;
const LIGHT_TOGGLE_RADIUS: f32 = 2.0;
const SPINNER_RADIUS: f32 = 6.0;
const KICK_RADIUS: f32 = 4.0;
const SLING_SIZE: Vec2 = Vec2::new(3.0, 19.0);
const ASTEROID_RADIUS: f32 = 4.0;

/// A slingshot sensor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlingSpec {
    pub position: Vec2,
    pub side: Side,
}

/// A named sensor zone (circle)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneSpec {
    pub kind: EntityKind,
    pub position: Vec2,
    pub radius: f32,
}

/// A gate and its blocking shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoorSpec {
    pub kind: DoorKind,
    pub position: Vec2,
    pub shape: Shape,
}

/// Static description of a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableGeometry {
    /// Main board boundary, one chain per wall run
    pub board: Vec<Vec<Vec2>>,
    /// Refuel mini-table boundary
    pub refuel_board: Vec<Vec<Vec2>>,
    /// Left pivot of each flipper pair
    pub flipper_rigs: Vec<Vec2>,
    pub bumpers: Vec<Vec2>,
    pub slings: Vec<SlingSpec>,
    pub posts: Vec<Vec2>,
    pub spinners: Vec<Vec2>,
    pub lights: Vec<(LightId, Vec2)>,
    pub kicks: Vec<Vec2>,
    pub asteroids: Vec<Vec2>,
    pub doors: Vec<DoorSpec>,
    pub zones: Vec<ZoneSpec>,
}

impl TableGeometry {
    /// The stock space table
    pub fn classic() -> Self {
        let v = Vec2::new;
        let light = |group, index| LightId { group, index };

        let board = vec![
            // Outer wall: left side, top arch, right side, launch lane floor
            vec![
                v(2.0, 282.0),
                v(2.0, 40.0),
                v(12.0, 18.0),
                v(30.0, 6.0),
                v(60.0, 0.0),
                v(110.0, 0.0),
                v(150.0, 6.0),
                v(175.0, 20.0),
                v(185.0, 40.0),
                v(185.0, 275.0),
                v(160.0, 275.0),
            ],
            // Launch lane divider; the top arch turns launches into the field
            vec![v(160.0, 275.0), v(160.0, 185.0)],
            // Inlane guides down to the flipper pivots
            vec![v(20.0, 222.0), v(48.0, 256.0)],
            vec![v(140.0, 222.0), v(112.0, 256.0)],
        ];

        let refuel_board = vec![vec![
            v(-132.0, 256.0),
            v(-178.0, 215.0),
            v(-178.0, 120.0),
            v(-22.0, 120.0),
            v(-22.0, 215.0),
            v(-68.0, 256.0),
        ]];

        let mut lights = Vec::new();
        for (i, pos) in [v(77.0, 51.0), v(93.0, 50.0), v(112.0, 54.0)].into_iter().enumerate() {
            lights.push((light(LightGroup::Post, i as u8), pos));
        }
        for (i, pos) in [v(11.0, 210.0), v(28.0, 210.0), v(132.0, 210.0), v(149.0, 210.0)]
            .into_iter()
            .enumerate()
        {
            lights.push((light(LightGroup::Base, i as u8), pos));
        }

        let zone = |kind, x, y, radius| ZoneSpec {
            kind,
            position: v(x, y),
            radius,
        };

        Self {
            board,
            refuel_board,
            flipper_rigs: vec![
                v(FLIPPER_X, FLIPPER_Y),
                v(FLIPPER_X + REFUEL_OFFSET_X, FLIPPER_Y - 1.0),
            ],
            bumpers: vec![v(80.0, 89.0), v(108.0, 85.0), v(89.0, 113.0)],
            slings: vec![
                SlingSpec { position: v(40.0, 224.0), side: Side::Left },
                SlingSpec { position: v(119.0, 224.0), side: Side::Right },
                SlingSpec { position: v(48.0, 128.0), side: Side::Left },
                SlingSpec { position: v(118.0, 119.0), side: Side::Right },
            ],
            posts: vec![v(103.0, 54.0), v(86.0, 48.0)],
            spinners: vec![v(14.0, 118.0), v(148.0, 110.0)],
            lights,
            kicks: vec![v(10.0, 265.0), v(149.0, 265.0)],
            asteroids: vec![v(60.0, 30.0), v(80.0, 22.0), v(100.0, 30.0)],
            doors: vec![
                DoorSpec {
                    kind: DoorKind::LeftOutlane,
                    position: v(11.0, 276.0),
                    shape: Shape::Rect { width: 18.0, height: 2.0 },
                },
                DoorSpec {
                    kind: DoorKind::RightOutlane,
                    position: v(150.0, 276.0),
                    shape: Shape::Rect { width: 20.0, height: 2.0 },
                },
                DoorSpec {
                    kind: DoorKind::Secret,
                    position: v(60.0, 175.0),
                    shape: Shape::Circle { radius: 7.0 },
                },
            ],
            zones: vec![
                zone(EntityKind::RefuelWarp, 42.0, 130.0, 5.0),
                zone(EntityKind::Hyperspace, 112.0, 150.0, 5.0),
                zone(EntityKind::AwayRamp, 30.0, 80.0, 5.0),
                zone(EntityKind::Wormhole, 130.0, 40.0, 5.0),
                zone(EntityKind::Secret, 60.0, 175.0, 4.0),
                zone(EntityKind::Button, 28.0, 88.0, 4.0),
                zone(EntityKind::DiagonalButton, 60.0, 70.0, 4.0),
                zone(EntityKind::ChuteSensor, 172.0, 215.0, 5.0),
            ],
        }
    }
}

impl Default for TableGeometry {
    fn default() -> Self {
        Self::classic()
    }
}

/// A flipper bar and its lever, as built
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlipperRig {
    pub side: Side,
    pub pivot: Vec2,
    pub bar: BodyHandle,
    pub lever: BodyHandle,
}

/// Handles of every body the table created
#[derive(Debug, Clone)]
pub struct TableLayout {
    pub ball: BodyHandle,
    pub flippers: Vec<FlipperRig>,
    pub doors: Vec<(DoorKind, BodyHandle)>,
    /// Asteroid index and body
    pub asteroids: Vec<(u8, BodyHandle)>,
    /// Spinner sensors, by index
    pub spinners: Vec<BodyHandle>,
    by_kind: HashMap<EntityKind, Vec<BodyHandle>>,
}

impl TableLayout {
    /// Create every body of `geometry` in `world`
    ///
    /// Fails if the geometry has no board boundary: the table cannot exist
    /// without it.
    pub fn build<W: RigidBodyWorld>(world: &mut W, geometry: &TableGeometry, tuning: &Tuning) -> TableResult<Self> {
        if geometry.board.iter().all(|chain| chain.len() < 2) {
            return Err(TableError::MissingGeometry { asset: "board" });
        }
        if geometry.flipper_rigs.is_empty() {
            return Err(TableError::MissingGeometry { asset: "flipper-rigs" });
        }

        let mut builder = Builder {
            world,
            by_kind: HashMap::new(),
        };

        for chain in geometry.board.iter().chain(&geometry.refuel_board) {
            if chain.len() < 2 {
                log::warn!("Skipping degenerate board chain ({} points)", chain.len());
                continue;
            }
            builder.add_static(
                Shape::Chain { points: chain.clone() },
                BodyConfig::new(EntityKind::Board, Vec2::ZERO)
                    .friction(BALL_FRICTION)
                    .filter(CollisionFilter::BOARD),
            );
        }

        let mut flippers = Vec::new();
        for origin in &geometry.flipper_rigs {
            for side in [Side::Left, Side::Right] {
                flippers.push(builder.add_flipper(side, Flipper::pivot_for(side, *origin)));
            }
        }

        for (i, pos) in geometry.bumpers.iter().enumerate() {
            let bumper = builder.add_dynamic(
                Shape::Circle { radius: BUMPER_SIZE },
                BodyConfig::new(EntityKind::Bumper(i as u8), *pos)
                    .restitution(BUMPER_RESTITUTION)
                    .friction(BALL_FRICTION)
                    .mass(BUMPER_MASS)
                    .filter(CollisionFilter::PLAYFIELD),
            );
            builder.world.create_constraint(Constraint::World {
                body: bumper,
                anchor: *pos,
                local: Vec2::ZERO,
                stiffness: BUMPER_STIFFNESS,
            });
        }

        for (i, sling) in geometry.slings.iter().enumerate() {
            // Lean the bar along the slingshot's face
            let angle = match sling.side {
                Side::Left => -0.48,
                Side::Right => 0.44,
            };
            builder.add_static(
                Shape::Rect {
                    width: SLING_SIZE.x,
                    height: SLING_SIZE.y,
                },
                BodyConfig::new(EntityKind::Sling(i as u8), sling.position).angle(angle).sensor(),
            );
        }

        for pos in &geometry.posts {
            builder.add_static(
                Shape::Circle { radius: POST_RADIUS },
                BodyConfig::new(EntityKind::Post, *pos).filter(CollisionFilter::BOARD),
            );
        }

        let spinners = geometry
            .spinners
            .iter()
            .enumerate()
            .map(|(i, pos)| builder.add_sensor(EntityKind::Spinner(i as u8), *pos, SPINNER_RADIUS))
            .collect();

        for (id, pos) in &geometry.lights {
            builder.add_sensor(EntityKind::Light(*id), *pos, LIGHT_TOGGLE_RADIUS);
        }

        for pos in &geometry.kicks {
            builder.add_sensor(EntityKind::Kick, *pos, KICK_RADIUS);
        }

        let asteroids = geometry
            .asteroids
            .iter()
            .enumerate()
            .map(|(i, pos)| {
                // Dormant until a mission opens the field
                let handle = builder.add_static(
                    Shape::Circle { radius: ASTEROID_RADIUS },
                    BodyConfig::new(EntityKind::Asteroid(i as u8), *pos)
                        .restitution(0.5)
                        .filter(CollisionFilter::PASS_THROUGH),
                );
                (i as u8, handle)
            })
            .collect();

        let doors = geometry
            .doors
            .iter()
            .map(|door| {
                let handle = builder.add_static(
                    door.shape.clone(),
                    BodyConfig::new(EntityKind::Door(door.kind), door.position),
                );
                (door.kind, handle)
            })
            .collect();

        for zone in &geometry.zones {
            builder.add_sensor(zone.kind, zone.position, zone.radius);
        }

        // Ball last so it is the newest body
        let ball = builder.add_dynamic(
            Shape::Circle { radius: BALL_RADIUS },
            BodyConfig::new(EntityKind::Ball, BALL_START)
                .mass(BALL_MASS)
                .friction(BALL_FRICTION)
                .restitution(BALL_RESTITUTION)
                .filter(CollisionFilter::BALL),
        );

        let layout = Self {
            ball,
            flippers,
            doors,
            asteroids,
            spinners,
            by_kind: builder.by_kind,
        };
        log::info!(
            "Table built: {} bodies, {} flippers, gravity {}, max speed {}",
            layout.body_count(),
            layout.flippers.len(),
            tuning.gravity,
            tuning.max_speed
        );
        Ok(layout)
    }

    /// Every body created with `kind`
    pub fn handles(&self, kind: EntityKind) -> &[BodyHandle] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// First body created with `kind`
    pub fn first(&self, kind: EntityKind) -> Option<BodyHandle> {
        self.handles(kind).first().copied()
    }

    pub fn door(&self, kind: DoorKind) -> Option<BodyHandle> {
        self.doors.iter().find(|(k, _)| *k == kind).map(|(_, h)| *h)
    }

    pub fn asteroid(&self, index: u8) -> Option<BodyHandle> {
        self.asteroids.iter().find(|(i, _)| *i == index).map(|(_, h)| *h)
    }

    pub fn body_count(&self) -> usize {
        self.by_kind.values().map(Vec::len).sum()
    }
}

struct Builder<'w, W: RigidBodyWorld> {
    world: &'w mut W,
    by_kind: HashMap<EntityKind, Vec<BodyHandle>>,
}

impl<W: RigidBodyWorld> Builder<'_, W> {
    fn record(&mut self, handle: BodyHandle, kind: EntityKind) -> BodyHandle {
        self.by_kind.entry(kind).or_default().push(handle);
        handle
    }

    fn add_static(&mut self, shape: Shape, config: BodyConfig) -> BodyHandle {
        let kind = config.label;
        let handle = self.world.create_static_body(shape, config);
        self.record(handle, kind)
    }

    fn add_dynamic(&mut self, shape: Shape, config: BodyConfig) -> BodyHandle {
        let kind = config.label;
        let handle = self.world.create_dynamic_body(shape, config);
        self.record(handle, kind)
    }

    fn add_sensor(&mut self, kind: EntityKind, position: Vec2, radius: f32) -> BodyHandle {
        self.add_static(Shape::Circle { radius }, BodyConfig::new(kind, position).sensor())
    }

    fn add_flipper(&mut self, side: Side, pivot: Vec2) -> FlipperRig {
        let (rest, _) = Flipper::angles(side);
        let (center, angle) = Flipper::bar_pose(pivot, rest);
        let bar = self.add_dynamic(
            Shape::Rect {
                width: FLIPPER_LENGTH,
                height: FLIPPER_THICKNESS,
            },
            BodyConfig::new(EntityKind::Flipper, center)
                .angle(angle)
                .mass(FLIPPER_MASS)
                .friction(BALL_FRICTION * 100.0)
                .restitution(FLIPPER_RESTITUTION)
                .filter(CollisionFilter::PLAYFIELD),
        );
        let lever = self.add_static(
            Shape::Rect { width: 1.0, height: 1.0 },
            BodyConfig::new(EntityKind::Lever, Flipper::lever_position(pivot, rest))
                .sensor()
                .filter(CollisionFilter::PASS_THROUGH),
        );
        self.world.create_constraint(Constraint::World {
            body: bar,
            anchor: pivot,
            local: Vec2::new(-FLIPPER_PIVOT_OFFSET, 0.0),
            stiffness: FLIPPER_PIN_STIFFNESS,
        });
        self.world.create_constraint(Constraint::Link {
            a: bar,
            b: lever,
            local_a: Vec2::new(FLIPPER_PIVOT_OFFSET, 0.0),
            stiffness: FLIPPER_LINK_STIFFNESS,
        });
        FlipperRig { side, pivot, bar, lever }
    }
}
