//! Entity labels
//!
//! Every body in the world carries exactly one `EntityKind`, fixed when the body
//! is created. The router classifies contacts by matching on it, so adding a
//! kind forces every dispatch site to decide what to do with it.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{TableError, TableResult};

/// Named light groups. Lengths are fixed for the life of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LightGroup {
    /// Three lights over the top posts
    Post,
    /// Four lights across the in/out lanes
    Base,
    /// Mission index ring
    InnerCircle,
    /// Travel progress ring
    OuterCircle,
}

impl LightGroup {
    pub const ALL: [LightGroup; 4] = [
        LightGroup::Post,
        LightGroup::Base,
        LightGroup::InnerCircle,
        LightGroup::OuterCircle,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LightGroup::Post => "post-light",
            LightGroup::Base => "base-light",
            LightGroup::InnerCircle => "inner-circle-light",
            LightGroup::OuterCircle => "outer-circle-light",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        LightGroup::ALL.into_iter().find(|g| g.name() == name)
    }

    /// Number of lights in the group
    pub fn len(&self) -> usize {
        match self {
            LightGroup::Post => 3,
            LightGroup::Base => 4,
            LightGroup::InnerCircle => 8,
            LightGroup::OuterCircle => 16,
        }
    }

    /// Stable slot for array storage
    pub fn slot(&self) -> usize {
        match self {
            LightGroup::Post => 0,
            LightGroup::Base => 1,
            LightGroup::InnerCircle => 2,
            LightGroup::OuterCircle => 3,
        }
    }

    /// Groups that chase around when a flipper fires
    pub fn rotates_on_flip(&self) -> bool {
        matches!(self, LightGroup::Post | LightGroup::Base)
    }
}

/// One light inside a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LightId {
    pub group: LightGroup,
    pub index: u8,
}

impl LightId {
    /// Parse a `group:index` label, e.g. `base-light:2`
    pub fn parse(label: &str) -> TableResult<Self> {
        let bad = || TableError::BadLightLabel {
            label: label.to_string(),
        };
        let (name, index) = label.split_once(':').ok_or_else(bad)?;
        let group = LightGroup::from_name(name).ok_or_else(bad)?;
        let index: usize = index.parse().map_err(|_| bad())?;
        if index >= group.len() {
            return Err(TableError::LightIndexOutOfRange {
                group: group.name(),
                index,
                len: group.len(),
            });
        }
        Ok(Self {
            group,
            index: index as u8,
        })
    }
}

impl fmt::Display for LightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group.name(), self.index)
    }
}

/// Gates whose collision filter toggles between blocking and pass-through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DoorKind {
    LeftOutlane,
    RightOutlane,
    /// Covers the secret hole until the button opens it
    Secret,
}

impl DoorKind {
    pub const ALL: [DoorKind; 3] = [DoorKind::LeftOutlane, DoorKind::RightOutlane, DoorKind::Secret];

    pub fn name(&self) -> &'static str {
        match self {
            DoorKind::LeftOutlane => "door-left-outlane",
            DoorKind::RightOutlane => "door-right-outlane",
            DoorKind::Secret => "door-secret",
        }
    }
}

/// Semantic kind of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Ball,
    /// Static boundary parts
    Board,
    Flipper,
    /// Invisible sensor that drags a flipper around
    Lever,
    Bumper(u8),
    Sling(u8),
    Spinner(u8),
    Post,
    /// One-way out-lane kicker sensor
    Kick,
    Button,
    DiagonalButton,
    Asteroid(u8),
    RefuelWarp,
    Hyperspace,
    ChuteSensor,
    Wormhole,
    Secret,
    AwayRamp,
    Door(DoorKind),
    Light(LightId),
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Ball => write!(f, "ball"),
            EntityKind::Board => write!(f, "board"),
            EntityKind::Flipper => write!(f, "flipper"),
            EntityKind::Lever => write!(f, "lever"),
            EntityKind::Bumper(i) => write!(f, "bumper-{}", i),
            EntityKind::Sling(i) => write!(f, "sling-{}", i),
            EntityKind::Spinner(i) => write!(f, "spinner-{}", i),
            EntityKind::Post => write!(f, "post"),
            EntityKind::Kick => write!(f, "kick"),
            EntityKind::Button => write!(f, "button"),
            EntityKind::DiagonalButton => write!(f, "diagonal-button"),
            EntityKind::Asteroid(i) => write!(f, "asteroid-{}", i),
            EntityKind::RefuelWarp => write!(f, "refuel-warp"),
            EntityKind::Hyperspace => write!(f, "hyperspace"),
            EntityKind::ChuteSensor => write!(f, "chute-sensor"),
            EntityKind::Wormhole => write!(f, "wormhole"),
            EntityKind::Secret => write!(f, "secret"),
            EntityKind::AwayRamp => write!(f, "away-ramp"),
            EntityKind::Door(door) => write!(f, "{}", door.name()),
            EntityKind::Light(id) => write!(f, "{}", id),
        }
    }
}
