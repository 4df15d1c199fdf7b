//! Read-only table snapshot
//!
//! Everything a presentation layer needs to draw one frame, detached from the
//! world and serializable.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ball::rotation_frame;
use super::label::{DoorKind, LightGroup};
use super::state::GamePhase;
use super::table::Table;
use super::world::RigidBodyWorld;
use crate::cue::Side;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageView {
    pub text: String,
    pub expires_at: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightRow {
    pub group: String,
    pub frames: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlipperView {
    pub side: Side,
    pub pivot: Vec2,
    pub frame: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub now: f64,
    pub phase: GamePhase,
    pub score: u64,
    pub balls: u8,
    pub rank: u32,
    pub planets_reached: u32,
    pub next_planet_score: Option<u64>,
    pub travel_progress: f32,
    pub hyperspace_armed: bool,
    pub away_armed: bool,
    pub mission_open: bool,
    pub message: Option<MessageView>,
    pub lights: Vec<LightRow>,
    pub flippers: Vec<FlipperView>,
    pub spinner_frames: Vec<u8>,
    pub open_doors: Vec<DoorKind>,
    pub ball_position: Vec2,
    pub ball_frame: u8,
    pub tilted: bool,
}

impl<W: RigidBodyWorld> Table<W> {
    /// Capture the current frame
    pub fn snapshot(&self) -> TableSnapshot {
        let thresholds = &self.tuning.planet_scores;
        TableSnapshot {
            now: self.now,
            phase: self.state.phase,
            score: self.state.score,
            balls: self.state.balls,
            rank: self.state.rank,
            planets_reached: self.state.target_planet,
            next_planet_score: self.state.required_score(thresholds),
            travel_progress: self.state.travel_progress(thresholds),
            hyperspace_armed: self.state.hyperspace_armed,
            away_armed: self.state.away_armed,
            mission_open: self.state.mission_open,
            message: self.state.current_message(self.now).map(|m| MessageView {
                text: m.text.clone(),
                expires_at: m.expires_at,
            }),
            lights: LightGroup::ALL
                .iter()
                .map(|group| LightRow {
                    group: group.name().to_string(),
                    frames: self.lights.frames(*group),
                })
                .collect(),
            flippers: self
                .flippers
                .iter()
                .map(|f| FlipperView {
                    side: f.side,
                    pivot: f.pivot,
                    frame: f.frame(),
                })
                .collect(),
            spinner_frames: self.spinners.iter().map(|s| s.shown_frame()).collect(),
            open_doors: DoorKind::ALL
                .into_iter()
                .filter(|kind| self.gates.is_open(*kind))
                .collect(),
            ball_position: self.ball_position(),
            ball_frame: rotation_frame(self.world.angle(self.ball.body).unwrap_or(0.0)),
            tilted: self.ball.blocked,
        }
    }

    /// Snapshot as pretty JSON
    pub fn snapshot_json(&self) -> crate::error::TableResult<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }
}
