//! Score and mission state
//!
//! Everything the reaction handlers mutate that isn't a body or a light: score,
//! balls, rank, travel thresholds, mission flags and asteroid health.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::MESSAGE_MS;
use crate::cue::{Cue, CueQueue};
use crate::tuning::{ScoreTable, Tuning};

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Balls in play
    Playing,
    /// Clock and physics frozen
    Paused,
    /// Balls exhausted; the table no longer reacts
    GameOver,
}

/// Scoring event kinds, priced by [`ScoreTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreEvent {
    Sling,
    Bumper,
    Spinner,
    LightToggle,
    LightGroupComplete,
    Button,
    Chute,
    RefuelLoop,
    Wormhole,
    Secret,
    Hyperspace,
    HyperspaceConsolation,
    AwayMission,
    AwayConsolation,
    AsteroidHit,
    /// Last asteroid cleared; pays more the higher the rank
    MissionComplete { rank: u32 },
    /// Cosmetic, worth nothing
    Ding,
}

/// A message shown until `expires_at` (simulation ms)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub expires_at: f64,
}

/// Outcome of a registered asteroid hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsteroidOutcome {
    /// Unknown asteroid or already destroyed
    Ignored,
    Damaged { remaining: u8 },
    Destroyed,
    /// Destroyed, and it was the last one standing
    FieldCleared,
}

/// Strongly-typed game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionState {
    pub phase: GamePhase,
    pub score: u64,
    pub balls: u8,
    pub rank: u32,
    /// Index into the threshold list; `None` once every planet is reached
    pub threshold: Option<usize>,
    /// Planets reached so far
    pub target_planet: u32,
    /// Hyperspace arrow lit: the next hyperspace entry opens a mission
    pub hyperspace_armed: bool,
    /// Away-ramp arrow lit: the next ramp entry pays the away bonus
    pub away_armed: bool,
    /// Asteroid field is live
    pub mission_open: bool,
    /// Remaining hits per asteroid, floor 0
    pub asteroids: BTreeMap<u8, u8>,
    pub message: Option<Message>,
}

impl MissionState {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            phase: GamePhase::Playing,
            score: 0,
            balls: tuning.balls_per_game,
            rank: 0,
            threshold: if tuning.planet_scores.is_empty() { None } else { Some(0) },
            target_planet: 0,
            hyperspace_armed: false,
            away_armed: false,
            mission_open: false,
            asteroids: BTreeMap::new(),
            message: None,
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Add the table value of `event`. Returns the points awarded.
    pub fn earn_score(&mut self, event: ScoreEvent, scores: &ScoreTable) -> u64 {
        let points = scores.points(event);
        if points > 0 {
            self.score = self.score.saturating_add(points);
            log::debug!("+{} ({:?}) -> {}", points, event, self.score);
        }
        points
    }

    /// Score needed for the next planet, if any remain
    pub fn required_score(&self, thresholds: &[u64]) -> Option<u64> {
        self.threshold.and_then(|i| thresholds.get(i).copied())
    }

    fn previous_threshold(&self, thresholds: &[u64]) -> u64 {
        match self.threshold {
            Some(0) => 0,
            Some(i) => thresholds.get(i - 1).copied().unwrap_or(0),
            None => thresholds.last().copied().unwrap_or(0),
        }
    }

    /// Fraction of the way from the previous threshold to the next, in `[0, 1]`
    pub fn travel_progress(&self, thresholds: &[u64]) -> f32 {
        let Some(required) = self.required_score(thresholds) else {
            return 1.0;
        };
        let previous = self.previous_threshold(thresholds);
        if required <= previous {
            return 1.0;
        }
        let progress = (self.score.saturating_sub(previous)) as f64 / (required - previous) as f64;
        progress.clamp(0.0, 1.0) as f32
    }

    /// Number of thresholds passed (the mission index shown on the inner ring)
    pub fn travel_index(&self, thresholds: &[u64]) -> usize {
        self.threshold.unwrap_or(thresholds.len())
    }

    /// Advance past every threshold the score has reached
    ///
    /// Arms hyperspace and celebrates once per call that advanced, however many
    /// thresholds a single big award skipped. Returns whether anything advanced.
    pub fn update_travel_status(&mut self, thresholds: &[u64], now: f64, cues: &mut CueQueue) -> bool {
        let mut advanced = false;
        while let Some(required) = self.required_score(thresholds) {
            if self.score < required {
                break;
            }
            let next = self.threshold.map_or(0, |i| i + 1);
            self.threshold = (next < thresholds.len()).then_some(next);
            self.target_planet += 1;
            advanced = true;
        }

        if advanced {
            self.hyperspace_armed = true;
            self.show_message(format!("Planet {} reached!", self.target_planet), now);
            cues.emit(Cue::PlanetReached);
            match self.required_score(thresholds) {
                Some(next) => log::info!("Planet {} reached, next at {}", self.target_planet, next),
                None => log::info!("Planet {} reached, all thresholds passed", self.target_planet),
            }
        }
        advanced
    }

    pub fn show_message(&mut self, text: impl Into<String>, now: f64) {
        self.message = Some(Message {
            text: text.into(),
            expires_at: now + MESSAGE_MS,
        });
    }

    /// Message still on screen at `now`
    pub fn current_message(&self, now: f64) -> Option<&Message> {
        self.message.as_ref().filter(|m| now < m.expires_at)
    }

    /// Start an asteroid mission with `count` asteroids at full health
    pub fn open_mission(&mut self, count: u8, health: u8) {
        self.mission_open = true;
        self.asteroids = (0..count).map(|i| (i, health)).collect();
        log::info!("Mission opened: {} asteroids", count);
    }

    /// Register a hit on asteroid `id`
    pub fn hit_asteroid(&mut self, id: u8) -> AsteroidOutcome {
        if !self.mission_open {
            return AsteroidOutcome::Ignored;
        }
        let Some(health) = self.asteroids.get_mut(&id) else {
            return AsteroidOutcome::Ignored;
        };
        if *health == 0 {
            return AsteroidOutcome::Ignored;
        }
        *health -= 1;
        if *health > 0 {
            return AsteroidOutcome::Damaged { remaining: *health };
        }
        if self.asteroids.values().all(|h| *h == 0) {
            AsteroidOutcome::FieldCleared
        } else {
            AsteroidOutcome::Destroyed
        }
    }

    /// Close the mission and rank up. Returns the new rank.
    pub fn complete_mission(&mut self) -> u32 {
        self.mission_open = false;
        self.rank += 1;
        self.away_armed = true;
        log::info!("Mission complete, rank {}", self.rank);
        self.rank
    }

    /// Deduct one ball; never goes below zero
    pub fn lose_ball(&mut self) {
        self.balls = self.balls.saturating_sub(1);
    }
}
