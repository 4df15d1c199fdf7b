//! Table tuning and presets
//!
//! Every empirically tuned literal of the table lives here: debounce windows,
//! forces, delays, score values and thresholds. A tuning document is versioned
//! JSON; missing keys fall back to the Classic preset, so a partial document
//! can override just the values you care about.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{TableError, TableResult};
use crate::sim::ScoreEvent;

/// Current tuning document format
pub const TUNING_VERSION: u32 = 1;

/// Named tuning presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TablePreset {
    #[default]
    Classic,
    /// Short charge, near-instant warps and resets for poking at the table
    Debug,
}

impl TablePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            TablePreset::Classic => "Classic",
            TablePreset::Debug => "Debug",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" => Some(TablePreset::Classic),
            "debug" | "dev" => Some(TablePreset::Debug),
            _ => None,
        }
    }

    /// Parse a preset name, reporting unknown names as an error
    pub fn parse(s: &str) -> TableResult<Self> {
        Self::from_str(s).ok_or_else(|| TableError::UnknownPreset {
            name: s.to_string(),
        })
    }
}

/// Minimum spacing between two firings of the same reaction kind
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceWindows {
    pub bumper_ms: f64,
    pub ding_ms: f64,
    pub kick_ms: f64,
    pub chute_ms: f64,
    pub hyperspace_ms: f64,
    pub wormhole_ms: f64,
    pub secret_ms: f64,
    pub away_ramp_ms: f64,
    pub refuel_warp_ms: f64,
    pub button_ms: f64,
    pub diagonal_button_ms: f64,
    pub asteroid_ms: f64,
}

impl Default for DebounceWindows {
    fn default() -> Self {
        Self {
            bumper_ms: 10.0,
            ding_ms: 90.0,
            kick_ms: 1000.0,
            chute_ms: 1000.0,
            hyperspace_ms: 3000.0,
            wormhole_ms: 1500.0,
            secret_ms: 3000.0,
            away_ramp_ms: 2000.0,
            refuel_warp_ms: 3000.0,
            button_ms: 2000.0,
            diagonal_button_ms: 2000.0,
            asteroid_ms: 250.0,
        }
    }
}

/// Base point values per scoring event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreTable {
    pub sling: u64,
    pub bumper: u64,
    pub spinner: u64,
    pub light_toggle: u64,
    pub light_group_complete: u64,
    pub button: u64,
    pub chute: u64,
    pub refuel_loop: u64,
    pub wormhole: u64,
    pub secret: u64,
    pub hyperspace: u64,
    pub hyperspace_consolation: u64,
    pub away_mission: u64,
    pub away_consolation: u64,
    pub asteroid_hit: u64,
    /// Multiplied by the rank reached when the last asteroid falls
    pub mission_complete: u64,
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self {
            sling: 50,
            bumper: 100,
            spinner: 200,
            light_toggle: 25,
            light_group_complete: 1000,
            button: 250,
            chute: 500,
            refuel_loop: 750,
            wormhole: 1500,
            secret: 3000,
            hyperspace: 5000,
            hyperspace_consolation: 500,
            away_mission: 4000,
            away_consolation: 500,
            asteroid_hit: 300,
            mission_complete: 10000,
        }
    }
}

impl ScoreTable {
    /// Base points for an event (zero for purely cosmetic events)
    pub fn points(&self, event: ScoreEvent) -> u64 {
        match event {
            ScoreEvent::Sling => self.sling,
            ScoreEvent::Bumper => self.bumper,
            ScoreEvent::Spinner => self.spinner,
            ScoreEvent::LightToggle => self.light_toggle,
            ScoreEvent::LightGroupComplete => self.light_group_complete,
            ScoreEvent::Button => self.button,
            ScoreEvent::Chute => self.chute,
            ScoreEvent::RefuelLoop => self.refuel_loop,
            ScoreEvent::Wormhole => self.wormhole,
            ScoreEvent::Secret => self.secret,
            ScoreEvent::Hyperspace => self.hyperspace,
            ScoreEvent::HyperspaceConsolation => self.hyperspace_consolation,
            ScoreEvent::AwayMission => self.away_mission,
            ScoreEvent::AwayConsolation => self.away_consolation,
            ScoreEvent::AsteroidHit => self.asteroid_hit,
            ScoreEvent::MissionComplete { rank } => self.mission_complete * rank.max(1) as u64,
            ScoreEvent::Ding => 0,
        }
    }
}

/// "Teleport with a wind-up": hold the ball, then fire it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MissionLaunch {
    /// How long the ball is held still before launch
    pub hold_ms: f64,
    /// Launch direction (degrees, screen space)
    pub angle_deg: f32,
    pub force: f32,
    /// Optional exit point the ball is moved to before firing
    pub exit: Option<Vec2>,
}

/// Complete table tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub version: u32,
    pub preset: TablePreset,

    // === World ===
    /// Fixed step length (ms)
    pub step_ms: f64,
    /// Downward gravity, in the integrator's units
    pub gravity: f32,

    // === Ball ===
    /// Per-axis velocity cap
    pub max_speed: f32,
    pub balls_per_game: u8,
    /// Losing the ball sooner than this after launch saves it
    pub ball_save_ms: f64,
    /// Delay between "ball lost" message and the reset
    pub ball_reset_delay_ms: f64,
    pub plunge_max_ms: f64,
    /// Extra time on top of `plunge_max_ms` before the plunger auto-releases
    pub plunge_safety_ms: f64,
    pub plunge_force_divisor: f32,
    /// Plunges stronger than this shake the camera
    pub plunge_shake_threshold: f32,
    pub warp_fade_ms: f64,
    pub warp_gap_ms: f64,
    pub warp_settle_ms: f64,
    /// Ball sleeps this long after an instant warp
    pub wake_delay_ms: f64,
    pub tilt_force: f32,
    pub tilts_per_ball: u8,

    // === Reactions ===
    pub sling_force: f32,
    pub sling_delay_ms: f64,
    pub sling_left_deg: f32,
    pub sling_right_deg: f32,
    pub flash_ms: f64,
    pub bumper_sound_min_speed: f32,
    pub ding_min_speed: f32,
    pub kick_delay_ms: f64,
    pub kick_force: f32,
    pub kicker_pulse_ms: f64,
    pub chute_force: f32,
    /// Spinners already turning faster than this ignore new contacts
    pub spinner_retrigger_speed: f32,
    pub spinner_speed_factor: f32,
    pub spinner_decay: f32,
    pub spinner_stop_speed: f32,
    pub spinner_nudge: f32,
    pub spinner_boost: f32,
    pub spinner_boost_ms: f64,
    pub light_reset_delay_ms: f64,
    pub button_hit_cap: u8,
    pub button_effect_every: u8,
    pub asteroid_min_speed: f32,
    pub asteroid_health: u8,
    pub flipper_duration_ms: f64,

    // === Missions ===
    /// Ascending score thresholds, one per planet
    pub planet_scores: Vec<u64>,
    pub hyperspace_launch: MissionLaunch,
    pub away_launch: MissionLaunch,
    pub secret_launch: MissionLaunch,
    pub wormhole_launch: MissionLaunch,

    pub debounce: DebounceWindows,
    pub scores: ScoreTable,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            version: TUNING_VERSION,
            preset: TablePreset::Classic,

            step_ms: crate::consts::STEP_MS,
            gravity: 0.5,

            max_speed: 11.0,
            balls_per_game: 3,
            ball_save_ms: 10000.0,
            ball_reset_delay_ms: 1500.0,
            plunge_max_ms: 2000.0,
            plunge_safety_ms: 1000.0,
            plunge_force_divisor: 8.0,
            plunge_shake_threshold: 0.06,
            warp_fade_ms: 500.0,
            warp_gap_ms: 50.0,
            warp_settle_ms: 500.0,
            wake_delay_ms: 50.0,
            tilt_force: 0.01,
            tilts_per_ball: 3,

            sling_force: 0.035,
            sling_delay_ms: 10.0,
            sling_left_deg: -45.0,
            sling_right_deg: 215.0,
            flash_ms: 150.0,
            bumper_sound_min_speed: 0.5,
            ding_min_speed: 0.5,
            kick_delay_ms: 500.0,
            kick_force: 0.06,
            kicker_pulse_ms: 120.0,
            chute_force: 0.02,
            spinner_retrigger_speed: 0.5,
            spinner_speed_factor: 4.0,
            spinner_decay: 0.98,
            spinner_stop_speed: 0.1,
            spinner_nudge: 0.1,
            spinner_boost: 0.0055,
            spinner_boost_ms: 50.0,
            light_reset_delay_ms: 1500.0,
            button_hit_cap: 9,
            button_effect_every: 3,
            asteroid_min_speed: 2.0,
            asteroid_health: 3,
            flipper_duration_ms: 52.0,

            planet_scores: vec![10000, 20000, 30000, 40000, 50000, 60000, 70000],
            hyperspace_launch: MissionLaunch {
                hold_ms: 1500.0,
                angle_deg: -66.0,
                force: 0.075,
                exit: None,
            },
            away_launch: MissionLaunch {
                hold_ms: 1500.0,
                angle_deg: -120.0,
                force: 0.085,
                exit: None,
            },
            secret_launch: MissionLaunch {
                hold_ms: 2000.0,
                angle_deg: -100.0,
                force: 0.075,
                exit: None,
            },
            wormhole_launch: MissionLaunch {
                hold_ms: 1000.0,
                angle_deg: 0.0,
                force: 0.025,
                exit: Some(Vec2::new(12.0, 60.0)),
            },

            debounce: DebounceWindows::default(),
            scores: ScoreTable::default(),
        }
    }
}

impl Tuning {
    /// Create tuning from a preset (applies preset defaults)
    pub fn from_preset(preset: TablePreset) -> Self {
        let mut tuning = Self::default();
        tuning.apply_preset(preset);
        tuning
    }

    /// Apply a preset on top of the current values
    pub fn apply_preset(&mut self, preset: TablePreset) {
        self.preset = preset;

        if preset == TablePreset::Debug {
            self.plunge_max_ms = 500.0;
            self.warp_fade_ms = 10.0;
            self.ball_reset_delay_ms = 1.0;
        }
    }

    /// Load a tuning document; absent keys keep their Classic values
    pub fn from_json(json: &str) -> TableResult<Self> {
        let tuning: Tuning = serde_json::from_str(json)?;
        if tuning.version != TUNING_VERSION {
            return Err(TableError::UnsupportedVersion {
                found: tuning.version,
                expected: TUNING_VERSION,
            });
        }
        tuning.validate()?;
        log::info!("Loaded tuning (preset {})", tuning.preset.as_str());
        Ok(tuning)
    }

    /// Load a tuning document from disk
    pub fn from_file(path: impl AsRef<Path>) -> TableResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| TableError::TuningRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Serialize to a pretty tuning document
    pub fn to_json(&self) -> TableResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the table cannot run with
    pub fn validate(&self) -> TableResult<()> {
        if !(self.step_ms > 0.0) {
            return Err(TableError::InvalidTuning {
                name: "step_ms",
                reason: "must be positive",
            });
        }
        if !(self.max_speed > 0.0) {
            return Err(TableError::InvalidTuning {
                name: "max_speed",
                reason: "must be positive",
            });
        }
        if !(self.plunge_max_ms > 0.0) || !(self.plunge_force_divisor > 0.0) {
            return Err(TableError::InvalidTuning {
                name: "plunge_max_ms",
                reason: "plunge charge and divisor must be positive",
            });
        }
        if self.planet_scores.is_empty() {
            return Err(TableError::InvalidTuning {
                name: "planet_scores",
                reason: "needs at least one threshold",
            });
        }
        if self.planet_scores.windows(2).any(|w| w[0] >= w[1]) {
            return Err(TableError::InvalidTuning {
                name: "planet_scores",
                reason: "thresholds must be strictly ascending",
            });
        }
        if self.button_effect_every == 0 {
            return Err(TableError::InvalidTuning {
                name: "button_effect_every",
                reason: "must be at least 1",
            });
        }
        if self.button_hit_cap == 0 {
            return Err(TableError::InvalidTuning {
                name: "button_hit_cap",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }

    /// Total time a choreographed warp takes before its completion fires
    pub fn choreographed_warp_ms(&self) -> f64 {
        self.warp_fade_ms + self.warp_gap_ms + self.warp_fade_ms + self.warp_settle_ms
    }
}
