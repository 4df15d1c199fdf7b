//! Audio/visual cue requests
//!
//! The table never plays sounds or draws sprites itself. Reactions push named
//! cues into a queue and the presentation layer drains it once per rendered
//! frame. Cues are fire-and-forget: nothing waits for an acknowledgment.

use serde::{Deserialize, Serialize};

/// Which side of the table something happened on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

/// Cue identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cue {
    // === Sounds ===
    /// Ball hits a bumper
    BumperHit,
    /// Ball clips the board, a post or a flipper
    Ding,
    /// Slingshot fires
    Sling,
    /// Spinner passes its zero frame, plunger starts charging
    Click,
    /// Plunger released
    Plunger,
    /// Flipper actuated
    Flipper,
    /// Ball fired out of a hole
    KickBall,
    BallSaved,
    BallLost,
    Tilt,
    /// Consolation from an unarmed mission sensor
    Consolation,
    MissionStart,
    MissionComplete,
    /// Score threshold crossed
    PlanetReached,
    LightGroupComplete,
    AsteroidHit,
    AsteroidDestroyed,
    DoorOpen,

    // === Visuals ===
    /// Light up bumper `n` for the cue's duration
    BumperFlash(u8),
    /// Show slingshot `n` fired for the cue's duration
    SlingFlash(u8),
    /// Pop the out-lane kicker on a side
    Kicker(Side),
    CameraShake,
    FadeOut,
    FadeIn,
    /// Re-center the camera on the ball after a warp
    CameraRecenter,
    PlungerPull,
    PlungerRelease,

    // === Scene ===
    StopMusic,
    /// Hand control back to the menu collaborator
    ShowMenu,
}

impl Cue {
    /// Stable name used by the presentation layer's asset tables
    pub fn name(&self) -> &'static str {
        match self {
            Cue::BumperHit => "bumper-hit",
            Cue::Ding => "ding",
            Cue::Sling => "sling",
            Cue::Click => "click",
            Cue::Plunger => "plunger",
            Cue::Flipper => "flipper",
            Cue::KickBall => "kick-ball",
            Cue::BallSaved => "ball-saved",
            Cue::BallLost => "ball-lost",
            Cue::Tilt => "tilt",
            Cue::Consolation => "consolation",
            Cue::MissionStart => "mission-start",
            Cue::MissionComplete => "mission-complete",
            Cue::PlanetReached => "planet-reached",
            Cue::LightGroupComplete => "light-group-complete",
            Cue::AsteroidHit => "asteroid-hit",
            Cue::AsteroidDestroyed => "asteroid-destroyed",
            Cue::DoorOpen => "door-open",
            Cue::BumperFlash(_) => "bumper-flash",
            Cue::SlingFlash(_) => "sling-flash",
            Cue::Kicker(_) => "kicker",
            Cue::CameraShake => "camera-shake",
            Cue::FadeOut => "fade-out",
            Cue::FadeIn => "fade-in",
            Cue::CameraRecenter => "camera-recenter",
            Cue::PlungerPull => "plunger-pull",
            Cue::PlungerRelease => "plunger-release",
            Cue::StopMusic => "stop-music",
            Cue::ShowMenu => "show-menu",
        }
    }
}

/// A cue plus its optional playback parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueRequest {
    pub cue: Cue,
    pub volume: Option<f32>,
    pub rate: Option<f32>,
    pub duration_ms: Option<f64>,
}

impl CueRequest {
    pub fn new(cue: Cue) -> Self {
        Self {
            cue,
            volume: None,
            rate: None,
            duration_ms: None,
        }
    }

    pub fn volume(mut self, volume: f32) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn rate(mut self, rate: f32) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn duration(mut self, ms: f64) -> Self {
        self.duration_ms = Some(ms);
        self
    }
}

impl From<Cue> for CueRequest {
    fn from(cue: Cue) -> Self {
        CueRequest::new(cue)
    }
}

/// Outbox of cue requests, drained by the presentation layer
#[derive(Debug, Clone, Default)]
pub struct CueQueue {
    pending: Vec<CueRequest>,
}

impl CueQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a cue
    pub fn emit(&mut self, request: impl Into<CueRequest>) {
        let request = request.into();
        log::trace!("cue {}", request.cue.name());
        self.pending.push(request);
    }

    /// Take every pending cue, oldest first
    pub fn drain(&mut self) -> Vec<CueRequest> {
        std::mem::take(&mut self.pending)
    }

    /// Peek at pending cues without consuming them
    pub fn pending(&self) -> &[CueRequest] {
        &self.pending
    }

    /// Number of pending requests for a given cue
    pub fn count(&self, cue: Cue) -> usize {
        self.pending.iter().filter(|r| r.cue == cue).count()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
