//! Per-reaction debounce windows
//!
//! A reaction kind fires only if at least its window has elapsed since it last
//! fired. A suppressed event leaves no trace: it neither reacts nor moves the
//! window.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::tuning::DebounceWindows;

/// Reactions that carry their own cooldown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReactionKind {
    Bumper,
    Ding,
    Kick,
    Chute,
    Hyperspace,
    Wormhole,
    Secret,
    AwayRamp,
    RefuelWarp,
    Button,
    DiagonalButton,
    Asteroid,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 12] = [
        ReactionKind::Bumper,
        ReactionKind::Ding,
        ReactionKind::Kick,
        ReactionKind::Chute,
        ReactionKind::Hyperspace,
        ReactionKind::Wormhole,
        ReactionKind::Secret,
        ReactionKind::AwayRamp,
        ReactionKind::RefuelWarp,
        ReactionKind::Button,
        ReactionKind::DiagonalButton,
        ReactionKind::Asteroid,
    ];
}

impl DebounceWindows {
    /// Window length in ms for a reaction kind
    pub fn window(&self, kind: ReactionKind) -> f64 {
        match kind {
            ReactionKind::Bumper => self.bumper_ms,
            ReactionKind::Ding => self.ding_ms,
            ReactionKind::Kick => self.kick_ms,
            ReactionKind::Chute => self.chute_ms,
            ReactionKind::Hyperspace => self.hyperspace_ms,
            ReactionKind::Wormhole => self.wormhole_ms,
            ReactionKind::Secret => self.secret_ms,
            ReactionKind::AwayRamp => self.away_ramp_ms,
            ReactionKind::RefuelWarp => self.refuel_warp_ms,
            ReactionKind::Button => self.button_ms,
            ReactionKind::DiagonalButton => self.diagonal_button_ms,
            ReactionKind::Asteroid => self.asteroid_ms,
        }
    }
}

/// Last-fired timestamps, one per reaction kind
#[derive(Debug, Clone)]
pub struct Debouncer {
    windows: DebounceWindows,
    last: HashMap<ReactionKind, f64>,
}

impl Debouncer {
    pub fn new(windows: DebounceWindows) -> Self {
        Self {
            windows,
            last: HashMap::new(),
        }
    }

    /// Would `kind` fire at `now`?
    pub fn ready(&self, kind: ReactionKind, now: f64) -> bool {
        match self.last.get(&kind) {
            Some(last) => now - last >= self.windows.window(kind),
            None => true,
        }
    }

    /// Fire `kind` at `now` if its window has elapsed. Records the time only on success.
    pub fn try_fire(&mut self, kind: ReactionKind, now: f64) -> bool {
        if !self.ready(kind, now) {
            log::trace!("{:?} debounced at {:.0}", kind, now);
            return false;
        }
        self.last.insert(kind, now);
        true
    }
}
