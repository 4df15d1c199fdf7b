//! Light matrix
//!
//! Each light group is a fixed-length row of tri-state lights. Toggle zones
//! flip single lights, the travel rings are recomputed from score progress and
//! flipper presses chase the base/post rows around.

use serde::{Deserialize, Serialize};

use super::label::{LightGroup, LightId};
use crate::consts::BLINK_PERIOD_MS;
use crate::wrap_index;

/// Light value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LightValue {
    #[default]
    Off,
    On,
    Blinking,
}

impl LightValue {
    pub fn is_lit(&self) -> bool {
        *self != LightValue::Off
    }

    /// Numeric form used by the presentation layer (0, 1 or 2)
    pub fn code(&self) -> u8 {
        match self {
            LightValue::Off => 0,
            LightValue::On => 1,
            LightValue::Blinking => 2,
        }
    }
}

/// Result of a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Toggled,
    /// Every light in the group is lit; the caller schedules the reset
    GroupComplete,
}

/// All light groups, indexed by `LightGroup::slot`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightMatrix {
    rows: [Vec<LightValue>; 4],
    /// Groups whose completion reset is already scheduled
    pending_reset: [bool; 4],
    /// Blinking lights are currently drawn lit
    blink_visible: bool,
}

impl Default for LightMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl LightMatrix {
    pub fn new() -> Self {
        Self {
            rows: LightGroup::ALL.map(|g| vec![LightValue::Off; g.len()]),
            pending_reset: [false; 4],
            blink_visible: false,
        }
    }

    pub fn row(&self, group: LightGroup) -> &[LightValue] {
        &self.rows[group.slot()]
    }

    pub fn get(&self, id: LightId) -> LightValue {
        self.rows[id.group.slot()]
            .get(id.index as usize)
            .copied()
            .unwrap_or_default()
    }

    /// Flip one light between off and on. A blinking light turns off.
    pub fn toggle(&mut self, id: LightId) -> ToggleOutcome {
        let slot = id.group.slot();
        if let Some(light) = self.rows[slot].get_mut(id.index as usize) {
            *light = match light {
                LightValue::Off => LightValue::On,
                LightValue::On | LightValue::Blinking => LightValue::Off,
            };
        }

        if !self.pending_reset[slot] && self.rows[slot].iter().all(LightValue::is_lit) {
            self.pending_reset[slot] = true;
            log::debug!("{} complete", id.group.name());
            return ToggleOutcome::GroupComplete;
        }
        ToggleOutcome::Toggled
    }

    /// Turn a whole group off and re-arm its completion check
    pub fn reset_group(&mut self, group: LightGroup) {
        let slot = group.slot();
        self.rows[slot].fill(LightValue::Off);
        self.pending_reset[slot] = false;
    }

    /// Recompute the travel rings
    ///
    /// The outer ring blinks at the current fractional position, solid below
    /// it and off above. The inner ring does the same for the mission index.
    pub fn update_travel_lights(&mut self, progress: f32, mission_index: usize) {
        let n = (progress.clamp(0.0, 1.0) * LightGroup::OuterCircle.len() as f32)
            % LightGroup::OuterCircle.len() as f32;
        fill_ring(&mut self.rows[LightGroup::OuterCircle.slot()], n);
        fill_ring(&mut self.rows[LightGroup::InnerCircle.slot()], mission_index as f32);
    }

    /// Chase the rotatable rows one step; `-1` for the left flipper, `+1` for the right
    pub fn flip_lights(&mut self, direction: isize) {
        for group in LightGroup::ALL.into_iter().filter(LightGroup::rotates_on_flip) {
            let row = &mut self.rows[group.slot()];
            let before = row.clone();
            let len = before.len();
            for (i, light) in row.iter_mut().enumerate() {
                *light = before[wrap_index(i as isize + direction, len)];
            }
        }
    }

    /// Per-frame blink phase, independent of frame rate
    pub fn update(&mut self, now: f64) {
        self.blink_visible = now.rem_euclid(BLINK_PERIOD_MS) > BLINK_PERIOD_MS / 2.0;
    }

    /// Sprite frame (0 dark, 1 lit) for every light of a group
    pub fn frames(&self, group: LightGroup) -> Vec<u8> {
        self.row(group)
            .iter()
            .map(|v| match v {
                LightValue::Off => 0,
                LightValue::On => 1,
                LightValue::Blinking => u8::from(self.blink_visible),
            })
            .collect()
    }
}

fn fill_ring(row: &mut [LightValue], n: f32) {
    let cursor = n.floor();
    for (i, light) in row.iter_mut().enumerate() {
        let i = i as f32;
        *light = if i == cursor {
            LightValue::Blinking
        } else if i < n {
            LightValue::On
        } else {
            LightValue::Off
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn base(index: u8) -> LightId {
        LightId {
            group: LightGroup::Base,
            index,
        }
    }

    #[test]
    fn test_group_lengths_are_fixed() {
        let mut lights = LightMatrix::new();
        lights.update_travel_lights(0.7, 3);
        lights.flip_lights(1);
        for group in LightGroup::ALL {
            assert_eq!(lights.row(group).len(), group.len());
        }
    }

    #[test]
    fn test_completion_reported_once() {
        let mut lights = LightMatrix::new();
        assert_eq!(lights.toggle(base(0)), ToggleOutcome::Toggled);
        assert_eq!(lights.toggle(base(1)), ToggleOutcome::Toggled);
        assert_eq!(lights.toggle(base(2)), ToggleOutcome::Toggled);
        assert_eq!(lights.toggle(base(3)), ToggleOutcome::GroupComplete);

        // Still complete after an off/on flicker, but the reset is already pending
        lights.toggle(base(3));
        assert_eq!(lights.toggle(base(3)), ToggleOutcome::Toggled);

        lights.reset_group(LightGroup::Base);
        assert!(lights.row(LightGroup::Base).iter().all(|v| *v == LightValue::Off));
    }

    #[test]
    fn test_travel_rings() {
        let mut lights = LightMatrix::new();
        // 16 * 0.25 = 4: lights 0..4 solid, 4 blinking
        lights.update_travel_lights(0.25, 2);
        let outer: Vec<u8> = lights.row(LightGroup::OuterCircle).iter().map(|v| v.code()).collect();
        assert_eq!(&outer[..6], &[1, 1, 1, 1, 2, 0]);
        let inner: Vec<u8> = lights.row(LightGroup::InnerCircle).iter().map(|v| v.code()).collect();
        assert_eq!(inner, vec![1, 1, 2, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_flip_lights_rotates_base_and_post_only() {
        let mut lights = LightMatrix::new();
        lights.toggle(base(0));
        lights.update_travel_lights(0.0, 0);
        let inner_before = lights.row(LightGroup::InnerCircle).to_vec();

        // Left flipper: each light takes its left neighbour's value
        lights.flip_lights(-1);
        assert_eq!(lights.get(base(1)), LightValue::On);
        assert_eq!(lights.get(base(0)), LightValue::Off);
        lights.flip_lights(1);
        assert_eq!(lights.get(base(0)), LightValue::On);
        assert_eq!(lights.row(LightGroup::InnerCircle), inner_before.as_slice());
    }

    #[test]
    fn test_blink_follows_clock() {
        let mut lights = LightMatrix::new();
        lights.update_travel_lights(0.0, 0);
        lights.update(250.0);
        assert_eq!(lights.frames(LightGroup::OuterCircle)[0], 0);
        lights.update(1750.0);
        assert_eq!(lights.frames(LightGroup::OuterCircle)[0], 1);
    }

    proptest! {
        #[test]
        fn test_even_toggles_restore_pattern(
            initial in prop::collection::vec(any::<bool>(), 4),
            pairs in 0usize..6,
        ) {
            let mut lights = LightMatrix::new();
            // Leave at least one light off so the group never completes
            for (i, on) in initial.iter().enumerate().take(3) {
                if *on {
                    lights.toggle(base(i as u8));
                }
            }
            let before = lights.row(LightGroup::Base).to_vec();
            for _ in 0..pairs * 2 {
                lights.toggle(base(0));
            }
            prop_assert_eq!(lights.row(LightGroup::Base), before.as_slice());
        }
    }
}
