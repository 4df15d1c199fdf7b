//! Spinners
//!
//! A spinner is only a sensor zone plus this bit of state. An impact spins it
//! up in proportion to the ball's vertical speed, it decays every frame, and
//! each pass through frame zero clicks. A spinner already turning fast is not
//! spun up again, and it scores once per spin-up.

use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

/// Number of animation frames in one revolution
pub const SPINNER_FRAMES: f32 = 5.0;

/// What a frame update produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpinnerTick {
    /// Crossed into frame zero
    pub click: bool,
    /// First click of this spin-up
    pub award: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Spinner {
    /// Signed angular speed (frames per 10 ticks)
    pub speed: f32,
    /// Fractional frame position in `[0, SPINNER_FRAMES)`
    pub frame: f32,
    shown: u8,
    played_sound: bool,
    awarded: bool,
}

impl Spinner {
    /// Ball hit with vertical velocity `vy`. Returns false if the spinner is
    /// still turning too fast to be spun again.
    pub fn hit(&mut self, vy: f32, tuning: &Tuning) -> bool {
        if self.speed.abs() >= tuning.spinner_retrigger_speed {
            return false;
        }
        self.speed = vy * tuning.spinner_speed_factor;
        self.awarded = false;
        true
    }

    /// Advance one frame
    pub fn update(&mut self, tuning: &Tuning) -> SpinnerTick {
        let mut tick = SpinnerTick::default();
        if self.speed.abs() <= tuning.spinner_stop_speed {
            self.speed = 0.0;
            return tick;
        }

        self.frame = (self.frame + self.speed / 10.0).rem_euclid(SPINNER_FRAMES);
        if self.frame >= SPINNER_FRAMES {
            // rem_euclid rounds tiny negatives up to the modulus
            self.frame = 0.0;
        }
        self.speed *= tuning.spinner_decay;

        let shown = (self.frame.floor() as u8).min(SPINNER_FRAMES as u8 - 1);
        if shown != self.shown {
            self.shown = shown;
            self.played_sound = false;
        }
        if shown == 0 && !self.played_sound {
            self.played_sound = true;
            tick.click = true;
            if !self.awarded {
                self.awarded = true;
                tick.award = true;
            }
        }
        tick
    }

    /// Sprite frame currently shown
    pub fn shown_frame(&self) -> u8 {
        self.shown
    }

    pub fn is_spinning(&self) -> bool {
        self.speed != 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spin_down(spinner: &mut Spinner, tuning: &Tuning) -> (usize, usize) {
        let mut clicks = 0;
        let mut awards = 0;
        for _ in 0..2000 {
            let tick = spinner.update(tuning);
            clicks += tick.click as usize;
            awards += tick.award as usize;
            if !spinner.is_spinning() {
                break;
            }
        }
        (clicks, awards)
    }

    #[test]
    fn test_spin_decays_to_rest() {
        let tuning = Tuning::default();
        let mut spinner = Spinner::default();
        assert!(spinner.hit(-6.0, &tuning));
        let (clicks, awards) = spin_down(&mut spinner, &tuning);
        assert!(!spinner.is_spinning());
        assert!(clicks > 1);
        assert_eq!(awards, 1);
    }

    #[test]
    fn test_fast_spinner_ignores_hits() {
        let tuning = Tuning::default();
        let mut spinner = Spinner::default();
        assert!(spinner.hit(5.0, &tuning));
        assert!(!spinner.hit(-8.0, &tuning));
        assert_eq!(spinner.speed, 20.0);
    }

    #[test]
    fn test_slow_spinner_can_be_hit_again() {
        let tuning = Tuning::default();
        let mut spinner = Spinner::default();
        spinner.hit(0.1, &tuning);
        assert!(spinner.hit(3.0, &tuning));
    }

    #[test]
    fn test_frame_stays_in_range() {
        let tuning = Tuning::default();
        let mut spinner = Spinner::default();
        spinner.hit(-9.0, &tuning);
        for _ in 0..100 {
            spinner.update(&tuning);
            assert!(spinner.frame >= 0.0 && spinner.frame < SPINNER_FRAMES);
            assert!(spinner.shown_frame() < 5);
        }
    }
}
