//! Colon neon breathing.
//!
//! A triangle wave on the colon's PWM pin: the level ramps up in fixed steps
//! to full scale, turns around, ramps down to zero and turns around again.

use crate::interval::{Interval, Millis};

/// Time between level changes.
pub const COLON_INTERVAL_MS: Millis = 30;

/// Level change per tick.
pub const COLON_STEP: i16 = 5;

/// Full scale of the colon PWM.
pub const COLON_MAX: u8 = 255;

pub struct ColonFader {
    level: i16,
    step: i16,
    timer: Interval,
}

impl Default for ColonFader {
    fn default() -> Self {
        Self::new()
    }
}

impl ColonFader {
    /// Dark and rising, as at power on.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            level: 0,
            step: COLON_STEP,
            timer: Interval::new(COLON_INTERVAL_MS),
        }
    }

    #[must_use]
    pub fn level(&self) -> u8 {
        self.level as u8
    }

    #[must_use]
    pub fn is_rising(&self) -> bool {
        self.step > 0
    }

    /// Move one step if the interval has passed, returning the new level to
    /// write to the pin.
    pub fn advance(&mut self, now: Millis) -> Option<u8> {
        if !self.timer.fire(now) {
            return None;
        }
        self.level = (self.level + self.step).clamp(0, i16::from(COLON_MAX));
        if self.level >= i16::from(COLON_MAX) || self.level <= 0 {
            self.step = -self.step;
        }
        Some(self.level())
    }
}


#[cfg(all(test, not(target_arch = "avr")))]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn level_never_leaves_range(gaps in proptest::collection::vec(0u32..100, 1..600)) {
            let mut fader = ColonFader::new();
            let mut now: Millis = 0;
            let mut prev = fader.level();
            for gap in gaps {
                now = now.wrapping_add(gap);
                if let Some(level) = fader.advance(now) {
                    prop_assert!(level.abs_diff(prev) <= COLON_STEP as u8);
                    prev = level;
                }
            }
        }
    }
}
