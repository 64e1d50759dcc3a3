//! Non-blocking periodic timing on top of a wrapping millisecond counter.
//!
//! Every periodic process in the control loop owns one of these instead of
//! sleeping.  Comparisons subtract with wrap-around so they stay correct when
//! `millis()` rolls over after ~49.7 days.

/// Milliseconds since power on, wrapping.
pub type Millis = u32;

/// True when at least `interval` ms have passed since `since`.
#[must_use]
pub fn has_elapsed(since: Millis, now: Millis, interval: Millis) -> bool {
    now.wrapping_sub(since) >= interval
}

/// A period together with the time it last fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Interval {
    last: Millis,
    period: Millis,
}

impl Interval {
    /// A timer whose reference point is power on.
    #[must_use]
    pub const fn new(period: Millis) -> Self {
        Self { last: 0, period }
    }

    #[must_use]
    pub fn period(&self) -> Millis {
        self.period
    }

    /// Change the period without touching the reference point.
    pub fn set_period(&mut self, period: Millis) {
        self.period = period;
    }

    #[must_use]
    pub fn is_due(&self, now: Millis) -> bool {
        has_elapsed(self.last, now, self.period)
    }

    /// Fire if due, moving the reference point to `now`.
    pub fn fire(&mut self, now: Millis) -> bool {
        if self.is_due(now) {
            self.last = now;
            true
        } else {
            false
        }
    }

    /// Start counting a fresh period from `now`.
    pub fn restart(&mut self, now: Millis) {
        self.last = now;
    }
}
