//! Cathode poisoning prevention.
//!
//! A nixie tube left on the same numerals for hours grows deposits on the
//! unused cathodes.  Every few hours, and once more slowly at night, all four
//! tubes spin through every numeral like a slot machine and then come to rest
//! one at a time on the current time.
//!
//! The sequencer never blocks: [`AntiPoisoning::advance`] is called once per
//! pass and does at most one spin step.

use crate::digits::{DigitFrame, TUBES};
use crate::interval::{Interval, Millis};
use crate::time::ClockReading;

/// Time between routine cycles (4 hours).
pub const ROUTINE_PERIOD_MS: Millis = 4 * 60 * 60 * 1000;

/// Wall clock hour and minute of the nightly long cycle.
pub const LONG_CYCLE_AT: (u8, u8) = (3, 0);

/// Order in which the tubes come to rest: minute ones, minute tens, hour
/// ones, hour tens.
pub const STOP_ORDER: [usize; TUBES] = [1, 0, 3, 2];

/// The two flavours of cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleKind {
    /// Fast spin every [`ROUTINE_PERIOD_MS`].
    Routine,
    /// Slow spin at [`LONG_CYCLE_AT`], each numeral held for a full second.
    Long,
}

impl CycleKind {
    /// Time between spin steps.
    #[must_use]
    pub fn step_ms(self) -> Millis {
        match self {
            CycleKind::Routine => 200,
            CycleKind::Long => 1_000,
        }
    }

    /// Full 0-9 rotations a tube completes before it may stop.
    #[must_use]
    pub fn required_spins(self) -> u8 {
        match self {
            CycleKind::Routine => 2,
            CycleKind::Long => 1,
        }
    }
}

/// What a call to [`AntiPoisoning::advance`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    Idle,
    Started(CycleKind),
    Spinning,
    Finished,
}

pub struct AntiPoisoning {
    active: bool,
    kind: CycleKind,
    current: [u8; TUBES],
    stopped: [bool; TUBES],
    spins: [u8; TUBES],
    stop_index: usize,
    target: [u8; TUBES],
    step: Interval,
    cycle: Interval,
}

impl Default for AntiPoisoning {
    fn default() -> Self {
        Self::new()
    }
}

impl AntiPoisoning {
    /// Idle, with the first routine cycle due one period after power on.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            active: false,
            kind: CycleKind::Routine,
            current: [0; TUBES],
            stopped: [false; TUBES],
            spins: [0; TUBES],
            stop_index: 0,
            target: [0; TUBES],
            step: Interval::new(200),
            cycle: Interval::new(ROUTINE_PERIOD_MS),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn kind(&self) -> CycleKind {
        self.kind
    }

    /// Numerals currently on the spinning tubes.
    #[must_use]
    pub fn frame(&self) -> DigitFrame {
        DigitFrame(self.current)
    }

    /// Where the tubes will come to rest.
    #[must_use]
    pub fn target(&self) -> DigitFrame {
        DigitFrame(self.target)
    }

    #[must_use]
    pub fn stopped(&self) -> [bool; TUBES] {
        self.stopped
    }

    #[must_use]
    pub fn spins(&self) -> [u8; TUBES] {
        self.spins
    }

    /// How many tubes have come to rest so far.
    #[must_use]
    pub fn stop_index(&self) -> usize {
        self.stop_index
    }

    /// Begin a cycle aimed at `reading`, spinning every tube from zero.
    fn start(&mut self, kind: CycleKind, now: Millis, reading: &ClockReading) {
        self.active = true;
        self.kind = kind;
        self.step.set_period(kind.step_ms());
        self.step.restart(now);
        self.cycle.restart(now);
        self.target = DigitFrame::from_time(reading).0;
        self.current = [0; TUBES];
        self.stopped = [false; TUBES];
        self.spins = [0; TUBES];
        self.stop_index = 0;
    }

    /// Check the triggers, then spin one step if the step interval has
    /// passed.
    ///
    /// A routine cycle starts when the period has elapsed and no cycle is
    /// running.  `long_cycle` starts a long cycle unconditionally, so the
    /// caller must only raise it once per occurrence.
    pub fn advance(&mut self, now: Millis, long_cycle: bool, reading: &ClockReading) -> Progress {
        if long_cycle {
            self.start(CycleKind::Long, now, reading);
            return Progress::Started(CycleKind::Long);
        }
        if !self.active && self.cycle.is_due(now) {
            self.start(CycleKind::Routine, now, reading);
            return Progress::Started(CycleKind::Routine);
        }
        if !self.active {
            return Progress::Idle;
        }
        if !self.step.fire(now) {
            return Progress::Spinning;
        }

        for tube in 0..TUBES {
            if self.stopped[tube] {
                continue;
            }
            self.current[tube] += 1;
            if self.current[tube] > 9 {
                self.current[tube] = 0;
                self.spins[tube] = self.spins[tube].saturating_add(1);
            }
        }

        // Only the next tube in line may stop, even if a later one happens
        // to already show its target.
        if let Some(&tube) = STOP_ORDER.get(self.stop_index) {
            if self.spins[tube] >= self.kind.required_spins()
                && self.current[tube] == self.target[tube]
            {
                self.stopped[tube] = true;
                self.stop_index += 1;
            }
        }

        if self.stopped.iter().all(|&s| s) {
            self.active = false;
            Progress::Finished
        } else {
            Progress::Spinning
        }
    }
}
