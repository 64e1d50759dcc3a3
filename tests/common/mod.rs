//! In-memory stand-ins for the clock's hardware.
//!
//! Every output records what it was asked to do so scenarios can assert on
//! the full history without any AVR registers involved.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::pwm::{ErrorType, SetDutyCycle};
use nixieclock::digits::DigitFrame;
use nixieclock::ports::{CommandSource, DigitOutput, LightingOutput, SettingsStore, WallClock};
use nixieclock::scheduler::{NixieClock, Peripherals};
use nixieclock::time::ClockReading;

// ── Wall clock ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusError;

#[derive(Default)]
pub struct MockClock {
    pub now: ClockReading,
    pub fail_read: bool,
    pub fail_adjust: bool,
    pub adjustments: Vec<ClockReading>,
}

impl MockClock {
    pub fn at(now: ClockReading) -> Self {
        Self {
            now,
            ..Self::default()
        }
    }
}

impl WallClock for MockClock {
    type Error = BusError;

    fn read(&mut self) -> Result<ClockReading, BusError> {
        if self.fail_read {
            Err(BusError)
        } else {
            Ok(self.now)
        }
    }

    fn adjust(&mut self, reading: &ClockReading) -> Result<(), BusError> {
        if self.fail_adjust {
            return Err(BusError);
        }
        self.now = *reading;
        self.adjustments.push(*reading);
        Ok(())
    }
}

// ── EEPROM ────────────────────────────────────────────────────

pub struct MockEeprom {
    pub bytes: [u8; 1024],
    pub writes: usize,
}

impl MockEeprom {
    pub fn erased() -> Self {
        Self {
            bytes: [0xFF; 1024],
            writes: 0,
        }
    }

    /// Brightness 1000, preset off, DST off.
    pub fn factory() -> Self {
        let mut eeprom = Self::erased();
        eeprom.bytes[..4].copy_from_slice(&[0xE8, 0x03, 0, 0]);
        eeprom
    }
}

impl SettingsStore for MockEeprom {
    fn read_byte(&self, address: u16) -> u8 {
        self.bytes[usize::from(address)]
    }

    fn write_byte(&mut self, address: u16, value: u8) {
        self.bytes[usize::from(address)] = value;
        self.writes += 1;
    }
}

// ── IR remote ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockRemote {
    pub queue: VecDeque<u32>,
    pending: Option<u32>,
    pub acknowledged: usize,
}

impl CommandSource for MockRemote {
    type Error = Infallible;

    fn poll_command(&mut self) -> nb::Result<u32, Infallible> {
        if self.pending.is_none() {
            self.pending = self.queue.pop_front();
        }
        self.pending.ok_or(nb::Error::WouldBlock)
    }

    fn acknowledge(&mut self) {
        self.pending = None;
        self.acknowledged += 1;
    }
}

// ── Outputs ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockDigits {
    pub frames: Vec<DigitFrame>,
}

impl MockDigits {
    pub fn last(&self) -> Option<DigitFrame> {
        self.frames.last().copied()
    }
}

impl DigitOutput for MockDigits {
    type Error = Infallible;

    fn write_frame(&mut self, frame: &DigitFrame) -> Result<(), Infallible> {
        self.frames.push(*frame);
        Ok(())
    }
}

#[derive(Default)]
pub struct MockLighting {
    pub channels: [u16; 12],
    pub writes: usize,
    pub fail: bool,
}

impl LightingOutput for MockLighting {
    type Error = BusError;

    fn set_channel(&mut self, channel: u8, on: u16, off: u16) -> Result<(), BusError> {
        if self.fail {
            return Err(BusError);
        }
        assert_eq!(on, 0);
        self.channels[usize::from(channel)] = off;
        self.writes += 1;
        Ok(())
    }
}

#[derive(Default)]
pub struct MockColon {
    pub levels: Vec<u16>,
}

impl ErrorType for MockColon {
    type Error = Infallible;
}

impl SetDutyCycle for MockColon {
    fn max_duty_cycle(&self) -> u16 {
        255
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
        self.levels.push(duty);
        Ok(())
    }
}

/// Serial log the test keeps a handle to, even if the clock is dropped.
#[derive(Clone, Default)]
pub struct SharedLog(Rc<RefCell<String>>);

impl SharedLog {
    pub fn text(&self) -> String {
        self.0.borrow().clone()
    }

    pub fn count(&self, needle: &str) -> usize {
        self.0.borrow().matches(needle).count()
    }
}

impl ufmt::uWrite for SharedLog {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
        self.0.borrow_mut().push_str(s);
        Ok(())
    }
}

// ── Assembly ──────────────────────────────────────────────────

pub type TestClock =
    NixieClock<MockClock, MockEeprom, MockRemote, MockDigits, MockLighting, MockColon, SharedLog>;

pub fn at(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> ClockReading {
    ClockReading {
        year,
        month,
        day,
        hour,
        minute,
        second,
    }
}

pub fn peripherals(
    clock: MockClock,
    store: MockEeprom,
    log: SharedLog,
) -> Peripherals<MockClock, MockEeprom, MockRemote, MockDigits, MockLighting, MockColon, SharedLog>
{
    Peripherals {
        clock,
        store,
        remote: MockRemote::default(),
        digits: MockDigits::default(),
        lighting: MockLighting::default(),
        colon: MockColon::default(),
        log,
    }
}

/// Boot a clock reading `now` with factory settings in EEPROM.
pub fn boot(now: ClockReading) -> (TestClock, SharedLog) {
    boot_with(now, MockEeprom::factory())
}

pub fn boot_with(now: ClockReading, store: MockEeprom) -> (TestClock, SharedLog) {
    let log = SharedLog::default();
    let clock = NixieClock::new(peripherals(MockClock::at(now), store, log.clone()))
        .expect("mock clock reads");
    (clock, log)
}

pub fn press(clock: &mut TestClock, code: u32) {
    clock.peripherals_mut().remote.queue.push_back(code);
}
