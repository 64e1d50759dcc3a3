//! The control loop.
//!
//! [`NixieClock`] owns every piece of clock state plus the hardware behind
//! the port traits.  [`NixieClock::run_pass`] is called from the firmware's
//! endless loop; every subsystem in it either does a small bounded amount
//! of work or returns straight away, so a pass never blocks.
//!
//! Each pass runs the same pipeline in the same order:
//!
//! 1. read the wall clock
//! 2. build the normal time frame
//! 3. pick the display source: date overlay, then anti-poisoning, then time
//! 4. render it
//! 5. colon fade
//! 6. anti-poisoning
//! 7. RGB effect
//! 8. at most one remote command
//!
//! Rendering happens before steps 6 and 8, so the tubes always show the
//! anti-poisoning and date state left by the previous pass.

use embedded_hal::pwm::SetDutyCycle;
use ufmt::{uWrite, uwriteln};

use crate::colon::{ColonFader, COLON_MAX};
use crate::command::Command;
use crate::digits::DigitFrame;
use crate::effects::{EffectEngine, Preset};
use crate::interval::{Interval, Millis};
use crate::poison::{AntiPoisoning, CycleKind, Progress, LONG_CYCLE_AT};
use crate::ports::{CommandSource, DigitOutput, LightingOutput, SettingsStore, WallClock};
use crate::settings::Settings;
use crate::time::{ClockReading, SECS_PER_HOUR};

/// How long `#` shows the date.
pub const DATE_DISPLAY_MS: Millis = 5_000;

/// Where the digits for this pass come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplaySource {
    Date,
    AntiPoisoning,
    Time,
}

/// Day and month held on the tubes for [`DATE_DISPLAY_MS`].
pub struct DateOverlay {
    frame: DigitFrame,
    timer: Interval,
    showing: bool,
}

impl Default for DateOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl DateOverlay {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            frame: DigitFrame::BLANK,
            timer: Interval::new(DATE_DISPLAY_MS),
            showing: false,
        }
    }

    pub fn show(&mut self, reading: &ClockReading, now: Millis) {
        self.frame = DigitFrame::from_date(reading);
        self.timer.restart(now);
        self.showing = true;
    }

    /// The date frame while the window is open.  Closes the window once it
    /// has run out.
    pub fn frame(&mut self, now: Millis) -> Option<DigitFrame> {
        if self.showing && self.timer.is_due(now) {
            self.showing = false;
        }
        self.showing.then_some(self.frame)
    }

    #[must_use]
    pub fn is_showing(&self) -> bool {
        self.showing
    }
}

/// Why the wall clock gave no usable time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockError<E> {
    /// The clock did not answer.
    Read(E),
    /// The clock answered with a date outside the calendar, as a DS3231
    /// does after losing its register file.
    Invalid(ClockReading),
}

fn read_clock<W: WallClock>(clock: &mut W) -> Result<ClockReading, ClockError<W::Error>> {
    let reading = clock.read().map_err(ClockError::Read)?;
    if reading.is_valid() {
        Ok(reading)
    } else {
        Err(ClockError::Invalid(reading))
    }
}

/// The hardware a [`NixieClock`] drives.
pub struct Peripherals<W, S, C, D, L, P, O> {
    pub clock: W,
    pub store: S,
    pub remote: C,
    pub digits: D,
    pub lighting: L,
    pub colon: P,
    /// Diagnostic text output.
    pub log: O,
}

pub struct NixieClock<W, S, C, D, L, P, O> {
    hw: Peripherals<W, S, C, D, L, P, O>,
    settings: Settings,
    colon: ColonFader,
    poison: AntiPoisoning,
    effects: EffectEngine,
    date: DateOverlay,
    /// Last good wall clock reading.
    reading: ClockReading,
    /// Whether the previous pass was inside the long cycle minute.
    in_long_cycle_minute: bool,
    source: DisplaySource,
}

impl<W, S, C, D, L, P, O> NixieClock<W, S, C, D, L, P, O>
where
    W: WallClock,
    S: SettingsStore,
    C: CommandSource,
    D: DigitOutput,
    L: LightingOutput,
    P: SetDutyCycle,
    O: uWrite,
{
    /// Read the wall clock once and restore the saved settings.  A clock
    /// that cannot be read, or reads garbage, is returned as an error; there
    /// is no sensible time to show without it.
    pub fn new(
        mut hw: Peripherals<W, S, C, D, L, P, O>,
    ) -> Result<Self, ClockError<W::Error>> {
        let reading = match read_clock(&mut hw.clock) {
            Ok(reading) => reading,
            Err(e) => {
                match e {
                    ClockError::Read(_) => uwriteln!(&mut hw.log, "Couldn't find RTC\r"),
                    ClockError::Invalid(bad) => {
                        uwriteln!(&mut hw.log, "RTC time invalid: {}\r", bad)
                    }
                }
                .ok();
                return Err(e);
            }
        };
        let settings = Settings::new(&hw.store);

        uwriteln!(&mut hw.log, "Nixie clock {}\r", reading).ok();
        uwriteln!(
            &mut hw.log,
            "brightness {}, preset {}, DST {}\r",
            settings.brightness,
            settings.preset,
            on_off(settings.dst)
        )
        .ok();

        Ok(Self {
            hw,
            settings,
            colon: ColonFader::new(),
            poison: AntiPoisoning::new(),
            effects: EffectEngine::new(u64::from(reading.to_unix())),
            date: DateOverlay::new(),
            reading,
            in_long_cycle_minute: false,
            source: DisplaySource::Time,
        })
    }

    /// One trip round the control loop.
    pub fn run_pass(&mut self, now: Millis) {
        // 1. wall clock
        match read_clock(&mut self.hw.clock) {
            Ok(reading) => self.reading = reading,
            Err(ClockError::Read(_)) => {
                uwriteln!(&mut self.hw.log, "RTC read failed\r").ok();
            }
            Err(ClockError::Invalid(_)) => {
                uwriteln!(&mut self.hw.log, "RTC time invalid\r").ok();
            }
        }

        // 2-3. choose
        let normal = DigitFrame::from_time(&self.reading);
        let (source, frame) = if let Some(frame) = self.date.frame(now) {
            (DisplaySource::Date, frame)
        } else if self.poison.is_active() {
            (DisplaySource::AntiPoisoning, self.poison.frame())
        } else {
            (DisplaySource::Time, normal)
        };
        self.source = source;

        // 4. render
        if self.hw.digits.write_frame(&frame).is_err() {
            uwriteln!(&mut self.hw.log, "digit write failed\r").ok();
        }

        // 5. colon
        if let Some(level) = self.colon.advance(now) {
            let duty = self
                .hw
                .colon
                .set_duty_cycle_fraction(u16::from(level), u16::from(COLON_MAX));
            if duty.is_err() {
                uwriteln!(&mut self.hw.log, "colon write failed\r").ok();
            }
        }

        // 6. anti-poisoning, with a second forced advance on the pass the
        // long cycle minute begins.
        let in_minute = (self.reading.hour, self.reading.minute) == LONG_CYCLE_AT;
        let long_cycle = in_minute && !self.in_long_cycle_minute;
        self.in_long_cycle_minute = in_minute;
        let progress = self.poison.advance(now, false, &self.reading);
        self.log_progress(progress);
        if long_cycle {
            let progress = self.poison.advance(now, true, &self.reading);
            self.log_progress(progress);
        }

        // 7. lighting
        if let Some(frame) = self
            .effects
            .advance(self.settings.preset, self.settings.brightness, now)
        {
            if self.hw.lighting.write_frame(&frame).is_err() {
                uwriteln!(&mut self.hw.log, "lighting write failed\r").ok();
            }
        }

        // 8. remote
        match self.hw.remote.poll_command() {
            Ok(code) => {
                let [_, cmd, _, addr] = code.to_be_bytes();
                uwriteln!(
                    &mut self.hw.log,
                    "IR code {} (address {}, command {})\r",
                    code,
                    addr,
                    cmd
                )
                .ok();
                if let Some(command) = Command::from_code(code) {
                    self.dispatch(command, now);
                }
                self.hw.remote.acknowledge();
            }
            Err(nb::Error::WouldBlock) => {}
            Err(nb::Error::Other(_)) => {
                uwriteln!(&mut self.hw.log, "IR receive failed\r").ok();
                self.hw.remote.acknowledge();
            }
        }
    }

    /// Apply one remote command.
    pub fn dispatch(&mut self, command: Command, now: Millis) {
        match command {
            Command::SelectPreset(preset) => {
                self.settings.preset = preset;
                self.settings.save_preset(&mut self.hw.store);
                uwriteln!(&mut self.hw.log, "preset {}\r", preset).ok();
                // Blank straight away; the effect engine leaves the LEDs
                // alone while off.
                if preset == Preset::Off && self.hw.lighting.all_off().is_err() {
                    uwriteln!(&mut self.hw.log, "lighting write failed\r").ok();
                }
            }
            Command::AdjustBrightness(delta) => {
                let brightness = self.settings.adjust_brightness(delta);
                self.settings.save_brightness(&mut self.hw.store);
                uwriteln!(&mut self.hw.log, "brightness {}\r", brightness).ok();
            }
            Command::ShowDate => {
                self.date.show(&self.reading, now);
                uwriteln!(
                    &mut self.hw.log,
                    "date {}/{}\r",
                    self.reading.day,
                    self.reading.month
                )
                .ok();
            }
            Command::ToggleDst => self.toggle_dst(),
        }
    }

    /// Step the RTC an hour forward into daylight saving or back out of it.
    /// The flag only flips once the RTC has taken the new time.
    fn toggle_dst(&mut self) {
        let current = match read_clock(&mut self.hw.clock) {
            Ok(reading) => reading,
            Err(ClockError::Read(_)) => {
                uwriteln!(&mut self.hw.log, "RTC read failed, DST unchanged\r").ok();
                return;
            }
            Err(ClockError::Invalid(_)) => {
                uwriteln!(&mut self.hw.log, "RTC time invalid, DST unchanged\r").ok();
                return;
            }
        };
        let shift = if self.settings.dst {
            -SECS_PER_HOUR
        } else {
            SECS_PER_HOUR
        };
        let shifted = current.shifted(shift);
        if self.hw.clock.adjust(&shifted).is_err() {
            uwriteln!(&mut self.hw.log, "RTC adjust failed, DST unchanged\r").ok();
            return;
        }
        self.reading = shifted;
        self.settings.dst = !self.settings.dst;
        self.settings.save_dst(&mut self.hw.store);
        uwriteln!(
            &mut self.hw.log,
            "DST {}, time {}\r",
            on_off(self.settings.dst),
            shifted
        )
        .ok();
    }

    /// Set the wall clock from an outside source such as the serial port.
    pub fn set_time(&mut self, reading: &ClockReading) -> Result<(), ClockError<W::Error>> {
        if !reading.is_valid() {
            return Err(ClockError::Invalid(*reading));
        }
        self.hw.clock.adjust(reading).map_err(ClockError::Read)?;
        self.reading = *reading;
        uwriteln!(&mut self.hw.log, "time set {}\r", reading).ok();
        Ok(())
    }

    fn log_progress(&mut self, progress: Progress) {
        match progress {
            Progress::Started(CycleKind::Routine) => {
                uwriteln!(&mut self.hw.log, "anti-poisoning started\r").ok();
            }
            Progress::Started(CycleKind::Long) => {
                uwriteln!(&mut self.hw.log, "long anti-poisoning started\r").ok();
            }
            Progress::Finished => {
                uwriteln!(&mut self.hw.log, "anti-poisoning done\r").ok();
            }
            Progress::Idle | Progress::Spinning => {}
        }
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub fn reading(&self) -> &ClockReading {
        &self.reading
    }

    /// The source rendered by the most recent pass.
    #[must_use]
    pub fn display_source(&self) -> DisplaySource {
        self.source
    }

    #[must_use]
    pub fn anti_poisoning(&self) -> &AntiPoisoning {
        &self.poison
    }

    #[must_use]
    pub fn peripherals(&self) -> &Peripherals<W, S, C, D, L, P, O> {
        &self.hw
    }

    pub fn peripherals_mut(&mut self) -> &mut Peripherals<W, S, C, D, L, P, O> {
        &mut self.hw
    }
}

fn on_off(v: bool) -> &'static str {
    if v {
        "on"
    } else {
        "off"
    }
}
