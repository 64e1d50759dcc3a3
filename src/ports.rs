//! The boundary between the clock logic and the board.
//!
//! The control loop only ever talks to these traits.  The firmware binary
//! implements them on top of the ATmega328P peripherals and the I2C drivers
//! in this crate; the tests implement them in memory.
//!
//! The colon neon needs nothing beyond a PWM pin, so it uses
//! [`embedded_hal::pwm::SetDutyCycle`] directly.

use crate::digits::DigitFrame;
use crate::effects::{LightFrame, UNITS};
use crate::time::ClockReading;

/// Battery backed real time clock.
pub trait WallClock {
    type Error;

    fn read(&mut self) -> Result<ClockReading, Self::Error>;

    /// Set the clock.  Used for daylight saving steps and host time sync.
    fn adjust(&mut self, reading: &ClockReading) -> Result<(), Self::Error>;
}

/// Byte addressed non-volatile memory, shaped like `arduino_hal::Eeprom`.
pub trait SettingsStore {
    fn read_byte(&self, address: u16) -> u8;

    fn write_byte(&mut self, address: u16, value: u8);

    /// Write only if the stored byte differs, sparing erase cycles.
    fn update_byte(&mut self, address: u16, value: u8) {
        if self.read_byte(address) != value {
            self.write_byte(address, value);
        }
    }
}

/// Decoded infrared remote codes.
pub trait CommandSource {
    type Error;

    /// The pending 32 bit code, or `WouldBlock` when nothing arrived.  The
    /// same code is returned until it is acknowledged.
    fn poll_command(&mut self) -> nb::Result<u32, Self::Error>;

    /// Release the current code so the next one can be received.
    fn acknowledge(&mut self);
}

/// The four nixie tubes.
pub trait DigitOutput {
    type Error;

    fn write_frame(&mut self, frame: &DigitFrame) -> Result<(), Self::Error>;
}

/// Twelve channel PWM driver feeding the RGB units, three consecutive
/// channels per unit.
pub trait LightingOutput {
    type Error;

    /// Channel 0-11; `on` and `off` are tick positions 0-4095 within the
    /// PWM period.
    fn set_channel(&mut self, channel: u8, on: u16, off: u16) -> Result<(), Self::Error>;

    fn write_frame(&mut self, frame: &LightFrame) -> Result<(), Self::Error> {
        for (unit, rgb) in frame.iter().enumerate() {
            for (colour, &value) in rgb.iter().enumerate() {
                self.set_channel((unit * 3 + colour) as u8, 0, value)?;
            }
        }
        Ok(())
    }

    fn all_off(&mut self) -> Result<(), Self::Error> {
        self.write_frame(&[[0; 3]; UNITS])
    }
}
