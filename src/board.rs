//! Adapters between `arduino-hal` peripherals and the clock's port traits.

use core::convert::Infallible;

use arduino_hal::hal::port::PB2;
use arduino_hal::port::mode::PwmOutput;
use arduino_hal::port::Pin;
use arduino_hal::simple_pwm::Timer1Pwm;
use embedded_hal::pwm::{ErrorType, SetDutyCycle};

use nixieclock::ports::SettingsStore;

/// The ATmega328P's 1K of EEPROM.
pub struct EepromStore(pub arduino_hal::Eeprom);

impl SettingsStore for EepromStore {
    fn read_byte(&self, address: u16) -> u8 {
        self.0.read_byte(address)
    }

    fn write_byte(&mut self, address: u16, value: u8) {
        self.0.write_byte(address, value)
    }
}

/// Colon neon on D10, 8 bit PWM from TC1 (OC1B).
pub struct ColonPwm(pub Pin<PwmOutput<Timer1Pwm>, PB2>);

impl ErrorType for ColonPwm {
    type Error = Infallible;
}

impl SetDutyCycle for ColonPwm {
    fn max_duty_cycle(&self) -> u16 {
        u16::from(u8::MAX)
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.0.set_duty(duty.min(u16::from(u8::MAX)) as u8);
        Ok(())
    }
}
