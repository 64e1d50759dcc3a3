// This library is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This library is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this library.  If not, see <http://www.gnu.org/licenses/>.
//! PCA9685 16 channel PWM driver interface

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::ports::LightingOutput;

// 64 is the PCA9685 default device address, no address pins strapped
pub const PWM_ADDRESS: u8 = 64;

const REG_MODE1: u8 = 0x00;
const REG_LED0_ON_L: u8 = 0x06;
const REG_PRESCALE: u8 = 0xFE;

const MODE1_RESTART: u8 = 0x80;
const MODE1_AI: u8 = 0x20;
const MODE1_SLEEP: u8 = 0x10;

// Internal oscillator
const OSC_HZ: u32 = 25_000_000;

// Bit 4 of LEDn_ON_H/OFF_H forces the output fully on/off.
const FULL: u16 = 0x1000;

/// Prescale register value for `freq_hz`: round(osc / (4096 * freq)) - 1,
/// limited to what the chip accepts.
#[must_use]
pub fn prescale_for(freq_hz: u32) -> u8 {
    let div = 4096 * freq_hz.max(1);
    let pre = (OSC_HZ + div / 2) / div;
    pre.saturating_sub(1).clamp(3, 255) as u8
}

pub struct Pca9685<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Pca9685<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Give the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), I2C::Error> {
        self.i2c.write(self.address, &[reg, value])
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8, I2C::Error> {
        let mut buf = [0u8; 1];
        self.i2c.write_read(self.address, &[reg], &mut buf)?;
        Ok(buf[0])
    }

    /// Restart the chip and run its outputs at `freq_hz`.
    pub fn init(&mut self, delay: &mut impl DelayNs, freq_hz: u32) -> Result<(), I2C::Error> {
        self.write_reg(REG_MODE1, MODE1_RESTART)?;
        delay.delay_ms(10);
        self.set_frequency(delay, freq_hz)
    }

    /// The prescaler can only be written while the oscillator sleeps.
    pub fn set_frequency(
        &mut self,
        delay: &mut impl DelayNs,
        freq_hz: u32,
    ) -> Result<(), I2C::Error> {
        let old_mode = self.read_reg(REG_MODE1)?;
        let sleep_mode = (old_mode & !MODE1_RESTART) | MODE1_SLEEP;
        self.write_reg(REG_MODE1, sleep_mode)?;
        self.write_reg(REG_PRESCALE, prescale_for(freq_hz))?;
        let wake = old_mode & !(MODE1_RESTART | MODE1_SLEEP);
        self.write_reg(REG_MODE1, wake)?;
        delay.delay_ms(5);
        self.write_reg(REG_MODE1, wake | MODE1_RESTART | MODE1_AI)
    }

    /// Program one channel's on and off tick positions (0-4095).  Values of
    /// 4096 set the full on/off bit.
    pub fn set_pwm(&mut self, channel: u8, on: u16, off: u16) -> Result<(), I2C::Error> {
        let [on_l, on_h] = on.min(FULL).to_le_bytes();
        let [off_l, off_h] = off.min(FULL).to_le_bytes();
        let reg = REG_LED0_ON_L + 4 * (channel & 0x0F);
        self.i2c
            .write(self.address, &[reg, on_l, on_h, off_l, off_h])
    }
}

impl<I2C: I2c> LightingOutput for Pca9685<I2C> {
    type Error = I2C::Error;

    fn set_channel(&mut self, channel: u8, on: u16, off: u16) -> Result<(), Self::Error> {
        self.set_pwm(channel, on, off)
    }
}
