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
//! DS3231 RTC interface

use embedded_hal::i2c::I2c;

use crate::ports::WallClock;
use crate::time::ClockReading;

// 104 is the DS3231 RTC device address
const RTC_ADDRESS: u8 = 104;

// Seconds register; the date follows in the next six.
const REG_SECONDS: u8 = 0;

const HOUR_12H_MODE: u8 = 0b0100_0000;
const HOUR_PM: u8 = 0b0010_0000;
const MONTH_CENTURY: u8 = 0b1000_0000;

fn bcd_decode(v: u8) -> u8 {
    ((v & 0b1111_0000) >> 4) * 10 + (v & 0b0000_1111)
}

fn bcd_encode(v: u8) -> u8 {
    let t = v / 10;
    let o = v - t * 10;
    (t << 4) | o
}

pub struct Ds3231<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> Ds3231<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Give the bus back.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Get the date and time from the onboard DS3231.
    pub fn get_time(&mut self) -> Result<ClockReading, I2C::Error> {
        // send request to receive data starting at register 0
        let mut buf = [0u8; 7];
        self.i2c.write_read(RTC_ADDRESS, &[REG_SECONDS], &mut buf)?;

        let hour = if buf[2] & HOUR_12H_MODE != 0 {
            // Not set by us, but honour it if someone else did.
            let h = bcd_decode(buf[2] & 0b0001_1111) % 12;
            if buf[2] & HOUR_PM != 0 {
                h + 12
            } else {
                h
            }
        } else {
            bcd_decode(buf[2] & 0b0011_1111)
        };

        Ok(ClockReading {
            second: bcd_decode(buf[0] & 0b0111_1111),
            minute: bcd_decode(buf[1] & 0b0111_1111),
            hour,
            // buf[3] is the day of week, derived from the date instead.
            day: bcd_decode(buf[4] & 0b0011_1111),
            month: bcd_decode(buf[5] & 0b0001_1111),
            year: 2000 + u16::from(bcd_decode(buf[6])),
        })
    }

    /// Set the date and time on the onboard DS3231, in 24 hour mode.
    pub fn set_time(&mut self, reading: &ClockReading) -> Result<(), I2C::Error> {
        let year = (reading.year.saturating_sub(2000) % 100) as u8;
        let buf: [u8; 8] = [
            REG_SECONDS,
            bcd_encode(reading.second),
            bcd_encode(reading.minute),
            bcd_encode(reading.hour),
            reading.weekday(),
            bcd_encode(reading.day),
            bcd_encode(reading.month) & !MONTH_CENTURY,
            bcd_encode(year),
        ];
        self.i2c.write(RTC_ADDRESS, &buf)
    }
}

impl<I2C: I2c> WallClock for Ds3231<I2C> {
    type Error = I2C::Error;

    fn read(&mut self) -> Result<ClockReading, Self::Error> {
        self.get_time()
    }

    fn adjust(&mut self, reading: &ClockReading) -> Result<(), Self::Error> {
        self.set_time(reading)
    }
}
