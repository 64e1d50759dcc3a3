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
//! Synchonize time from a host PC.
//!
//! The host sends `T` followed by the Unix time as ten ASCII digits, e.g.
//! `T1755268330`.  Bytes are fed in one at a time as they arrive so the
//! control loop never waits on the serial port.

use crate::time::ClockReading;

// Header tag for serial time sync message
pub const TIME_HEADER: u8 = b'T';

// Unix time as ascii digits after the header
const TIME_DIGITS: u8 = 10;

#[derive(Default)]
pub struct PcSync {
    // Digits seen so far and their value, while inside a message.
    partial: Option<(u8, u32)>,
}

impl PcSync {
    #[must_use]
    pub const fn new() -> Self {
        Self { partial: None }
    }

    /// Consume one received byte, returning the time once a complete and
    /// plausible message has arrived.
    pub fn feed(&mut self, byte: u8) -> Option<ClockReading> {
        if byte == TIME_HEADER {
            self.partial = Some((0, 0));
            return None;
        }
        let (count, value) = self.partial?;
        let Some(digit) = char::from(byte).to_digit(10) else {
            self.partial = None;
            return None;
        };
        let value = value.wrapping_mul(10).wrapping_add(digit);
        let count = count + 1;
        if count < TIME_DIGITS {
            self.partial = Some((count, value));
            return None;
        }
        self.partial = None;
        let reading = ClockReading::from_unix(value);
        // Reject anything the RTC cannot hold, including values that
        // clamped to the start of 2000.
        (reading.is_valid() && reading.to_unix() == value).then_some(reading)
    }
}
