//! Nixie digit frames and their packing for the shift register / BCD
//! decoder chain.

use crate::time::ClockReading;

/// Nibble the BCD decoders treat as "all cathodes off".
pub const BLANK: u8 = 0x0F;

/// Number of tubes.
pub const TUBES: usize = 4;

/// What the four tubes should show at one instant.
///
/// Slot order is the wiring order of the decoders: minute tens, minute ones,
/// hour tens, hour ones.  Values above 9 blank the tube.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DigitFrame(pub [u8; TUBES]);

impl DigitFrame {
    pub const BLANK: Self = Self([BLANK; TUBES]);

    /// Time of day on a 12 hour dial.
    #[must_use]
    pub fn from_time(reading: &ClockReading) -> Self {
        let hour = reading.hour12();
        Self([
            reading.minute / 10,
            reading.minute % 10,
            hour / 10,
            hour % 10,
        ])
    }

    /// Day of month then month, in the same slots as the time.
    #[must_use]
    pub fn from_date(reading: &ClockReading) -> Self {
        Self([
            reading.day / 10,
            reading.day % 10,
            reading.month / 10,
            reading.month % 10,
        ])
    }

    /// The two bytes in the order they are shifted out, MSB first.  Each byte
    /// carries two tubes, the odd slot in the high nibble.
    #[must_use]
    pub fn to_shift_bytes(&self) -> [u8; 2] {
        let [a, b, c, d] = self.0.map(nibble);
        [(d << 4) | c, (b << 4) | a]
    }
}

fn nibble(digit: u8) -> u8 {
    if digit > 9 {
        BLANK
    } else {
        digit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(hour: u8, minute: u8) -> ClockReading {
        ClockReading {
            hour,
            minute,
            ..ClockReading::default()
        }
    }

    #[test]
    fn time_frame_uses_twelve_hour_dial() {
        assert_eq!(DigitFrame::from_time(&reading(14, 32)).0, [3, 2, 0, 2]);
        assert_eq!(DigitFrame::from_time(&reading(0, 5)).0, [0, 5, 1, 2]);
        assert_eq!(DigitFrame::from_time(&reading(23, 59)).0, [5, 9, 1, 1]);
    }

    #[test]
    fn date_frame_is_day_then_month() {
        let r = ClockReading {
            day: 24,
            month: 8,
            ..ClockReading::default()
        };
        assert_eq!(DigitFrame::from_date(&r).0, [2, 4, 0, 8]);
    }

    #[test]
    fn packs_second_pair_first() {
        assert_eq!(DigitFrame([1, 2, 3, 4]).to_shift_bytes(), [0x43, 0x21]);
    }

    #[test]
    fn out_of_range_digits_blank() {
        assert_eq!(DigitFrame([10, 9, 0xFF, 0]).to_shift_bytes(), [0x0F, 0x9F]);
        assert_eq!(DigitFrame::BLANK.to_shift_bytes(), [0xFF, 0xFF]);
    }
}
