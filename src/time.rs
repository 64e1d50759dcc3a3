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
//! Wall clock readings and the calendar arithmetic needed to shift them.
//!
//! Only the years 2000-2099 are representable, which is what the DS3231
//! century range covers.

/// Seconds from 1970-01-01 to 2000-01-01.
const EPOCH_2000: u32 = 946_684_800;

const SECS_PER_DAY: u32 = 86_400;

/// One hour, the size of a daylight saving step.
pub const SECS_PER_HOUR: i32 = 3_600;

/// A wall clock instant as kept by the RTC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClockReading {
    /// 2000-2099
    pub year: u16,
    /// 1-12
    pub month: u8,
    /// 1-31
    pub day: u8,
    /// 0-23
    pub hour: u8,
    /// 0-59
    pub minute: u8,
    /// 0-59
    pub second: u8,
}

impl Default for ClockReading {
    fn default() -> Self {
        Self {
            year: 2000,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }
}

fn is_leap(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        2 if is_leap(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

impl ClockReading {
    /// Hour on a 12 hour dial, 1-12.
    #[must_use]
    pub fn hour12(&self) -> u8 {
        match self.hour % 12 {
            0 => 12,
            h => h,
        }
    }

    /// True when every field is inside its calendar range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (2000..=2099).contains(&self.year)
            && (1..=12).contains(&self.month)
            && self.day >= 1
            && self.day <= days_in_month(self.year, self.month)
            && self.hour < 24
            && self.minute < 60
            && self.second < 60
    }

    /// Days since 2000-01-01.  Out of range fields count on past the end
    /// of their month or year instead of failing.
    fn days_since_2000(&self) -> u32 {
        let mut days: u32 = 0;
        for y in 2000..self.year {
            days += if is_leap(y) { 366 } else { 365 };
        }
        for m in 1..self.month {
            days += u32::from(days_in_month(self.year, m));
        }
        (days + u32::from(self.day)).saturating_sub(1)
    }

    /// Day of week, Monday = 1 through Sunday = 7.
    #[must_use]
    pub fn weekday(&self) -> u8 {
        // 2000-01-01 was a Saturday.
        ((self.days_since_2000() + 5) % 7 + 1) as u8
    }

    /// Seconds since 1970-01-01 00:00:00, saturating at `u32::MAX` for
    /// readings past 2106.
    #[must_use]
    pub fn to_unix(&self) -> u32 {
        self.days_since_2000()
            .saturating_mul(SECS_PER_DAY)
            .saturating_add(EPOCH_2000)
            .saturating_add(u32::from(self.hour) * 3_600)
            .saturating_add(u32::from(self.minute) * 60)
            .saturating_add(u32::from(self.second))
    }

    /// Convert seconds since 1970 back to a reading.  Instants before 2000
    /// clamp to 2000-01-01 00:00:00.
    #[must_use]
    pub fn from_unix(unix: u32) -> Self {
        let since_2000 = unix.saturating_sub(EPOCH_2000);
        let mut days = since_2000 / SECS_PER_DAY;
        let secs = since_2000 % SECS_PER_DAY;

        let mut year: u16 = 2000;
        loop {
            let len = if is_leap(year) { 366 } else { 365 };
            if days < len {
                break;
            }
            days -= len;
            year += 1;
        }
        let mut month: u8 = 1;
        loop {
            let len = u32::from(days_in_month(year, month));
            if days < len {
                break;
            }
            days -= len;
            month += 1;
        }

        Self {
            year,
            month,
            day: days as u8 + 1,
            hour: (secs / 3_600) as u8,
            minute: (secs / 60 % 60) as u8,
            second: (secs % 60) as u8,
        }
    }

    /// The reading `seconds` later (or earlier when negative), rolling the
    /// date over as needed.
    #[must_use]
    pub fn shifted(&self, seconds: i32) -> Self {
        let unix = if seconds >= 0 {
            self.to_unix().saturating_add(seconds.unsigned_abs())
        } else {
            self.to_unix().saturating_sub(seconds.unsigned_abs())
        };
        Self::from_unix(unix)
    }
}

fn two_digits<W>(f: &mut ufmt::Formatter<'_, W>, v: u8) -> Result<(), W::Error>
where
    W: ufmt::uWrite + ?Sized,
{
    f.write_char(char::from(b'0' + v / 10 % 10))?;
    f.write_char(char::from(b'0' + v % 10))
}

/// `YYYY-MM-DD HH:MM:SS`
impl ufmt::uDisplay for ClockReading {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        ufmt::uwrite!(f, "{}-", self.year)?;
        two_digits(f, self.month)?;
        f.write_char('-')?;
        two_digits(f, self.day)?;
        f.write_char(' ')?;
        two_digits(f, self.hour)?;
        f.write_char(':')?;
        two_digits(f, self.minute)?;
        f.write_char(':')?;
        two_digits(f, self.second)
    }
}
