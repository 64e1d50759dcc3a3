//! Infrared remote keys and what they do.
//!
//! Codes are the 32 bit NEC frames of the 17 key remote that ships with the
//! clock, in the usual raw layout `!cmd << 24 | cmd << 16 | !addr << 8 |
//! addr`.

use crate::effects::Preset;
use crate::settings::BRIGHTNESS_STEP;

pub const KEY_1: u32 = 0xBA45_FF00;
pub const KEY_2: u32 = 0xB946_FF00;
pub const KEY_3: u32 = 0xB847_FF00;
pub const KEY_4: u32 = 0xBB44_FF00;
pub const KEY_5: u32 = 0xBF40_FF00;
pub const KEY_6: u32 = 0xBC43_FF00;
pub const KEY_7: u32 = 0xF807_FF00;
pub const KEY_8: u32 = 0xEA15_FF00;
pub const KEY_9: u32 = 0xF609_FF00;
pub const KEY_0: u32 = 0xE619_FF00;
pub const KEY_ASTERISK: u32 = 0xE916_FF00;
pub const KEY_POUND: u32 = 0xF20D_FF00;
pub const KEY_UP: u32 = 0xE718_FF00;
pub const KEY_DOWN: u32 = 0xAD52_FF00;
pub const KEY_LEFT: u32 = 0xF708_FF00;
pub const KEY_RIGHT: u32 = 0xA55A_FF00;
pub const KEY_OK: u32 = 0xE31C_FF00;

/// Rebuild the raw 32 bit code of a standard NEC frame.
#[must_use]
pub fn nec_raw(addr: u8, cmd: u8) -> u32 {
    u32::from_be_bytes([!cmd, cmd, !addr, addr])
}

/// Clock state changes a remote key can request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Digit keys 0-9.
    SelectPreset(Preset),
    /// Arrow keys: signed brightness step.
    AdjustBrightness(i16),
    /// `#`: show day and month for a few seconds.
    ShowDate,
    /// `*`: step the clock one hour into or out of daylight saving.
    ToggleDst,
}

impl Command {
    /// Look up a received code.  Keys without a function (left, right, OK)
    /// and foreign codes give `None`.
    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        let preset = |p| Some(Command::SelectPreset(p));
        match code {
            KEY_0 => preset(Preset::Off),
            KEY_1 => preset(Preset::Red),
            KEY_2 => preset(Preset::Blue),
            KEY_3 => preset(Preset::Green),
            KEY_4 => preset(Preset::DualColorWave),
            KEY_5 => preset(Preset::Cyan),
            KEY_6 => preset(Preset::Magenta),
            KEY_7 => preset(Preset::TeamColorWave),
            KEY_8 => preset(Preset::Fire),
            KEY_9 => preset(Preset::Rainbow),
            KEY_UP => Some(Command::AdjustBrightness(BRIGHTNESS_STEP)),
            KEY_DOWN => Some(Command::AdjustBrightness(-BRIGHTNESS_STEP)),
            KEY_POUND => Some(Command::ShowDate),
            KEY_ASTERISK => Some(Command::ToggleDst),
            _ => None,
        }
    }
}
