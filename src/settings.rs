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
//! EEPROM settings.
//!
//! Settings are read back at startup and each one is written as soon as a
//! remote command changes it.
//!
//! | Address | Setting                          |
//! |---------|----------------------------------|
//! | 0-1     | RGB brightness, u16 little endian |
//! | 2       | Lighting preset                  |
//! | 3       | Daylight saving in effect        |

use crate::effects::Preset;
use crate::ports::SettingsStore;

const BRIGHTNESS_ADDRESS: u16 = 0;
const PRESET_ADDRESS: u16 = 2;
const DST_ADDRESS: u16 = 3;

// "Factory" default configuration can be configured here:
pub const BRIGHTNESS_DEFAULT: u16 = 1000;
const PRESET_DEFAULT: Preset = Preset::Off;
const DST_DEFAULT: bool = false;

/// Dimmest RGB level the remote can reach.
pub const BRIGHTNESS_MIN: u16 = 100;

/// Brightest RGB level, PCA9685 full scale.
pub const BRIGHTNESS_MAX: u16 = 4095;

/// Change per arrow key press.
pub const BRIGHTNESS_STEP: i16 = 200;

/// Saved clock settings state, restored at boot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    /// RGB brightness (range: 100-4095)  Default: 1000
    pub brightness: u16,

    /// Active lighting preset (range: 0-9)  Default: 0 (Off)
    pub preset: Preset,

    /// Daylight saving currently applied to the RTC  Default: false
    pub dst: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            brightness: BRIGHTNESS_DEFAULT,
            preset: PRESET_DEFAULT,
            dst: DST_DEFAULT,
        }
    }
}

impl Settings {
    /// Constructs a new Settings from the values stored in `store`, falling
    /// back to the default for any field that does not hold a valid value
    /// (a fresh EEPROM reads 0xFF everywhere).
    #[must_use]
    pub fn new<S: SettingsStore>(store: &S) -> Self {
        let brightness = u16::from_le_bytes([
            store.read_byte(BRIGHTNESS_ADDRESS),
            store.read_byte(BRIGHTNESS_ADDRESS + 1),
        ]);
        Settings {
            brightness: match brightness {
                v @ BRIGHTNESS_MIN..=BRIGHTNESS_MAX => v,
                _ => BRIGHTNESS_DEFAULT,
            },
            preset: Preset::try_from(store.read_byte(PRESET_ADDRESS)).unwrap_or(PRESET_DEFAULT),
            dst: match store.read_byte(DST_ADDRESS) {
                v @ 0..=1 => v == 1,
                _ => DST_DEFAULT,
            },
        }
    }

    /// Step the brightness by `delta`, clamped to the allowed range, and
    /// return the new value.
    pub fn adjust_brightness(&mut self, delta: i16) -> u16 {
        let stepped = i32::from(self.brightness) + i32::from(delta);
        self.brightness =
            stepped.clamp(i32::from(BRIGHTNESS_MIN), i32::from(BRIGHTNESS_MAX)) as u16;
        self.brightness
    }

    pub fn save_brightness<S: SettingsStore>(&self, store: &mut S) {
        let [lo, hi] = self.brightness.to_le_bytes();
        store.update_byte(BRIGHTNESS_ADDRESS, lo);
        store.update_byte(BRIGHTNESS_ADDRESS + 1, hi);
    }

    pub fn save_preset<S: SettingsStore>(&self, store: &mut S) {
        store.update_byte(PRESET_ADDRESS, self.preset as u8);
    }

    pub fn save_dst<S: SettingsStore>(&self, store: &mut S) {
        store.update_byte(DST_ADDRESS, u8::from(self.dst));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 1K EEPROM that counts its writes.
    struct Eeprom {
        bytes: [u8; 1024],
        writes: usize,
    }

    impl Eeprom {
        fn erased() -> Self {
            Self {
                bytes: [0xFF; 1024],
                writes: 0,
            }
        }
    }

    impl SettingsStore for Eeprom {
        fn read_byte(&self, address: u16) -> u8 {
            self.bytes[usize::from(address)]
        }

        fn write_byte(&mut self, address: u16, value: u8) {
            self.bytes[usize::from(address)] = value;
            self.writes += 1;
        }
    }

    #[test]
    fn erased_eeprom_gives_defaults() {
        assert_eq!(Settings::new(&Eeprom::erased()), Settings::default());
    }

    #[test]
    fn saved_values_come_back() {
        let mut eeprom = Eeprom::erased();
        let settings = Settings {
            brightness: 1400,
            preset: Preset::Rainbow,
            dst: true,
        };
        settings.save_brightness(&mut eeprom);
        settings.save_preset(&mut eeprom);
        settings.save_dst(&mut eeprom);
        assert_eq!(&eeprom.bytes[..4], &[0x78, 0x05, 9, 1]);
        assert_eq!(Settings::new(&eeprom), settings);
    }

    #[test]
    fn invalid_fields_fall_back_individually() {
        let mut eeprom = Eeprom::erased();
        eeprom.bytes[..4].copy_from_slice(&[50, 0, 7, 2]);
        let settings = Settings::new(&eeprom);
        assert_eq!(settings.brightness, BRIGHTNESS_DEFAULT);
        assert_eq!(settings.preset, Preset::TeamColorWave);
        assert!(!settings.dst);
    }

    #[test]
    fn unchanged_bytes_are_not_rewritten() {
        let mut eeprom = Eeprom::erased();
        let settings = Settings::default();
        settings.save_preset(&mut eeprom);
        settings.save_preset(&mut eeprom);
        assert_eq!(eeprom.writes, 1);
        settings.save_brightness(&mut eeprom);
        assert_eq!(eeprom.writes, 3);
    }

    #[test]
    fn brightness_clamps_at_both_ends() {
        let mut settings = Settings::default();
        assert_eq!(settings.adjust_brightness(BRIGHTNESS_STEP), 1200);
        settings.brightness = 4000;
        assert_eq!(settings.adjust_brightness(BRIGHTNESS_STEP), BRIGHTNESS_MAX);
        settings.brightness = 250;
        assert_eq!(settings.adjust_brightness(-BRIGHTNESS_STEP), BRIGHTNESS_MIN);
        assert_eq!(settings.adjust_brightness(-BRIGHTNESS_STEP), BRIGHTNESS_MIN);
    }
}

#[cfg(all(test, not(target_arch = "avr")))]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn any_key_sequence_stays_in_range(ups in proptest::collection::vec(any::<bool>(), 0..64)) {
            let mut settings = Settings::default();
            let mut expected = i32::from(BRIGHTNESS_DEFAULT);
            for up in ups {
                let delta = if up { BRIGHTNESS_STEP } else { -BRIGHTNESS_STEP };
                expected = (expected + i32::from(delta)).clamp(100, 4095);
                let got = settings.adjust_brightness(delta);
                prop_assert!((BRIGHTNESS_MIN..=BRIGHTNESS_MAX).contains(&got));
                prop_assert_eq!(i32::from(got), expected);
            }
        }
    }
}
