//! Ambient RGB lighting under the tubes.
//!
//! Four RGB LEDs hang off a PCA9685, three channels each.  Exactly one
//! [`Preset`] is active; static colours are recomputed every pass while the
//! animated ones keep their own phase and only update when their own
//! interval has passed.
//!
//! | Preset         | Update            | Gamma |
//! |----------------|-------------------|-------|
//! | Red/Green/Blue | every pass        | no    |
//! | Cyan/Magenta   | every pass        | yes   |
//! | DualColorWave  | 10 ms             | no    |
//! | TeamColorWave  | 1 ms              | yes   |
//! | Fire           | 30-150 ms, random | yes   |
//! | Rainbow        | 20 ms             | yes   |

use core::f32::consts::TAU;

use micromath::F32Ext;
use tinyrand::{RandRange, Seeded, StdRand};

use crate::interval::{Interval, Millis};

/// RGB units under the tubes.
pub const UNITS: usize = 4;

/// Full scale of a PCA9685 channel.
pub const PWM_MAX: u16 = 4095;

/// Exponent of the perceptual brightness curve.
pub const GAMMA: f32 = 2.2;

/// Gamma output ceiling for effects that fold brightness into the 8 bit
/// level before the lookup.
pub const GAMMA_MAX: u16 = 1000;

/// PWM value for each channel of each unit, `[unit][r, g, b]`.
pub type LightFrame = [[u16; 3]; UNITS];

/// Selectable lighting behaviour, numbered as stored in EEPROM and as the
/// remote's digit keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Preset {
    Off = 0,
    Red = 1,
    Blue = 2,
    Green = 3,
    /// Yellow and orange sine wave across the units.
    DualColorWave = 4,
    Cyan = 5,
    Magenta = 6,
    /// Purple and gold sine wave across the units.
    TeamColorWave = 7,
    Fire = 8,
    Rainbow = 9,
}

impl TryFrom<u8> for Preset {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Preset::Off,
            1 => Preset::Red,
            2 => Preset::Blue,
            3 => Preset::Green,
            4 => Preset::DualColorWave,
            5 => Preset::Cyan,
            6 => Preset::Magenta,
            7 => Preset::TeamColorWave,
            8 => Preset::Fire,
            9 => Preset::Rainbow,
            v => return Err(v),
        })
    }
}

impl ufmt::uDisplay for Preset {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        f.write_str(match self {
            Preset::Off => "off",
            Preset::Red => "red",
            Preset::Blue => "blue",
            Preset::Green => "green",
            Preset::DualColorWave => "dual colour wave",
            Preset::Cyan => "cyan",
            Preset::Magenta => "magenta",
            Preset::TeamColorWave => "team colour wave",
            Preset::Fire => "fire",
            Preset::Rainbow => "rainbow",
        })
    }
}

/// Arduino style integer range mapping.
fn map(x: u32, in_max: u32, out_max: u32) -> u32 {
    x * out_max / in_max
}

/// Gamma 2.2 lookup for 8 bit levels.
///
/// Stored normalized to 16 bits and scaled at lookup, so each effect picks
/// its own output range without rebuilding the table.
pub struct GammaTable {
    lut: [u16; 256],
}

impl Default for GammaTable {
    fn default() -> Self {
        Self::new()
    }
}

impl GammaTable {
    #[must_use]
    pub fn new() -> Self {
        let mut lut = [0u16; 256];
        for (i, v) in lut.iter_mut().enumerate() {
            let x = i as f32 / 255.0;
            let y = if i == 0 {
                0.0
            } else {
                F32Ext::powf(x, GAMMA) * f32::from(u16::MAX)
            };
            *v = y.clamp(0.0, f32::from(u16::MAX)) as u16;
        }
        Self { lut }
    }

    /// Perceptually linear PWM value in `0..=max` for `level`.
    #[must_use]
    pub fn apply(&self, level: u8, max: u16) -> u16 {
        (u32::from(self.lut[usize::from(level)]) * u32::from(max) / u32::from(u16::MAX)) as u16
    }
}

/// A sine phase advanced on its own interval.
struct Wave {
    timer: Interval,
    phase: f32,
    increment: f32,
}

impl Wave {
    const fn new(period: Millis, increment: f32) -> Self {
        Self {
            timer: Interval::new(period),
            phase: 0.0,
            increment,
        }
    }

    /// The phase to draw this update, or `None` if not yet due.
    fn tick(&mut self, now: Millis) -> Option<f32> {
        if !self.timer.fire(now) {
            return None;
        }
        let phase = self.phase;
        self.phase += self.increment;
        if self.phase >= TAU {
            self.phase -= TAU;
        }
        Some(phase)
    }
}

/// Sine normalized to 0..=1, with each unit one radian further along.
fn unit_wave(phase: f32, unit: usize) -> f32 {
    F32Ext::sin(phase + unit as f32) * 0.5 + 0.5
}

fn solid(rgb: [u16; 3]) -> LightFrame {
    [rgb; UNITS]
}

struct Fire {
    timer: Interval,
    rng: StdRand,
}

impl Fire {
    const BASE: [u32; 3] = [200, 60, 0];
    /// Exclusive upper bound of the random boost added per channel.
    const FLICKER: [u16; 3] = [55, 40, 20];
    const FIRST_INTERVAL_MS: Millis = 50;
    const INTERVAL_MS: core::ops::Range<u16> = 30..150;

    fn tick(&mut self, now: Millis, gamma: &GammaTable, brightness: u16) -> Option<LightFrame> {
        if !self.timer.fire(now) {
            return None;
        }
        self.timer
            .set_period(Millis::from(self.rng.next_range(Self::INTERVAL_MS)));

        let mut frame = [[0; 3]; UNITS];
        for unit in frame.iter_mut() {
            for ((out, base), flicker) in unit.iter_mut().zip(Self::BASE).zip(Self::FLICKER) {
                // Round trip through the 12 bit scale drops a count, which
                // keeps the ember slightly darker than the nominal base.
                let level = map(map(base, 255, u32::from(PWM_MAX)), u32::from(PWM_MAX), 255);
                let lit = gamma.apply(level as u8, brightness);
                let noise: u16 = self.rng.next_range(0..flicker);
                *out = lit.saturating_add(noise).min(PWM_MAX);
            }
        }
        Some(frame)
    }
}

/// Owner of every effect's private state.
pub struct EffectEngine {
    gamma: GammaTable,
    dual: Wave,
    team: Wave,
    rainbow: Wave,
    fire: Fire,
}

impl EffectEngine {
    /// `seed` feeds the fire flicker; anything that differs between boots
    /// will do.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            gamma: GammaTable::new(),
            dual: Wave::new(10, 0.3 * 0.05),
            team: Wave::new(1, 0.3 * 0.02),
            rainbow: Wave::new(20, 0.02),
            fire: Fire {
                timer: Interval::new(Fire::FIRST_INTERVAL_MS),
                rng: StdRand::seed(seed),
            },
        }
    }

    /// Run the active preset for this pass.  `None` means leave the LEDs as
    /// they are.
    pub fn advance(&mut self, preset: Preset, brightness: u16, now: Millis) -> Option<LightFrame> {
        match preset {
            Preset::Off => None,
            Preset::Red => Some(solid([brightness, 0, 0])),
            Preset::Green => Some(solid([0, brightness, 0])),
            Preset::Blue => Some(solid([0, 0, brightness])),
            Preset::Cyan => {
                let on = self.gamma.apply(255, brightness);
                Some(solid([self.gamma.apply(0, brightness), on, on]))
            }
            Preset::Magenta => {
                let on = self.gamma.apply(255, brightness);
                Some(solid([on, self.gamma.apply(0, brightness), on]))
            }
            Preset::DualColorWave => self
                .dual
                .tick(now)
                .map(|phase| dual_color_wave(phase, brightness)),
            Preset::TeamColorWave => {
                let gamma = &self.gamma;
                self.team
                    .tick(now)
                    .map(|phase| team_color_wave(gamma, phase, brightness))
            }
            Preset::Fire => self.fire.tick(now, &self.gamma, brightness),
            Preset::Rainbow => {
                let gamma = &self.gamma;
                self.rainbow
                    .tick(now)
                    .map(|phase| rainbow(gamma, phase, brightness))
            }
        }
    }
}

/// Yellow on even units, orange on odd, scaled linearly without gamma.
fn dual_color_wave(phase: f32, brightness: u16) -> LightFrame {
    let mut frame = [[0; 3]; UNITS];
    for (n, unit) in frame.iter_mut().enumerate() {
        let raw = unit_wave(phase, n);
        let green = if n % 2 == 0 { 220.0 } else { 20.0 };
        let rgb8 = [(255.0 * raw) as u32, (green * raw) as u32, 0];
        for (out, level) in unit.iter_mut().zip(rgb8) {
            *out = map(level, 255, u32::from(brightness)) as u16;
        }
    }
    frame
}

/// Gold on even units, purple on odd.  Brightness sets the 8 bit level,
/// which saturates from 255 up.
fn team_color_wave(gamma: &GammaTable, phase: f32, brightness: u16) -> LightFrame {
    let mut frame = [[0; 3]; UNITS];
    for (n, unit) in frame.iter_mut().enumerate() {
        let level = (unit_wave(phase, n) * f32::from(brightness)) as u32;
        let level = level.min(255) as u8;
        let rgb8 = if n % 2 == 0 {
            [level, level, 0]
        } else {
            [level, 0, level]
        };
        for (out, level) in unit.iter_mut().zip(rgb8) {
            *out = gamma.apply(level, GAMMA_MAX);
        }
    }
    frame
}

/// Three sines 2 rad apart per unit, with the 8 bit level capped by
/// brightness.
fn rainbow(gamma: &GammaTable, phase: f32, brightness: u16) -> LightFrame {
    let ceiling = u32::from(brightness.min(255));
    let mut frame = [[0; 3]; UNITS];
    for (n, unit) in frame.iter_mut().enumerate() {
        let p = phase + n as f32;
        for (out, offset) in unit.iter_mut().zip([0.0, 2.0, 4.0]) {
            let level = (F32Ext::sin(p + offset) * 127.0 + 128.0) as i32;
            let level = level.clamp(0, 255) as u32;
            *out = gamma.apply(map(level, 255, ceiling) as u8, GAMMA_MAX);
        }
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The frame `preset` draws at `now`, which must be an update.
    fn drawn(fx: &mut EffectEngine, preset: Preset, brightness: u16, now: Millis) -> LightFrame {
        let Some(frame) = fx.advance(preset, brightness, now) else {
            panic!("{} drew nothing at {now} ms", preset as u8);
        };
        frame
    }

    /// Brightest channel over `updates` consecutive updates of `preset`.
    fn peak(preset: Preset, brightness: u16, period: Millis, updates: Millis) -> u16 {
        let mut fx = EffectEngine::new(1);
        (1..=updates)
            .map(|n| drawn(&mut fx, preset, brightness, n * period))
            .flat_map(|frame| frame.into_iter().flatten())
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn preset_codes_round_trip() {
        for code in 0..=9u8 {
            assert_eq!(Preset::try_from(code).map(|p| p as u8), Ok(code));
        }
        assert_eq!(Preset::try_from(10), Err(10));
        assert_eq!(Preset::try_from(255), Err(255));
    }

    #[test]
    fn gamma_spans_zero_to_max() {
        let gamma = GammaTable::new();
        assert_eq!(gamma.apply(0, 4095), 0);
        assert!(gamma.apply(255, 1000) >= 990);
        assert!(gamma.apply(255, 1000) <= 1000);
        // (128 / 255) ^ 2.2 is about 0.22
        let mid = gamma.apply(128, 4095);
        assert!((850..=950).contains(&mid), "mid = {mid}");
    }

    #[test]
    fn static_colours_follow_brightness() {
        let mut fx = EffectEngine::new(1);
        assert_eq!(fx.advance(Preset::Red, 1400, 0), Some([[1400, 0, 0]; UNITS]));
        assert_eq!(fx.advance(Preset::Green, 100, 0), Some([[0, 100, 0]; UNITS]));
        assert_eq!(fx.advance(Preset::Blue, 4095, 7), Some([[0, 0, 4095]; UNITS]));
        let cyan = drawn(&mut fx, Preset::Cyan, 2000, 0);
        assert_eq!(cyan[0][0], 0);
        assert!(cyan[0][1] > 1980 && cyan[0][1] == cyan[0][2]);
        let magenta = drawn(&mut fx, Preset::Magenta, 2000, 0);
        assert_eq!(magenta[3][1], 0);
        assert_eq!(magenta[3][0], magenta[3][2]);
    }

    #[test]
    fn off_leaves_leds_alone() {
        let mut fx = EffectEngine::new(1);
        assert_eq!(fx.advance(Preset::Off, 1000, 12_345), None);
    }

    #[test]
    fn dual_wave_updates_on_its_own_interval() {
        let mut fx = EffectEngine::new(1);
        assert!(fx.advance(Preset::DualColorWave, 1000, 5).is_none());
        let first = drawn(&mut fx, Preset::DualColorWave, 1000, 10);
        assert!(fx.advance(Preset::DualColorWave, 1000, 15).is_none());
        let second = drawn(&mut fx, Preset::DualColorWave, 1000, 20);
        assert_ne!(first, second);
        for unit in first {
            assert!(unit.iter().all(|&c| c <= 1000));
            assert_eq!(unit[2], 0);
        }
        // Phase zero, unit zero: sin(0) = 0 so half intensity yellow.
        assert!((495..=505).contains(&first[0][0]), "red = {}", first[0][0]);
        // Even units lean yellow, odd units orange.
        assert!(first[0][1] > first[0][0] / 2);
        assert!(first[1][1] < first[1][0] / 4);
    }

    #[test]
    fn team_wave_alternates_gold_and_purple() {
        let mut fx = EffectEngine::new(1);
        let frame = drawn(&mut fx, Preset::TeamColorWave, 3000, 1);
        assert_eq!(frame[0][2], 0);
        assert_eq!(frame[1][1], 0);
        assert_eq!(frame[0][0], frame[0][1]);
        assert_eq!(frame[1][0], frame[1][2]);
        assert!(frame.iter().flatten().all(|&c| c <= GAMMA_MAX));
    }

    #[test]
    fn fire_stays_in_bounds_and_rerolls_interval() {
        let mut fx = EffectEngine::new(0xF1E);
        let gamma = GammaTable::new();
        let base = [199u8, 59, 0].map(|l| gamma.apply(l, 1000));
        let mut updates = 0;
        let mut last_update: Millis = 0;
        for now in 1..5_000 {
            if let Some(frame) = fx.advance(Preset::Fire, 1000, now) {
                if updates > 0 {
                    let gap = now - last_update;
                    assert!((30..150).contains(&gap), "gap = {gap}");
                }
                for unit in frame {
                    for (c, (&value, &lo)) in unit.iter().zip(base.iter()).enumerate() {
                        assert!(value >= lo);
                        assert!(value < lo + Fire::FLICKER[c]);
                    }
                }
                updates += 1;
                last_update = now;
            }
        }
        assert!(updates > 30);
    }

    #[test]
    fn rainbow_stays_under_gamma_ceiling() {
        let mut fx = EffectEngine::new(1);
        let bright = drawn(&mut fx, Preset::Rainbow, 4095, 20);
        assert!(bright.iter().flatten().all(|&c| c <= GAMMA_MAX));
        assert!(bright.iter().flatten().any(|&c| c > GAMMA_MAX / 2));
    }

    #[test]
    fn level_scaled_effects_apply_brightness_once() {
        // Brightness 100 caps the level near 99, and (99 / 255) ^ 2.2 of
        // 1000 is about 124.
        let rainbow = peak(Preset::Rainbow, 100, 20, 2000);
        assert!((110..=130).contains(&rainbow), "rainbow peak = {rainbow}");
        let team = peak(Preset::TeamColorWave, 100, 1, 2000);
        assert!((110..=130).contains(&team), "team peak = {team}");

        let rainbow = peak(Preset::Rainbow, 4095, 20, 2000);
        assert!((950..=GAMMA_MAX).contains(&rainbow), "rainbow peak = {rainbow}");
        let team = peak(Preset::TeamColorWave, 4095, 1, 2000);
        assert!((950..=GAMMA_MAX).contains(&team), "team peak = {team}");
    }

    #[test]
    fn effects_keep_independent_phase() {
        let mut fx = EffectEngine::new(1);
        let a = drawn(&mut fx, Preset::Rainbow, 4095, 20);
        // Time spent in another preset does not move the rainbow on.
        for now in 21..400 {
            fx.advance(Preset::DualColorWave, 4095, now);
        }
        let mut fresh = EffectEngine::new(1);
        fresh.advance(Preset::Rainbow, 4095, 20);
        assert_eq!(
            fx.advance(Preset::Rainbow, 4095, 400),
            fresh.advance(Preset::Rainbow, 4095, 400)
        );
        assert_ne!(Some(a), fresh.advance(Preset::Rainbow, 4095, 420));
    }
}
