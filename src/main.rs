/*
 Nixie tube clock firmware.

 Four nixie tubes driven through two shift registers and BCD decoders, a
 fading neon colon, four RGB LEDs under the tubes on a PCA9685, a DS3231
 real time clock and an NEC infrared remote.

 Target: ATmega328P (Arduino Nano), clock at 16 MHz.

 This program is free software: you can redistribute it and/or modify
 it under the terms of the GNU General Public License as published by
 the Free Software Foundation, either version 3 of the License, or
 (at your option) any later version.

 This program is distributed in the hope that it will be useful,
 but WITHOUT ANY WARRANTY; without even the implied warranty of
 MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 GNU General Public License for more details.

 You should have received a copy of the GNU General Public License
 along with this program.  If not, see <http://www.gnu.org/licenses/>.

 Connections:
   - D4   shift register data
   - D5   shift register clock
   - D6   shift register latch
   - D9   IR receiver output
   - D10  colon neon driver
   - A4   I2C SDA (DS3231, PCA9685)
   - A5   I2C SCL
   - D0/1 serial: diagnostics out, time sync in
 */

#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]

use core::cell::RefCell;

use arduino_hal::prelude::*;
use arduino_hal::simple_pwm::{IntoPwmPin, Prescaler, Timer1Pwm};
use embedded_hal_bus::i2c::RefCellDevice;

use nixieclock::ds3231::Ds3231;
use nixieclock::pc_sync::PcSync;
use nixieclock::pca9685::{Pca9685, PWM_ADDRESS};
use nixieclock::scheduler::{NixieClock, Peripherals};
use nixieclock::shift_register::ShiftRegister;

mod board;
mod ir;
#[cfg(feature = "panic-serial")]
mod panic;
mod timer;

#[cfg(not(feature = "panic-serial"))]
use panic_halt as _;

use board::{ColonPwm, EepromStore};
use ir::IrRemote;

pub const BAUD_RATE: u32 = 9600;

const I2C_SPEED: u32 = 100_000;

/// RGB LED PWM frequency.
const LED_PWM_HZ: u32 = 1000;

#[arduino_hal::entry]
fn main() -> ! {
    let dp = arduino_hal::Peripherals::take().unwrap();
    let pins = arduino_hal::pins!(dp);
    let serial = arduino_hal::default_serial!(dp, pins, BAUD_RATE);
    let (mut rx, mut tx) = serial.split();

    timer::init(dp.TC0);

    let digits = ShiftRegister::new(
        pins.d4.into_output(),
        pins.d5.into_output(),
        pins.d6.into_output(),
    );

    let timer1 = Timer1Pwm::new(dp.TC1, Prescaler::Prescale64);
    let mut colon = pins.d10.into_output().into_pwm(&timer1);
    colon.enable();

    let remote = IrRemote::new(dp.TC2, &dp.EXINT, pins.d9);

    let i2c = RefCell::new(arduino_hal::I2c::new(
        dp.TWI,
        pins.a4.into_pull_up_input(),
        pins.a5.into_pull_up_input(),
        I2C_SPEED,
    ));

    let mut lighting = Pca9685::new(RefCellDevice::new(&i2c), PWM_ADDRESS);
    if lighting
        .init(&mut arduino_hal::Delay::new(), LED_PWM_HZ)
        .is_err()
    {
        ufmt::uwriteln!(&mut tx, "PCA9685 init failed\r").unwrap_infallible();
    }

    // SAFETY: every interrupt's shared state is set up above.
    unsafe { avr_device::interrupt::enable() };

    let hw = Peripherals {
        clock: Ds3231::new(RefCellDevice::new(&i2c)),
        store: EepromStore(arduino_hal::Eeprom::new(dp.EEPROM)),
        remote,
        digits,
        lighting,
        colon: ColonPwm(colon),
        log: tx,
    };

    // Without the RTC there is no time to show.
    let Ok(mut clock) = NixieClock::new(hw) else {
        loop {
            avr_device::asm::sleep();
        }
    };

    let mut sync = PcSync::new();

    loop {
        clock.run_pass(timer::millis());

        if let Ok(byte) = rx.read() {
            if let Some(reading) = sync.feed(byte) {
                if clock.set_time(&reading).is_err() {
                    ufmt::uwriteln!(&mut clock.peripherals_mut().log, "RTC adjust failed\r")
                        .unwrap_infallible();
                }
            }
        }
    }
}
