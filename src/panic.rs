// Based on https://github.com/Rahix/avr-hal/blob/main/examples/arduino-uno/src/bin/uno-panic.rs
// License MIT

use arduino_hal::prelude::*;

use nixieclock::digits::DigitFrame;
use nixieclock::ports::DigitOutput;
use nixieclock::shift_register::ShiftRegister;

use crate::BAUD_RATE;

/// Blank the tubes, so a dead clock does not sit there showing a plausible
/// time, then report the panic location over serial and stop.
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    avr_device::interrupt::disable();

    // SAFETY: we're never returning so stealing the peripherals is ok
    let dp = unsafe { arduino_hal::Peripherals::steal() };
    let pins = arduino_hal::pins!(dp);

    let mut tubes = ShiftRegister::new(
        pins.d4.into_output(),
        pins.d5.into_output(),
        pins.d6.into_output(),
    );
    tubes.write_frame(&DigitFrame::BLANK).unwrap_infallible();

    let mut serial = arduino_hal::default_serial!(dp, pins, BAUD_RATE);
    match info.location() {
        Some(loc) => ufmt::uwriteln!(
            &mut serial,
            "panic at {}:{}:{}\r",
            loc.file(),
            loc.line(),
            loc.column(),
        )
        .unwrap_infallible(),
        None => ufmt::uwriteln!(&mut serial, "panic\r").unwrap_infallible(),
    }

    loop {
        avr_device::asm::sleep();
    }
}
