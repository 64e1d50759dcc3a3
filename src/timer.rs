//! Millisecond clock on TC0, the equivalent of Arduino's `millis()`.
//!
//! Based on https://blog.rahix.de/005-avr-hal-millis/ (MIT)
//!
//! The count is 32 bits and wraps after about 49.7 days.  Everything that
//! consumes it compares timestamps with wrapping subtraction, so the wrap
//! is harmless.

use avr_device::interrupt::Mutex;
use core::cell::Cell;

use nixieclock::interval::Millis;

// 16 MHz / 64 (prescaler) / 250 = 1 kHz
const COUNTS_PER_MS: u8 = 250;

static MILLIS: Mutex<Cell<Millis>> = Mutex::new(Cell::new(0));

#[avr_device::interrupt(atmega328p)]
fn TIMER0_COMPA() {
    avr_device::interrupt::free(|cs| {
        let millis = MILLIS.borrow(cs);
        millis.set(millis.get().wrapping_add(1));
    })
}

/// Milliseconds since [`init`].
pub fn millis() -> Millis {
    avr_device::interrupt::free(|cs| MILLIS.borrow(cs).get())
}

/// Run TC0 in CTC mode with a compare match interrupt every millisecond.
/// Takes effect once interrupts are enabled.
pub fn init(tc0: arduino_hal::pac::TC0) {
    tc0.tccr0a.write(|w| w.wgm0().ctc());
    // The counter runs 0..=OCR0A.
    tc0.ocr0a.write(|w| w.bits(COUNTS_PER_MS - 1));
    tc0.tccr0b.write(|w| w.cs0().prescale_64());
    tc0.timsk0.write(|w| w.ocie0a().set_bit());

    avr_device::interrupt::free(|cs| MILLIS.borrow(cs).set(0));
}
