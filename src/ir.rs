//! Infrared remote receiver.
//!
//! The receiver output on D9 (PB1) raises a pin change interrupt on every
//! edge.  The ISR timestamps the edge with a 20 kHz tick counted by TC2 and
//! hands it to the `infrared` NEC decoder.  A completed press is parked in
//! a single slot until the control loop acknowledges it; presses arriving
//! before that are dropped, as are NEC repeat frames.

use avr_device::interrupt::Mutex;
use core::cell::{Cell, RefCell};
use core::convert::Infallible;

use arduino_hal::hal::port::PB1;
use arduino_hal::port::mode::{Floating, Input};
use arduino_hal::port::Pin;
use infrared::protocol::Nec;
use infrared::Receiver;

use nixieclock::command::nec_raw;
use nixieclock::ports::CommandSource;

type IrPin = Pin<Input<Floating>, PB1>;

/// Sample clock handed to the decoder, one tick per 50 µs.
const TICK_HZ: u32 = 20_000;

// 16 MHz / 8 (prescaler) / 100 = 20 kHz
const TICK_COUNTS: u32 = 100;

static TICKS: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));
static RECEIVER: Mutex<RefCell<Option<Receiver<Nec, IrPin>>>> = Mutex::new(RefCell::new(None));
static CODE: Mutex<Cell<Option<u32>>> = Mutex::new(Cell::new(None));

#[avr_device::interrupt(atmega328p)]
fn TIMER2_COMPA() {
    avr_device::interrupt::free(|cs| {
        let ticks = TICKS.borrow(cs);
        ticks.set(ticks.get().wrapping_add(1));
    })
}

#[avr_device::interrupt(atmega328p)]
fn PCINT0() {
    avr_device::interrupt::free(|cs| {
        let now = TICKS.borrow(cs).get();
        let mut receiver = RECEIVER.borrow(cs).borrow_mut();
        let Some(receiver) = receiver.as_mut() else {
            return;
        };
        // Ok(None) is a partial frame, Err(_) a decode error: both ignored.
        if let Ok(Some(cmd)) = receiver.event_instant(now) {
            let slot = CODE.borrow(cs);
            if !cmd.repeat && slot.get().is_none() {
                slot.set(Some(nec_raw(cmd.addr, cmd.cmd)));
            }
        }
    })
}

/// Handle for the control loop.  Only one exists.
pub struct IrRemote {
    _private: (),
}

impl IrRemote {
    /// Start the tick timer and the pin change interrupt for D9.
    pub fn new(tc2: arduino_hal::pac::TC2, exint: &arduino_hal::pac::EXINT, pin: IrPin) -> Self {
        tc2.tccr2a.write(|w| w.wgm2().ctc());
        tc2.ocr2a.write(|w| w.bits((TICK_COUNTS - 1) as u8));
        tc2.tccr2b.write(|w| w.cs2().prescale_8());
        tc2.timsk2.write(|w| w.ocie2a().set_bit());

        avr_device::interrupt::free(|cs| {
            RECEIVER
                .borrow(cs)
                .replace(Some(Receiver::with_pin(TICK_HZ, pin)));
        });

        // PCIE0 covers PB0-PB7; PCINT1 is PB1.
        exint.pcicr.modify(|r, w| unsafe { w.bits(r.bits() | 0b001) });
        exint.pcmsk0.modify(|r, w| unsafe { w.bits(r.bits() | 0b10) });

        Self { _private: () }
    }
}

impl CommandSource for IrRemote {
    type Error = Infallible;

    fn poll_command(&mut self) -> nb::Result<u32, Self::Error> {
        avr_device::interrupt::free(|cs| CODE.borrow(cs).get()).ok_or(nb::Error::WouldBlock)
    }

    fn acknowledge(&mut self) {
        avr_device::interrupt::free(|cs| CODE.borrow(cs).set(None));
    }
}
