//! Two daisy chained 8 bit shift registers feeding the BCD decoders.
//!
//! Each byte carries two tubes, high nibble first.  The latch is held low
//! for the whole transfer and the transfer runs inside a critical section,
//! so the tubes only ever see a complete frame.

use embedded_hal::digital::OutputPin;

use crate::digits::DigitFrame;
use crate::ports::DigitOutput;

pub struct ShiftRegister<D, C, L> {
    data: D,
    clock: C,
    latch: L,
}

impl<D, C, L> ShiftRegister<D, C, L>
where
    D: OutputPin,
    C: OutputPin<Error = D::Error>,
    L: OutputPin<Error = D::Error>,
{
    pub fn new(data: D, clock: C, latch: L) -> Self {
        Self { data, clock, latch }
    }

    /// Clock out one byte, most significant bit first.
    fn shift_out(&mut self, byte: u8) -> Result<(), D::Error> {
        for bit in (0..8).rev() {
            if byte & (1 << bit) != 0 {
                self.data.set_high()?;
            } else {
                self.data.set_low()?;
            }
            self.clock.set_high()?;
            self.clock.set_low()?;
        }
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), D::Error> {
        critical_section::with(|_| {
            self.latch.set_low()?;
            for &b in bytes {
                self.shift_out(b)?;
            }
            self.latch.set_high()
        })
    }
}

impl<D, C, L> DigitOutput for ShiftRegister<D, C, L>
where
    D: OutputPin,
    C: OutputPin<Error = D::Error>,
    L: OutputPin<Error = D::Error>,
{
    type Error = D::Error;

    fn write_frame(&mut self, frame: &DigitFrame) -> Result<(), Self::Error> {
        self.write_bytes(&frame.to_shift_bytes())
    }
}
