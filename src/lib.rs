//! Nixie tube clock firmware library.
//!
//! Everything that does not touch ATmega328P registers lives here so it can
//! be unit tested on the host with `cargo test --no-default-features`.  The
//! firmware binary wires these pieces to the board.

#![cfg_attr(not(test), no_std)]

pub mod colon;
pub mod command;
pub mod digits;
pub mod ds3231;
pub mod effects;
pub mod interval;
pub mod pc_sync;
pub mod pca9685;
pub mod poison;
pub mod ports;
pub mod scheduler;
pub mod settings;
pub mod shift_register;
pub mod time;
