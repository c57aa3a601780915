//! RP2040-specific HAL for the display firmware
//!
//! This crate provides RP2040 implementations of the shared `fbio-hal`
//! traits:
//!
//! - Blocking SPI master with a cooperative bus lock
//! - Chip select and data/command output pins
//! - Millisecond clock on top of `embassy-time`
//! - Dynamic pin allocation for config-driven setup

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod pins;
pub mod spi;
pub mod time;

pub use gpio::{ChipSelectPin, RpOutputPin};
pub use pins::{PinBank, PinBankPeripherals, PinError, RemainingPeripherals};
pub use spi::RpSpiBus;
pub use time::EmbassyClock;
