//! Shared SPI master
//!
//! One bus object serves every device wired to it. Devices take turns
//! through an advisory lock and each applies its own clock settings before
//! talking, so the bus is reconfigured per transaction rather than once.

/// SPI master shared between devices
///
/// Lock before configuring or transferring; see
/// [`SpiDevice`](crate::SpiDevice) for the usual way to do both.
pub trait SpiBus {
    type Error;

    /// Try to take the bus lock
    ///
    /// Returns `false` if another device currently holds the bus.
    fn try_lock(&mut self) -> bool;

    /// Release the bus lock
    fn unlock(&mut self);

    /// Check if the bus lock is held
    fn has_lock(&self) -> bool;

    /// Apply clock and framing settings for the next transfers
    fn configure(&mut self, config: &SpiConfig) -> Result<(), Self::Error>;

    /// Full-duplex transfer; `read` and `write` have equal lengths
    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error>;

    /// Clock out `data`, discarding whatever comes back
    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Read data (writes `write_value` for every byte)
    fn read(&mut self, buf: &mut [u8], write_value: u8) -> Result<(), Self::Error>;

    /// Full-duplex transfer that overwrites `data` with the reply
    fn transfer_in_place(&mut self, data: &mut [u8]) -> Result<(), Self::Error>;
}

/// Clock and framing for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiConfig {
    /// SCK rate in Hz
    pub frequency: u32,
    pub polarity: Polarity,
    pub phase: Phase,
    /// Word size
    pub bits: u8,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            frequency: 100_000,
            polarity: Polarity::IdleLow,
            phase: Phase::CaptureOnFirstTransition,
            bits: 8,
        }
    }
}

/// Idle level of SCK
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// CPOL=0
    #[default]
    IdleLow,
    /// CPOL=1
    IdleHigh,
}

impl From<u8> for Polarity {
    fn from(value: u8) -> Self {
        if value == 0 {
            Polarity::IdleLow
        } else {
            Polarity::IdleHigh
        }
    }
}

/// Which SCK edge samples data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// CPHA=0, sample on the leading edge
    #[default]
    CaptureOnFirstTransition,
    /// CPHA=1, sample on the trailing edge
    CaptureOnSecondTransition,
}

impl From<u8> for Phase {
    fn from(value: u8) -> Self {
        if value == 0 {
            Phase::CaptureOnFirstTransition
        } else {
            Phase::CaptureOnSecondTransition
        }
    }
}
