//! Blocking SPI master
//!
//! Wraps an embassy-rp SPI peripheral in blocking mode. The lock is advisory
//! and only meaningful between devices sharing this bus object; it is not a
//! cross-core mutex.

use embassy_rp::spi::{self, Blocking, Instance, Spi};
use fbio_hal::spi::{Phase, Polarity, SpiBus, SpiConfig};

/// SPI bus errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RpSpiError {
    /// The peripheral only moves 8-bit words in blocking mode
    UnsupportedWordSize(u8),
    /// Transfer failed
    Transfer,
}

impl From<spi::Error> for RpSpiError {
    fn from(_: spi::Error) -> Self {
        RpSpiError::Transfer
    }
}

/// SPI bus on an RP2040 SPI block
pub struct RpSpiBus<'d, T: Instance> {
    spi: Spi<'d, T, Blocking>,
    locked: bool,
    /// Last applied settings, to skip redundant reconfiguration
    current: Option<SpiConfig>,
}

impl<'d, T: Instance> RpSpiBus<'d, T> {
    pub fn new(spi: Spi<'d, T, Blocking>) -> Self {
        Self {
            spi,
            locked: false,
            current: None,
        }
    }
}

fn to_rp_config(config: &SpiConfig) -> spi::Config {
    let mut rp = spi::Config::default();
    rp.frequency = config.frequency;
    rp.polarity = match config.polarity {
        Polarity::IdleLow => spi::Polarity::IdleLow,
        Polarity::IdleHigh => spi::Polarity::IdleHigh,
    };
    rp.phase = match config.phase {
        Phase::CaptureOnFirstTransition => spi::Phase::CaptureOnFirstTransition,
        Phase::CaptureOnSecondTransition => spi::Phase::CaptureOnSecondTransition,
    };
    rp
}

impl<'d, T: Instance> SpiBus for RpSpiBus<'d, T> {
    type Error = RpSpiError;

    fn try_lock(&mut self) -> bool {
        if self.locked {
            return false;
        }
        self.locked = true;
        true
    }

    fn unlock(&mut self) {
        self.locked = false;
    }

    fn has_lock(&self) -> bool {
        self.locked
    }

    fn configure(&mut self, config: &SpiConfig) -> Result<(), Self::Error> {
        if config.bits != 8 {
            return Err(RpSpiError::UnsupportedWordSize(config.bits));
        }
        if self.current.as_ref() == Some(config) {
            return Ok(());
        }
        self.spi.set_config(&to_rp_config(config));
        self.current = Some(*config);
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        self.spi.blocking_transfer(read, write)?;
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.spi.blocking_write(data)?;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8], write_value: u8) -> Result<(), Self::Error> {
        buf.fill(write_value);
        self.spi.blocking_transfer_in_place(buf)?;
        Ok(())
    }

    fn transfer_in_place(&mut self, data: &mut [u8]) -> Result<(), Self::Error> {
        self.spi.blocking_transfer_in_place(data)?;
        Ok(())
    }
}
