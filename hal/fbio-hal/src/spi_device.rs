//! Per-device access to a shared SPI bus
//!
//! Several peripherals can hang off one SPI bus, each with its own chip
//! select and clock settings. An [`SpiDevice`] takes the bus lock, applies
//! its settings and asserts its chip select for the duration of one
//! transaction, then hands the bus back.

use core::cell::RefCell;

use crate::gpio::{ConfigurablePin, DriveMode, OutputPin, PinModeError};
use crate::spi::{Phase, Polarity, SpiBus, SpiConfig};
use crate::time::Background;

/// Settings applied to the bus at the start of every transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiDeviceConfig {
    /// Clock frequency in Hz
    pub baudrate: u32,
    /// Clock polarity
    pub polarity: Polarity,
    /// Clock phase
    pub phase: Phase,
    /// Clock cycles sent after chip select is released (rounded up to bytes)
    pub extra_clocks: u8,
}

impl Default for SpiDeviceConfig {
    fn default() -> Self {
        Self {
            baudrate: 100_000,
            polarity: Polarity::IdleLow,
            phase: Phase::CaptureOnFirstTransition,
            extra_clocks: 0,
        }
    }
}

impl SpiDeviceConfig {
    /// Bus settings for a transaction
    pub fn bus_config(&self) -> SpiConfig {
        SpiConfig {
            frequency: self.baudrate,
            polarity: self.polarity,
            phase: self.phase,
            bits: 8,
        }
    }

    /// Number of 0xFF bytes needed to clock out `extra_clocks` cycles
    pub fn extra_clock_bytes(&self) -> u16 {
        (u16::from(self.extra_clocks) + 7) / 8
    }
}

/// SPI device errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiDeviceError<E> {
    /// Chip select pin cannot be driven as an output
    InputOnly,
    /// Underlying bus error
    Bus(E),
}

impl<E> From<PinModeError> for SpiDeviceError<E> {
    fn from(err: PinModeError) -> Self {
        match err {
            PinModeError::InputOnly => SpiDeviceError::InputOnly,
        }
    }
}

/// Placeholder for devices without a chip select line
#[derive(Debug, Clone, Copy, Default)]
pub struct NoChipSelect;

impl OutputPin for NoChipSelect {
    fn set_high(&mut self) {}

    fn set_low(&mut self) {}

    fn is_set_high(&self) -> bool {
        true
    }
}

impl ConfigurablePin for NoChipSelect {
    fn switch_to_output(&mut self, _initial_high: bool, _mode: DriveMode) -> Result<(), PinModeError> {
        Ok(())
    }
}

/// A single device on a shared SPI bus
pub struct SpiDevice<'a, B, CS> {
    bus: &'a RefCell<B>,
    chip_select: Option<CS>,
    config: SpiDeviceConfig,
}

impl<'a, B, CS> SpiDevice<'a, B, CS>
where
    B: SpiBus,
    CS: ConfigurablePin,
{
    /// Create a device on `bus`
    ///
    /// If a chip select is given it is switched to a push-pull output and
    /// driven high (deselected).
    pub fn new(
        bus: &'a RefCell<B>,
        chip_select: Option<CS>,
        config: SpiDeviceConfig,
    ) -> Result<Self, SpiDeviceError<B::Error>> {
        let mut chip_select = chip_select;
        if let Some(cs) = chip_select.as_mut() {
            cs.switch_to_output(true, DriveMode::PushPull)?;
        }

        Ok(Self {
            bus,
            chip_select,
            config,
        })
    }

    /// Device settings
    pub fn config(&self) -> &SpiDeviceConfig {
        &self.config
    }

    /// Begin a transaction
    ///
    /// Waits for the bus lock, running `background` while another device
    /// holds it, then configures the bus and selects this device.
    pub fn acquire<BG: Background>(
        &mut self,
        background: &mut BG,
    ) -> Result<SpiTransaction<'_, 'a, B, CS>, SpiDeviceError<B::Error>> {
        while !self.bus.borrow_mut().try_lock() {
            background.run();
        }

        {
            let mut bus = self.bus.borrow_mut();
            if let Err(e) = bus.configure(&self.config.bus_config()) {
                bus.unlock();
                return Err(SpiDeviceError::Bus(e));
            }
        }

        if let Some(cs) = self.chip_select.as_mut() {
            cs.set_low();
        }

        Ok(SpiTransaction {
            device: self,
            released: false,
        })
    }

    /// Tear the device down, returning the chip select pin
    pub fn free(self) -> Option<CS> {
        self.chip_select
    }
}

/// An in-progress transaction holding the bus
///
/// Call [`SpiTransaction::release`] to end the transaction and observe bus
/// errors from the trailing clocks. Dropping the guard also releases, but
/// discards those errors.
pub struct SpiTransaction<'d, 'a, B, CS>
where
    B: SpiBus,
    CS: ConfigurablePin,
{
    device: &'d mut SpiDevice<'a, B, CS>,
    released: bool,
}

impl<B, CS> SpiTransaction<'_, '_, B, CS>
where
    B: SpiBus,
    CS: ConfigurablePin,
{
    /// Write data without reading
    pub fn write(&mut self, data: &[u8]) -> Result<(), B::Error> {
        self.device.bus.borrow_mut().write(data)
    }

    /// Read data, clocking out `write_value`
    pub fn read(&mut self, buf: &mut [u8], write_value: u8) -> Result<(), B::Error> {
        self.device.bus.borrow_mut().read(buf, write_value)
    }

    /// Simultaneous read/write
    pub fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), B::Error> {
        self.device.bus.borrow_mut().transfer(read, write)
    }

    /// Simultaneous read/write in one buffer
    pub fn transfer_in_place(&mut self, data: &mut [u8]) -> Result<(), B::Error> {
        self.device.bus.borrow_mut().transfer_in_place(data)
    }

    /// End the transaction
    pub fn release(mut self) -> Result<(), B::Error> {
        self.finish()
    }

    fn finish(&mut self) -> Result<(), B::Error> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        if let Some(cs) = self.device.chip_select.as_mut() {
            cs.set_high();
        }

        let mut bus = self.device.bus.borrow_mut();
        let mut result = Ok(());
        for _ in 0..self.device.config.extra_clock_bytes() {
            if let Err(e) = bus.write(&[0xFF]) {
                result = Err(e);
                break;
            }
        }
        bus.unlock();
        result
    }
}

impl<B, CS> Drop for SpiTransaction<'_, '_, B, CS>
where
    B: SpiBus,
    CS: ConfigurablePin,
{
    fn drop(&mut self) {
        let _ = self.finish();
    }
}
