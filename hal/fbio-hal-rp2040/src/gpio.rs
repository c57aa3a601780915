//! Output pins
//!
//! Every RP2040 GPIO can drive, so switching to output never fails here.

use embassy_rp::gpio::{Flex, Level, Output};
use fbio_hal::gpio::{ConfigurablePin, DriveMode, OutputPin, PinModeError};

/// Pin handed to an SPI device as its chip select
///
/// Starts as an input and becomes an output when the device claims it.
/// In open-drain mode a high level releases the line instead of driving it.
pub struct ChipSelectPin<'d> {
    pin: Flex<'d>,
    mode: DriveMode,
    high: bool,
}

impl<'d> ChipSelectPin<'d> {
    pub fn new(pin: Flex<'d>) -> Self {
        Self {
            pin,
            mode: DriveMode::PushPull,
            high: true,
        }
    }
}

impl OutputPin for ChipSelectPin<'_> {
    fn set_high(&mut self) {
        self.high = true;
        match self.mode {
            DriveMode::PushPull => self.pin.set_high(),
            DriveMode::OpenDrain => self.pin.set_as_input(),
        }
    }

    fn set_low(&mut self) {
        self.high = false;
        self.pin.set_low();
        if self.mode == DriveMode::OpenDrain {
            self.pin.set_as_output();
        }
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

impl ConfigurablePin for ChipSelectPin<'_> {
    fn switch_to_output(
        &mut self,
        initial_high: bool,
        mode: DriveMode,
    ) -> Result<(), PinModeError> {
        self.mode = mode;
        match mode {
            DriveMode::PushPull => {
                self.pin.set_level(Level::from(initial_high));
                self.pin.set_as_output();
                self.high = initial_high;
            }
            DriveMode::OpenDrain => {
                self.pin.set_low();
                if initial_high {
                    self.set_high();
                } else {
                    self.set_low();
                }
            }
        }
        Ok(())
    }
}

/// Plain push-pull output (data/command select, reset, backlight)
///
/// `inverted` pins are active-low: `set_high` drives the line low.
pub struct RpOutputPin<'d> {
    pin: Output<'d>,
    inverted: bool,
}

impl<'d> RpOutputPin<'d> {
    pub fn new(pin: Output<'d>, inverted: bool) -> Self {
        Self { pin, inverted }
    }
}

impl OutputPin for RpOutputPin<'_> {
    fn set_high(&mut self) {
        if self.inverted {
            self.pin.set_low();
        } else {
            self.pin.set_high();
        }
    }

    fn set_low(&mut self) {
        if self.inverted {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
    }

    fn is_set_high(&self) -> bool {
        self.pin.is_set_high() != self.inverted
    }
}
