//! GPIO pin abstractions
//!
//! Provides traits for the digital output pins used as chip selects,
//! data/command lines and backlight enables.

/// Pin driven by the display stack
///
/// Levels are logical. An implementation may invert the pad, as for an
/// active-low backlight enable.
pub trait OutputPin {
    fn set_high(&mut self);

    fn set_low(&mut self);

    /// Drive high when `high`, else low
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Level last written, not a readback of the pad
    fn is_set_high(&self) -> bool;

    fn is_set_low(&self) -> bool {
        !self.is_set_high()
    }
}

/// Output drive mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriveMode {
    /// Actively driven high and low
    #[default]
    PushPull,
    /// Driven low, floating high
    OpenDrain,
}

/// Errors when changing a pin's mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinModeError {
    /// The pin can only be used as an input
    InputOnly,
}

/// Pin whose direction can be changed at runtime
///
/// Chip-select lines are handed over as generic pins and switched to
/// output when the owning device is constructed.
pub trait ConfigurablePin: OutputPin {
    /// Switch the pin to output, driving `initial_high` immediately
    fn switch_to_output(&mut self, initial_high: bool, mode: DriveMode)
        -> Result<(), PinModeError>;
}
