//! Dynamic pin allocation for config-driven hardware setup
//!
//! Pins whose concrete type matters (SPI clock and data) are taken out of
//! [`PinBankPeripherals`] first; everything left goes into a [`PinBank`] and
//! is handed out by number as the display config asks for it.

use embassy_rp::gpio::AnyPin;
use embassy_rp::peripherals::{
    PIN_0, PIN_1, PIN_2, PIN_3, PIN_4, PIN_5, PIN_6, PIN_7, PIN_8, PIN_9, PIN_10, PIN_11, PIN_12,
    PIN_13, PIN_14, PIN_15, PIN_16, PIN_17, PIN_18, PIN_19, PIN_20, PIN_21, PIN_22, PIN_23, PIN_24,
    PIN_25, PIN_26, PIN_27, PIN_28, PIN_29,
    SPI0,
};
use embassy_rp::{Peri, Peripherals};

/// Number of user GPIOs
pub const GPIO_COUNT: u8 = 30;

/// Error when requesting a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range (0-29 valid)
    InvalidPin,
    /// Pin already taken
    AlreadyTaken,
}

/// Pin bank that holds GPIO pins and allows taking them by number
pub struct PinBank {
    pins: [Option<Peri<'static, AnyPin>>; GPIO_COUNT as usize],
}

impl PinBank {
    /// Move every pin still present in `p` into the bank
    pub fn new(p: &mut PinBankPeripherals) -> Self {
        Self {
            pins: [
                p.pin0.take().map(Into::into),
                p.pin1.take().map(Into::into),
                p.pin2.take().map(Into::into),
                p.pin3.take().map(Into::into),
                p.pin4.take().map(Into::into),
                p.pin5.take().map(Into::into),
                p.pin6.take().map(Into::into),
                p.pin7.take().map(Into::into),
                p.pin8.take().map(Into::into),
                p.pin9.take().map(Into::into),
                p.pin10.take().map(Into::into),
                p.pin11.take().map(Into::into),
                p.pin12.take().map(Into::into),
                p.pin13.take().map(Into::into),
                p.pin14.take().map(Into::into),
                p.pin15.take().map(Into::into),
                p.pin16.take().map(Into::into),
                p.pin17.take().map(Into::into),
                p.pin18.take().map(Into::into),
                p.pin19.take().map(Into::into),
                p.pin20.take().map(Into::into),
                p.pin21.take().map(Into::into),
                p.pin22.take().map(Into::into),
                p.pin23.take().map(Into::into),
                p.pin24.take().map(Into::into),
                p.pin25.take().map(Into::into),
                p.pin26.take().map(Into::into),
                p.pin27.take().map(Into::into),
                p.pin28.take().map(Into::into),
                p.pin29.take().map(Into::into),
            ],
        }
    }

    /// Take a pin by number
    pub fn take(&mut self, pin_num: u8) -> Result<Peri<'static, AnyPin>, PinError> {
        self.pins
            .get_mut(usize::from(pin_num))
            .ok_or(PinError::InvalidPin)?
            .take()
            .ok_or(PinError::AlreadyTaken)
    }
}

/// GPIO pins with their concrete types, taken individually
pub struct PinBankPeripherals {
    pub pin0: Option<Peri<'static, PIN_0>>,
    pub pin1: Option<Peri<'static, PIN_1>>,
    pub pin2: Option<Peri<'static, PIN_2>>,
    pub pin3: Option<Peri<'static, PIN_3>>,
    pub pin4: Option<Peri<'static, PIN_4>>,
    pub pin5: Option<Peri<'static, PIN_5>>,
    pub pin6: Option<Peri<'static, PIN_6>>,
    pub pin7: Option<Peri<'static, PIN_7>>,
    pub pin8: Option<Peri<'static, PIN_8>>,
    pub pin9: Option<Peri<'static, PIN_9>>,
    pub pin10: Option<Peri<'static, PIN_10>>,
    pub pin11: Option<Peri<'static, PIN_11>>,
    pub pin12: Option<Peri<'static, PIN_12>>,
    pub pin13: Option<Peri<'static, PIN_13>>,
    pub pin14: Option<Peri<'static, PIN_14>>,
    pub pin15: Option<Peri<'static, PIN_15>>,
    pub pin16: Option<Peri<'static, PIN_16>>,
    pub pin17: Option<Peri<'static, PIN_17>>,
    pub pin18: Option<Peri<'static, PIN_18>>,
    pub pin19: Option<Peri<'static, PIN_19>>,
    pub pin20: Option<Peri<'static, PIN_20>>,
    pub pin21: Option<Peri<'static, PIN_21>>,
    pub pin22: Option<Peri<'static, PIN_22>>,
    pub pin23: Option<Peri<'static, PIN_23>>,
    pub pin24: Option<Peri<'static, PIN_24>>,
    pub pin25: Option<Peri<'static, PIN_25>>,
    pub pin26: Option<Peri<'static, PIN_26>>,
    pub pin27: Option<Peri<'static, PIN_27>>,
    pub pin28: Option<Peri<'static, PIN_28>>,
    pub pin29: Option<Peri<'static, PIN_29>>,
}

impl PinBankPeripherals {
    /// Split embassy peripherals into GPIOs and the rest
    pub fn from_peripherals(p: Peripherals) -> (Self, RemainingPeripherals) {
        let pins = Self {
            pin0: Some(p.PIN_0),
            pin1: Some(p.PIN_1),
            pin2: Some(p.PIN_2),
            pin3: Some(p.PIN_3),
            pin4: Some(p.PIN_4),
            pin5: Some(p.PIN_5),
            pin6: Some(p.PIN_6),
            pin7: Some(p.PIN_7),
            pin8: Some(p.PIN_8),
            pin9: Some(p.PIN_9),
            pin10: Some(p.PIN_10),
            pin11: Some(p.PIN_11),
            pin12: Some(p.PIN_12),
            pin13: Some(p.PIN_13),
            pin14: Some(p.PIN_14),
            pin15: Some(p.PIN_15),
            pin16: Some(p.PIN_16),
            pin17: Some(p.PIN_17),
            pin18: Some(p.PIN_18),
            pin19: Some(p.PIN_19),
            pin20: Some(p.PIN_20),
            pin21: Some(p.PIN_21),
            pin22: Some(p.PIN_22),
            pin23: Some(p.PIN_23),
            pin24: Some(p.PIN_24),
            pin25: Some(p.PIN_25),
            pin26: Some(p.PIN_26),
            pin27: Some(p.PIN_27),
            pin28: Some(p.PIN_28),
            pin29: Some(p.PIN_29),
        };
        let remaining = RemainingPeripherals {
            spi0: p.SPI0,
        };
        (pins, remaining)
    }
}

/// Non-GPIO peripherals the display firmware uses
pub struct RemainingPeripherals {
    pub spi0: Peri<'static, SPI0>,
}
