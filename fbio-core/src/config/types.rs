//! Display configuration types

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::colorspace::Colorspace;
use crate::error::ConfigError;
use crate::transform::Rotation;

/// GPIO pin with optional inversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinConfig {
    /// GPIO number
    pub pin: u8,
    /// Pin is active-low
    pub inverted: bool,
}

impl PinConfig {
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
        }
    }

    pub const fn inverted(pin: u8) -> Self {
        Self {
            pin,
            inverted: true,
        }
    }
}

/// Panel geometry and pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisplayConfig {
    /// Framebuffer width in pixels
    pub width: u16,
    /// Framebuffer height in pixels
    pub height: u16,
    pub rotation: Rotation,
    /// Bits per pixel
    pub color_depth: u8,
    pub bytes_per_cell: u8,
    pub grayscale: bool,
    /// Refresh from the background tick instead of explicit calls
    pub auto_refresh: bool,
    /// Rate used for auto refresh
    pub native_frames_per_second: u16,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        // 1.14" 240x135 ST7789 module
        Self {
            width: 240,
            height: 135,
            rotation: Rotation::Deg0,
            color_depth: 16,
            bytes_per_cell: 1,
            grayscale: false,
            auto_refresh: true,
            native_frames_per_second: 60,
        }
    }
}

impl DisplayConfig {
    /// Pixel format described by this config
    pub fn colorspace(&self) -> Result<Colorspace, ConfigError> {
        let mut colorspace = Colorspace::new(self.color_depth, self.bytes_per_cell)?;
        colorspace.grayscale = self.grayscale;
        Ok(colorspace)
    }

    /// Bytes one full frame occupies, `None` for sub-byte depths
    pub fn frame_bytes(&self) -> Option<usize> {
        let bytes_per_pixel = self.colorspace().ok()?.bytes_per_pixel()?;
        Some(usize::from(self.width) * usize::from(self.height) * bytes_per_pixel)
    }

    /// Check this config against a panel with a fixed pixel format
    ///
    /// `depth` is the only depth the panel accepts and `available` is the
    /// size of its pixel memory in bytes.
    pub fn check_panel(&self, depth: u8, available: usize) -> Result<(), ConfigError> {
        self.colorspace()?;
        if self.color_depth != depth {
            return Err(ConfigError::UnsupportedDepth(self.color_depth));
        }
        let needed = self
            .frame_bytes()
            .ok_or(ConfigError::UnsupportedDepth(self.color_depth))?;
        if needed > available {
            return Err(ConfigError::FrameTooLarge { needed, available });
        }
        Ok(())
    }
}

/// Manual refresh pacing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PacingConfig {
    /// Desired manual refresh rate; 0 disables throttling
    pub target_frames_per_second: u16,
    /// Slowest acceptable rate between real refreshes
    pub minimum_frames_per_second: u16,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            target_frames_per_second: 60,
            minimum_frames_per_second: 1,
        }
    }
}

impl PacingConfig {
    /// Target frame time in ms, 0 when unthrottled
    pub fn target_ms_per_frame(&self) -> u32 {
        match self.target_frames_per_second {
            0 => 0,
            fps => 1000 / u32::from(fps),
        }
    }

    /// Longest allowed gap between real refreshes in ms
    pub fn max_ms_per_real_frame(&self) -> u32 {
        match self.minimum_frames_per_second {
            0 => u32::MAX,
            fps => 1000 / u32::from(fps),
        }
    }
}

/// SPI link to the panel controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpiPanelConfig {
    /// Clock frequency in Hz
    pub baudrate: u32,
    /// Clock polarity (0 or 1)
    pub polarity: u8,
    /// Clock phase (0 or 1)
    pub phase: u8,
    /// Clock cycles sent after chip select is released
    pub extra_clocks: u8,
    pub sck_pin: PinConfig,
    pub mosi_pin: PinConfig,
    pub cs_pin: Option<PinConfig>,
    /// Data/command select
    pub dc_pin: PinConfig,
    pub reset_pin: Option<PinConfig>,
    pub backlight_pin: Option<PinConfig>,
}

impl Default for SpiPanelConfig {
    fn default() -> Self {
        // Pimoroni Pico Display pinout
        Self {
            baudrate: 62_500_000,
            polarity: 0,
            phase: 0,
            extra_clocks: 0,
            sck_pin: PinConfig::new(18),
            mosi_pin: PinConfig::new(19),
            cs_pin: Some(PinConfig::new(17)),
            dc_pin: PinConfig::new(16),
            reset_pin: None,
            backlight_pin: Some(PinConfig::new(20)),
        }
    }
}

/// Complete configuration for one display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    pub display: DisplayConfig,
    pub pacing: PacingConfig,
    pub spi: SpiPanelConfig,
}
