//! Pixel format description

use crate::error::ConfigError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Bit depths a colorspace may use
pub const VALID_DEPTHS: [u8; 7] = [1, 2, 4, 8, 16, 24, 32];

/// Pixel format of a display
///
/// Fixed for the lifetime of a display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Colorspace {
    /// Bits per pixel
    pub depth: u8,
    /// Pixels are luminance only
    pub grayscale: bool,
    /// For sub-byte depths: pixels sharing a byte lie on the same row
    /// (row-major packing). When false, a byte spans consecutive rows.
    pub pixels_in_byte_share_row: bool,
    /// Bytes the device uses per addressable cell
    pub bytes_per_cell: u8,
    /// Sub-byte pixels are stored least significant first
    pub reverse_pixels_in_byte: bool,
}

impl Colorspace {
    /// Color (non-grayscale) colorspace with row-major packing
    pub fn new(depth: u8, bytes_per_cell: u8) -> Result<Self, ConfigError> {
        if !VALID_DEPTHS.contains(&depth) {
            return Err(ConfigError::InvalidDepth(depth));
        }
        Ok(Self {
            depth,
            grayscale: false,
            pixels_in_byte_share_row: true,
            bytes_per_cell,
            reverse_pixels_in_byte: false,
        })
    }

    /// Packed-per-column variant (e.g. page-addressed monochrome OLEDs)
    pub fn column_packed(mut self) -> Self {
        self.pixels_in_byte_share_row = false;
        self
    }

    /// Pixels that fit in one 32-bit word
    pub fn pixels_per_word(&self) -> u32 {
        32 / u32::from(self.depth)
    }

    /// Pixels that share one byte (1 for byte-aligned depths)
    pub fn pixels_per_byte(&self) -> u32 {
        if self.depth < 8 {
            8 / u32::from(self.depth)
        } else {
            1
        }
    }

    /// True if every pixel starts on a byte boundary
    pub fn is_byte_aligned(&self) -> bool {
        self.depth % 8 == 0
    }

    /// Bytes per pixel for byte-aligned depths
    pub fn bytes_per_pixel(&self) -> Option<usize> {
        if self.is_byte_aligned() {
            Some(usize::from(self.depth / 8))
        } else {
            None
        }
    }

    /// True if a sub-byte pixel byte spans several rows
    pub fn packs_by_column(&self) -> bool {
        self.depth < 8 && !self.pixels_in_byte_share_row
    }
}
