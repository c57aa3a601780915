//! Construction-time errors

/// Invalid display configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Width or height is zero
    InvalidDimensions,
    /// Rotation is not a multiple of 90 degrees
    InvalidRotation(u16),
    /// Color depth is not one of 1, 2, 4, 8, 16, 24, 32
    InvalidDepth(u8),
    /// Color depth is valid but cannot be copied into a byte-addressed framebuffer
    UnsupportedDepth(u8),
    /// Native frame rate must be at least 1 fps
    ZeroFrameRate,
    /// Frame does not fit the pixel memory behind the panel
    FrameTooLarge { needed: usize, available: usize },
}
