//! Framebuffer device protocol
//!
//! A framebuffer exposes a block of pixel memory that the display driver
//! writes into, and a way to present (swap) it once a frame is complete.
//! Brightness control is optional; the default methods report "unsupported".

/// Writable view of a framebuffer's pixel memory
#[derive(Debug)]
pub struct BufferInfo<'a> {
    /// Pixel memory, `stride * rows` bytes
    pub buf: &'a mut [u8],
    /// Bytes between the start of consecutive rows
    pub stride: usize,
}

impl<'a> BufferInfo<'a> {
    /// Create a buffer view
    pub fn new(buf: &'a mut [u8], stride: usize) -> Self {
        Self { buf, stride }
    }
}

/// Framebuffer device
pub trait Framebuffer {
    /// Error type for presenting frames
    type Error;

    /// Get the pixel memory to draw the next frame into
    fn buffer_info(&mut self) -> BufferInfo<'_>;

    /// Present the frame written since the last swap
    fn swap_buffers(&mut self) -> Result<(), Self::Error>;

    /// Shut the device down
    fn deinit(&mut self);

    /// Current brightness in `0.0..=1.0`, or `None` without brightness control
    fn brightness(&self) -> Option<f32> {
        None
    }

    /// Set brightness in `0.0..=1.0`
    ///
    /// Returns `false` if the device has no brightness control.
    fn set_brightness(&mut self, _brightness: f32) -> bool {
        false
    }

    /// Whether brightness follows ambient light, `None` when unsupported
    fn auto_brightness(&self) -> Option<bool> {
        None
    }

    /// Enable or disable automatic brightness
    ///
    /// Returns `false` if the device has no automatic brightness.
    fn set_auto_brightness(&mut self, _auto_brightness: bool) -> bool {
        false
    }
}
