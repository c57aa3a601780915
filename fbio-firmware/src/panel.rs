//! ST7789 panel as a framebuffer
//!
//! Pixels are kept in RAM in the display's native layout (RGB565, least
//! significant byte first). Presenting streams the whole buffer to the
//! controller over SPI, swapping each pixel to the big-endian order the
//! controller expects.

use defmt::*;
use embassy_rp::peripherals::SPI0;
use embassy_time::{block_for, Duration};

use fbio_hal::{BufferInfo, Framebuffer, OutputPin, SpiDevice, SpiDeviceError};
use fbio_hal_rp2040::spi::RpSpiError;
use fbio_hal_rp2040::{ChipSelectPin, RpOutputPin, RpSpiBus};

pub type PanelBus = RpSpiBus<'static, SPI0>;
pub type PanelDevice = SpiDevice<'static, PanelBus, ChipSelectPin<'static>>;

/// The controller is run in RGB565 only
pub const COLOR_DEPTH: u8 = 16;
pub const BYTES_PER_PIXEL: usize = COLOR_DEPTH as usize / 8;

/// Bytes sent per SPI write while streaming pixels
const TX_CHUNK: usize = 256;

mod cmd {
    pub const SWRESET: u8 = 0x01;
    pub const SLPOUT: u8 = 0x11;
    pub const NORON: u8 = 0x13;
    pub const INVON: u8 = 0x21;
    pub const DISPOFF: u8 = 0x28;
    pub const DISPON: u8 = 0x29;
    pub const CASET: u8 = 0x2A;
    pub const RASET: u8 = 0x2B;
    pub const RAMWR: u8 = 0x2C;
    pub const MADCTL: u8 = 0x36;
    pub const COLMOD: u8 = 0x3A;
}

/// Visible window inside the controller's 240x320 memory
#[derive(Debug, Clone, Copy)]
pub struct PanelWindow {
    pub width: u16,
    pub height: u16,
    pub x_offset: u16,
    pub y_offset: u16,
}

impl PanelWindow {
    /// Window for the common ST7789 module sizes, landscape
    pub fn for_size(width: u16, height: u16) -> Self {
        let (x_offset, y_offset) = match (width, height) {
            (240, 135) => (40, 53),
            (280, 240) => (20, 0),
            (320, 170) => (0, 35),
            _ => (0, 0),
        };
        Self {
            width,
            height,
            x_offset,
            y_offset,
        }
    }
}

/// ST7789 SPI TFT
pub struct St7789Panel {
    device: PanelDevice,
    dc: RpOutputPin<'static>,
    backlight: Option<RpOutputPin<'static>>,
    window: PanelWindow,
    pixels: &'static mut [u8],
}

impl St7789Panel {
    /// Initialize the controller and blank the screen
    ///
    /// `pixels` must hold at least `width * height * BYTES_PER_PIXEL` bytes.
    pub fn new(
        device: PanelDevice,
        dc: RpOutputPin<'static>,
        backlight: Option<RpOutputPin<'static>>,
        window: PanelWindow,
        pixels: &'static mut [u8],
    ) -> Result<Self, SpiDeviceError<RpSpiError>> {
        let len = usize::from(window.width) * usize::from(window.height) * BYTES_PER_PIXEL;
        let (pixels, _) = pixels.split_at_mut(len.min(pixels.len()));

        let mut panel = Self {
            device,
            dc,
            backlight,
            window,
            pixels,
        };
        panel.init()?;
        panel.swap_buffers()?;
        if let Some(backlight) = panel.backlight.as_mut() {
            backlight.set_high();
        }
        info!("ST7789 {}x{} ready", window.width, window.height);
        Ok(panel)
    }

    fn init(&mut self) -> Result<(), SpiDeviceError<RpSpiError>> {
        self.command(cmd::SWRESET, &[])?;
        block_for(Duration::from_millis(150));
        self.command(cmd::SLPOUT, &[])?;
        block_for(Duration::from_millis(10));
        // 16 bits per pixel
        self.command(cmd::COLMOD, &[0x55])?;
        // Row/column exchange for landscape, RGB order
        self.command(cmd::MADCTL, &[0x70])?;
        self.command(cmd::INVON, &[])?;
        self.command(cmd::NORON, &[])?;
        self.command(cmd::DISPON, &[])?;
        block_for(Duration::from_millis(10));
        Ok(())
    }

    fn command(&mut self, command: u8, params: &[u8]) -> Result<(), SpiDeviceError<RpSpiError>> {
        let mut tx = self.device.acquire(&mut || {})?;
        self.dc.set_low();
        tx.write(&[command]).map_err(SpiDeviceError::Bus)?;
        if !params.is_empty() {
            self.dc.set_high();
            tx.write(params).map_err(SpiDeviceError::Bus)?;
        }
        tx.release().map_err(SpiDeviceError::Bus)?;
        Ok(())
    }

    fn set_window(&mut self) -> Result<(), SpiDeviceError<RpSpiError>> {
        let w = self.window;
        let x0 = w.x_offset;
        let x1 = w.x_offset + w.width - 1;
        let y0 = w.y_offset;
        let y1 = w.y_offset + w.height - 1;
        let [x0h, x0l] = x0.to_be_bytes();
        let [x1h, x1l] = x1.to_be_bytes();
        let [y0h, y0l] = y0.to_be_bytes();
        let [y1h, y1l] = y1.to_be_bytes();
        self.command(cmd::CASET, &[x0h, x0l, x1h, x1l])?;
        self.command(cmd::RASET, &[y0h, y0l, y1h, y1l])
    }
}

impl Framebuffer for St7789Panel {
    type Error = SpiDeviceError<RpSpiError>;

    fn buffer_info(&mut self) -> BufferInfo<'_> {
        let stride = usize::from(self.window.width) * BYTES_PER_PIXEL;
        BufferInfo::new(self.pixels, stride)
    }

    fn swap_buffers(&mut self) -> Result<(), Self::Error> {
        self.set_window()?;

        let mut tx = self.device.acquire(&mut || {})?;
        self.dc.set_low();
        tx.write(&[cmd::RAMWR]).map_err(SpiDeviceError::Bus)?;
        self.dc.set_high();

        let mut out = [0u8; TX_CHUNK];
        for block in self.pixels.chunks(TX_CHUNK) {
            let out = &mut out[..block.len()];
            for (dst, src) in out.chunks_exact_mut(2).zip(block.chunks_exact(2)) {
                dst[0] = src[1];
                dst[1] = src[0];
            }
            tx.write(out).map_err(SpiDeviceError::Bus)?;
        }
        tx.release().map_err(SpiDeviceError::Bus)?;
        Ok(())
    }

    fn deinit(&mut self) {
        if let Some(backlight) = self.backlight.as_mut() {
            backlight.set_low();
        }
        if self.command(cmd::DISPOFF, &[]).is_err() {
            warn!("ST7789 did not accept display off");
        }
    }

    /// Backlight is on/off only
    fn brightness(&self) -> Option<f32> {
        let backlight = self.backlight.as_ref()?;
        Some(if backlight.is_set_high() { 1.0 } else { 0.0 })
    }

    fn set_brightness(&mut self, brightness: f32) -> bool {
        match self.backlight.as_mut() {
            Some(backlight) => {
                backlight.set_state(brightness > 0.0);
                true
            }
            None => false,
        }
    }
}
