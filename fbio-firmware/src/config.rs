//! Display configuration loading
//!
//! The config is compiled in from `display.toml`. The build script already
//! rejects malformed files, so a parse failure here means the file and the
//! on-device parser disagree; the built-in defaults are used in that case.

use defmt::*;

use fbio_core::config::{parse_config, Config, SpiPanelConfig};
use fbio_hal::spi::{Phase, Polarity};
use fbio_hal::SpiDeviceConfig;

use crate::panel;

/// Embedded configuration (compiled into firmware)
const EMBEDDED_CONFIG: &str = include_str!("../display.toml");

/// Largest panel the static pixel buffer can hold, in bytes
pub const MAX_PIXEL_BYTES: usize = 240 * 240 * panel::BYTES_PER_PIXEL;

/// Load the embedded configuration
pub fn load_config() -> Config {
    let config = match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            warn!("display.toml rejected ({}), using defaults", e);
            return Config::default();
        }
    };

    let display = &config.display;
    if let Err(e) = display.check_panel(panel::COLOR_DEPTH, MAX_PIXEL_BYTES) {
        warn!(
            "{}x{} depth {} does not fit the ST7789 panel ({}), using defaults",
            display.width, display.height, display.color_depth, e
        );
        return Config::default();
    }

    info!(
        "Display config: {}x{} depth {} rotation {} auto_refresh={}",
        display.width,
        display.height,
        display.color_depth,
        display.rotation.degrees(),
        display.auto_refresh
    );
    config
}

/// SPI device settings for the panel link
pub fn spi_device_config(spi: &SpiPanelConfig) -> SpiDeviceConfig {
    SpiDeviceConfig {
        baudrate: spi.baudrate,
        polarity: Polarity::from(spi.polarity),
        phase: Phase::from(spi.phase),
        extra_clocks: spi.extra_clocks,
    }
}
