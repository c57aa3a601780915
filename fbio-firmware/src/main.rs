//! fbio - framebuffer display firmware
//!
//! Drives an ST7789 SPI TFT from an RP2040 through the framebuffer display
//! stack: a scene is streamed into a RAM framebuffer in small chunks and the
//! framebuffer is pushed to the panel once per frame.

#![no_std]
#![no_main]

use core::cell::RefCell;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Flex, Level, Output};
use embassy_rp::spi::{self, Spi};
use embassy_time::{block_for, Duration};
use static_cell::{ConstStaticCell, StaticCell};
use {defmt_rtt as _, panic_probe as _};

use fbio_core::config::PinConfig;
use fbio_display::{FramebufferDisplay, NoTerminal};
use fbio_hal::{OutputPin, SpiDevice};
use fbio_hal_rp2040::{
    ChipSelectPin, EmbassyClock, PinBank, PinBankPeripherals, RpOutputPin, RpSpiBus,
};

use crate::config::MAX_PIXEL_BYTES;
use crate::panel::{PanelBus, PanelWindow, St7789Panel};

mod config;
mod panel;
mod scene;
mod tasks;

/// SPI0 clock and data pins are fixed by the board wiring
const SPI_SCK_PIN: u8 = 18;
const SPI_MOSI_PIN: u8 = 19;

/// On-board LED, blinked from the refresh background hook
const STATUS_LED_PIN: u8 = 25;

// Shared SPI bus (must live forever for the device reference)
static SPI_BUS: StaticCell<RefCell<PanelBus>> = StaticCell::new();

// Pixel memory, placed in .bss instead of being built on the stack
static PIXELS: ConstStaticCell<[u8; MAX_PIXEL_BYTES]> = ConstStaticCell::new([0; MAX_PIXEL_BYTES]);

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("fbio firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = config::load_config();

    let (mut pins, rest) = PinBankPeripherals::from_peripherals(p);
    if config.spi.sck_pin.pin != SPI_SCK_PIN || config.spi.mosi_pin.pin != SPI_MOSI_PIN {
        warn!(
            "SPI pins in config ignored, using gpio{} (sck) and gpio{} (mosi)",
            SPI_SCK_PIN, SPI_MOSI_PIN
        );
    }
    let sck = unwrap!(pins.pin18.take());
    let mosi = unwrap!(pins.pin19.take());
    let mut bank = PinBank::new(&mut pins);

    // SPI bus; the device reconfigures it per transaction
    let spi = Spi::new_blocking_txonly(rest.spi0, sck, mosi, spi::Config::default());
    let bus = SPI_BUS.init(RefCell::new(RpSpiBus::new(spi)));

    let chip_select = config.spi.cs_pin.map(|cs| {
        if cs.inverted {
            warn!("Chip select is always active-low, ignoring '!'");
        }
        ChipSelectPin::new(Flex::new(unwrap!(bank.take(cs.pin))))
    });
    let device = unwrap!(SpiDevice::new(
        bus,
        chip_select,
        config::spi_device_config(&config.spi)
    ));

    let dc = output_pin(&mut bank, config.spi.dc_pin, false);
    let backlight = config
        .spi
        .backlight_pin
        .map(|pin| output_pin(&mut bank, pin, false));

    // Held for the lifetime of main so the line stays driven
    let _reset = config.spi.reset_pin.map(|pin| {
        let mut reset = output_pin(&mut bank, pin, true);
        reset.set_low();
        block_for(Duration::from_millis(10));
        reset.set_high();
        block_for(Duration::from_millis(120));
        reset
    });

    let window = PanelWindow::for_size(config.display.width, config.display.height);
    let panel = unwrap!(St7789Panel::new(device, dc, backlight, window, PIXELS.take()));
    info!("Panel initialized");

    let display = unwrap!(FramebufferDisplay::new(
        panel,
        EmbassyClock,
        NoTerminal,
        &config.display
    ));

    let led = Output::new(unwrap!(bank.take(STATUS_LED_PIN)), Level::Low);

    spawner
        .spawn(tasks::display_task(display, config.pacing, led))
        .unwrap();

    info!("All tasks spawned, firmware running");

    // Main task has nothing else to do - all work happens in spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Take a configured pin as an output at logical level `active`
fn output_pin(bank: &mut PinBank, pin: PinConfig, active: bool) -> RpOutputPin<'static> {
    let level = Level::from(active != pin.inverted);
    RpOutputPin::new(Output::new(unwrap!(bank.take(pin.pin)), level), pin.inverted)
}
