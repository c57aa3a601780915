//! fbio Hardware Abstraction Layer
//!
//! This crate defines the hardware abstraction traits the display stack is
//! written against. Chip-specific crates (e.g. `fbio-hal-rp2040`) implement
//! them, and host tests implement them with plain in-memory mocks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  fbio-display / fbio-firmware           │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  fbio-hal (this crate - traits)         │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ fbio-hal-     │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::ConfigurablePin`] - Digital output / chip select
//! - [`spi::SpiBus`] - Lockable SPI bus master
//! - [`spi_device::SpiDevice`] - Per-device access to a shared SPI bus
//! - [`framebuffer::Framebuffer`] - Pixel memory that can be presented
//! - [`time::Monotonic`], [`time::Background`] - Time source and cooperative yield

#![no_std]
#![deny(unsafe_code)]

pub mod framebuffer;
pub mod gpio;
pub mod spi;
pub mod spi_device;
pub mod time;

// Re-export key traits at crate root for convenience
pub use framebuffer::{BufferInfo, Framebuffer};
pub use gpio::{ConfigurablePin, DriveMode, OutputPin, PinModeError};
pub use spi::{SpiBus, SpiConfig};
pub use spi_device::{SpiDevice, SpiDeviceConfig, SpiDeviceError, SpiTransaction};
pub use time::{Background, Monotonic};
