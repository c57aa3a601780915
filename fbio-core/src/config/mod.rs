//! Configuration types and the TOML loader
//!
//! Board-agnostic settings for one display: panel geometry and pixel format,
//! manual refresh pacing, and the SPI link to the panel controller.

pub mod toml;
pub mod types;

pub use toml::{parse_config, ParseError};
pub use types::*;
