//! Minimal TOML reader for display configuration
//!
//! Handles only the subset used by display config files:
//! - `[section]` headers (`display`, `pacing`, `spi`)
//! - `key = value` pairs with string, integer or boolean values
//! - Comments (`# ...`), including trailing ones
//!
//! Keys that are not recognized are ignored so newer config files still load.
//! Pins are written as `"gpioNN"`, prefixed with `!` for active-low.

use crate::config::types::{Config, DisplayConfig, PacingConfig, PinConfig, SpiPanelConfig};
use crate::transform::Rotation;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// Invalid pin string
    InvalidPin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Display,
    Pacing,
    Spi,
}

/// Parse a TOML config, starting from defaults
pub fn parse_config(input: &str) -> Result<Config, ParseError> {
    let mut config = Config::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            let header = strip_comment(header);
            let header = header.strip_suffix(']').ok_or(ParseError::InvalidSection)?;
            section = parse_section_header(header)?;
            continue;
        }

        if let Some((key, value)) = parse_key_value(line) {
            match section {
                Section::Root => {}
                Section::Display => apply_display(&mut config.display, key, value)?,
                Section::Pacing => apply_pacing(&mut config.pacing, key, value)?,
                Section::Spi => apply_spi(&mut config.spi, key, value)?,
            }
        }
    }

    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "display" => Ok(Section::Display),
        "pacing" => Ok(Section::Pacing),
        "spi" => Ok(Section::Spi),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Drop a trailing comment, unless the `#` sits inside a string
fn strip_comment(value: &str) -> &str {
    match value.find('#') {
        Some(hash_pos) if value[..hash_pos].matches('"').count() % 2 == 0 => {
            value[..hash_pos].trim()
        }
        _ => value.trim(),
    }
}

fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = strip_comment(value);

    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

fn parse_string(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    // Allow 62_500_000 style separators
    let mut digits: heapless::String<24> = heapless::String::new();
    for c in value.chars().filter(|&c| c != '_') {
        digits.push(c).map_err(|_| ParseError::InvalidValue)?;
    }
    digits.parse().map_err(|_| ParseError::InvalidValue)
}

fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_bit(value: &str) -> Result<u8, ParseError> {
    match parse_int::<u8>(value)? {
        bit @ (0 | 1) => Ok(bit),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_pin(value: &str) -> Result<PinConfig, ParseError> {
    let s = parse_string(value);
    let (inverted, s) = match s.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let number = s.strip_prefix("gpio").ok_or(ParseError::InvalidPin)?;
    let pin = number.parse().map_err(|_| ParseError::InvalidPin)?;
    Ok(PinConfig { pin, inverted })
}

/// `"none"` disables an optional pin
fn parse_optional_pin(value: &str) -> Result<Option<PinConfig>, ParseError> {
    match parse_string(value) {
        "none" => Ok(None),
        _ => parse_pin(value).map(Some),
    }
}

fn apply_display(display: &mut DisplayConfig, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "width" => display.width = parse_int(value)?,
        "height" => display.height = parse_int(value)?,
        "rotation" => {
            let degrees: u16 = parse_int(value)?;
            display.rotation =
                Rotation::try_from(degrees).map_err(|_| ParseError::InvalidValue)?;
        }
        "color_depth" => display.color_depth = parse_int(value)?,
        "bytes_per_cell" => display.bytes_per_cell = parse_int(value)?,
        "grayscale" => display.grayscale = parse_bool(value)?,
        "auto_refresh" => display.auto_refresh = parse_bool(value)?,
        "native_frames_per_second" => display.native_frames_per_second = parse_int(value)?,
        _ => {}
    }

    match key {
        "width" | "height" if display.width == 0 || display.height == 0 => {
            Err(ParseError::InvalidValue)
        }
        "color_depth" | "bytes_per_cell" if display.colorspace().is_err() => {
            Err(ParseError::InvalidValue)
        }
        "native_frames_per_second" if display.native_frames_per_second == 0 => {
            Err(ParseError::InvalidValue)
        }
        _ => Ok(()),
    }
}

fn apply_pacing(pacing: &mut PacingConfig, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "target_frames_per_second" => pacing.target_frames_per_second = parse_int(value)?,
        "minimum_frames_per_second" => pacing.minimum_frames_per_second = parse_int(value)?,
        _ => {}
    }
    Ok(())
}

fn apply_spi(spi: &mut SpiPanelConfig, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "baudrate" => spi.baudrate = parse_int(value)?,
        "polarity" => spi.polarity = parse_bit(value)?,
        "phase" => spi.phase = parse_bit(value)?,
        "extra_clocks" => spi.extra_clocks = parse_int(value)?,
        "sck_pin" => spi.sck_pin = parse_pin(value)?,
        "mosi_pin" => spi.mosi_pin = parse_pin(value)?,
        "cs_pin" => spi.cs_pin = parse_optional_pin(value)?,
        "dc_pin" => spi.dc_pin = parse_pin(value)?,
        "reset_pin" => spi.reset_pin = parse_optional_pin(value)?,
        "backlight_pin" => spi.backlight_pin = parse_optional_pin(value)?,
        _ => {}
    }
    Ok(())
}
