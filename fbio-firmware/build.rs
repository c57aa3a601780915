//! Build script for fbio-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates display.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

const VALID_DEPTHS: [i64; 7] = [1, 2, 4, 8, 16, 24, 32];

/// The panel driver only speaks RGB565
const PANEL_DEPTH: i64 = 16;

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate display.toml so a broken file fails the build instead of
/// silently falling back to defaults on the device
fn validate_config() {
    println!("cargo:rerun-if-changed=display.toml");

    let config_path = Path::new("display.toml");
    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => panic!("failed to read display.toml: {}", e),
    };

    let config: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => panic!("invalid TOML syntax in display.toml:\n{}", e),
    };

    let mut errors = Vec::new();
    validate_display(&config, &mut errors);
    validate_pacing(&config, &mut errors);
    validate_spi(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "display.toml has errors:\n{}",
            errors
                .iter()
                .map(|e| format!("  - {}", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=display.toml validated successfully");
}

fn int_in(
    table: &toml::value::Table,
    section: &str,
    key: &str,
    range: std::ops::RangeInclusive<i64>,
    errors: &mut Vec<String>,
) {
    match table.get(key) {
        None => {}
        Some(toml::Value::Integer(v)) if range.contains(v) => {}
        Some(_) => errors.push(format!(
            "[{}] {} must be an integer in {}..={}",
            section,
            key,
            range.start(),
            range.end()
        )),
    }
}

fn validate_display(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(toml::Value::Table(display)) = config.get("display") else {
        errors.push("missing [display] section".to_string());
        return;
    };

    int_in(display, "display", "width", 1..=i16::MAX as i64, errors);
    int_in(display, "display", "height", 1..=i16::MAX as i64, errors);
    int_in(display, "display", "native_frames_per_second", 1..=1000, errors);
    int_in(display, "display", "bytes_per_cell", 1..=255, errors);

    if let Some(rotation) = display.get("rotation") {
        match rotation {
            toml::Value::Integer(r) if r % 90 == 0 && *r >= 0 => {}
            _ => errors.push("[display] rotation must be 0, 90, 180 or 270".to_string()),
        }
    }

    if let Some(depth) = display.get("color_depth") {
        match depth {
            toml::Value::Integer(d) if *d == PANEL_DEPTH => {}
            toml::Value::Integer(d) if VALID_DEPTHS.contains(d) => errors.push(format!(
                "[display] color_depth {} is not supported, the ST7789 panel runs at {}",
                d, PANEL_DEPTH
            )),
            _ => errors.push(format!("[display] color_depth must be {}", PANEL_DEPTH)),
        }
    }
}

fn validate_pacing(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(toml::Value::Table(pacing)) = config.get("pacing") else {
        return;
    };
    int_in(pacing, "pacing", "target_frames_per_second", 0..=1000, errors);
    int_in(pacing, "pacing", "minimum_frames_per_second", 0..=1000, errors);
}

fn validate_spi(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(toml::Value::Table(spi)) = config.get("spi") else {
        return;
    };

    int_in(spi, "spi", "baudrate", 1..=u32::MAX as i64, errors);
    int_in(spi, "spi", "polarity", 0..=1, errors);
    int_in(spi, "spi", "phase", 0..=1, errors);
    int_in(spi, "spi", "extra_clocks", 0..=255, errors);

    for key in ["sck_pin", "mosi_pin", "cs_pin", "dc_pin", "reset_pin", "backlight_pin"] {
        let Some(value) = spi.get(key) else {
            continue;
        };
        let valid = match value {
            toml::Value::String(s) => s == "none" || is_pin(s),
            _ => false,
        };
        if !valid {
            errors.push(format!("[spi] {} must look like \"gpioNN\" or \"!gpioNN\"", key));
        }
    }
}

fn is_pin(s: &str) -> bool {
    let s = s.strip_prefix('!').unwrap_or(s);
    s.strip_prefix("gpio")
        .and_then(|n| n.parse::<u8>().ok())
        .is_some_and(|n| n < 30)
}
