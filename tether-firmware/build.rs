//! Build script for tether-firmware
//!
//! - Sets up linker search paths and scripts for memory.x
//! - Validates channel.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Keys accepted in a channel section
const CHANNEL_KEYS: &[&str] = &[
    "baudrate",
    "data_bits",
    "parity",
    "stop_bits",
    "fill_byte",
    "timeout_ms",
    "tx_pin",
    "rx_pin",
];

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    if env::var_os("CARGO_FEATURE_DEFMT").is_some() {
        println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
    }

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate channel.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=channel.toml");

    let config_path = Path::new("channel.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: channel.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds channel.toml from the tether-firmware       ║\n\
            ║  directory. Create one with [console] and [link] sections.       ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read channel.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in channel.toml                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();

    match config.get("version") {
        Some(toml::Value::Integer(1)) | None => {}
        Some(_) => errors.push("version must be 1".to_string()),
    }

    for key in config.as_table().into_iter().flat_map(|t| t.keys()) {
        if !["version", "console", "link"].contains(&key.as_str()) {
            errors.push(format!("unknown top-level key '{}'", key));
        }
    }

    let mut pins = Vec::new();
    let mut uarts: Vec<(u8, &str)> = Vec::new();
    let empty = toml::map::Map::new();
    for (name, defaults) in [("console", [0, 1]), ("link", [4, 5])] {
        let channel = match config.get(name) {
            Some(toml::Value::Table(t)) => t,
            Some(_) => {
                errors.push(format!("[{}] must be a table", name));
                continue;
            }
            // Absent sections still occupy their default pins
            None => &empty,
        };

        let Some(uart) = validate_channel(name, channel, defaults, &mut pins, &mut errors) else {
            continue;
        };
        if let Some((_, owner)) = uarts.iter().find(|(u, _)| *u == uart) {
            errors.push(format!("[{}] UART{} already used by [{}]", name, uart, owner));
        }
        uarts.push((uart, name));
    }

    report("Invalid channel configuration", &errors);

    println!("cargo:warning=channel.toml validated successfully");
}

/// Validate one `[console]` or `[link]` section
///
/// Missing pins take the firmware defaults in `defaults` (TX, RX).
/// Returns the UART the pins resolve to, if they resolve to one.
fn validate_channel(
    name: &str,
    channel: &toml::map::Map<String, toml::Value>,
    defaults: [i64; 2],
    pins: &mut Vec<(i64, String)>,
    errors: &mut Vec<String>,
) -> Option<u8> {
    for key in channel.keys() {
        if !CHANNEL_KEYS.contains(&key.as_str()) {
            errors.push(format!("[{}] unknown key '{}'", name, key));
        }
    }

    if let Some(value) = channel.get("baudrate") {
        match value.as_integer() {
            Some(baud) if baud > 0 && baud <= 7_812_500 => {}
            _ => errors.push(format!("[{}] baudrate must be 1-7812500", name)),
        }
    }

    if let Some(value) = channel.get("data_bits") {
        if !matches!(value.as_integer(), Some(5..=8)) {
            errors.push(format!("[{}] data_bits must be 5-8", name));
        }
    }

    if let Some(value) = channel.get("stop_bits") {
        if !matches!(value.as_integer(), Some(1 | 2)) {
            errors.push(format!("[{}] stop_bits must be 1 or 2", name));
        }
    }

    if let Some(value) = channel.get("parity") {
        if !matches!(value.as_str(), Some("none" | "even" | "odd")) {
            errors.push(format!(
                "[{}] parity must be 'none', 'even', or 'odd'",
                name
            ));
        }
    }

    if let Some(value) = channel.get("fill_byte") {
        if !matches!(value.as_integer(), Some(0..=255)) {
            errors.push(format!("[{}] fill_byte must be 0-255", name));
        }
    }

    if let Some(value) = channel.get("timeout_ms") {
        if !matches!(value.as_integer(), Some(t) if t >= 0 && t <= u32::MAX as i64) {
            errors.push(format!("[{}] timeout_ms must be a non-negative integer", name));
        }
    }

    let mut uart = None;
    for ((key, parity), default) in [("tx_pin", 0), ("rx_pin", 1)].into_iter().zip(defaults) {
        let pin = match channel.get(key) {
            None => default,
            Some(value) => match value
                .as_str()
                .and_then(|s| s.strip_prefix("gpio"))
                .and_then(|n| n.parse::<i64>().ok())
            {
                Some(pin) => pin,
                None => {
                    errors.push(format!("[{}] {} must look like \"gpioN\"", name, key));
                    continue;
                }
            },
        };

        match uart_of(pin) {
            Some(id) if pin % 2 == parity => {
                if uart.is_some_and(|u| u != id) {
                    errors.push(format!("[{}] tx_pin and rx_pin are on different UARTs", name));
                }
                uart = Some(id);
            }
            _ => errors.push(format!(
                "[{}] gpio{} cannot be a UART {} pin",
                name,
                pin,
                &key[..2]
            )),
        }

        if let Some((_, owner)) = pins.iter().find(|(p, _)| *p == pin) {
            errors.push(format!("[{}] gpio{} already used by [{}]", name, pin, owner));
        }
        pins.push((pin, name.to_string()));
    }

    uart
}

/// UART driving a GPIO on the RP2040
fn uart_of(pin: i64) -> Option<u8> {
    match pin {
        0 | 1 | 12 | 13 | 16 | 17 | 28 | 29 => Some(0),
        4 | 5 | 8 | 9 | 20 | 21 | 24 | 25 => Some(1),
        _ => None,
    }
}

/// Panic with a boxed report if there are errors
fn report(title: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }

    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
