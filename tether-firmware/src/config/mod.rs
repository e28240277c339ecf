//! Configuration loading
//!
//! The board configuration is compiled into the firmware from
//! `channel.toml` and parsed at boot with the no_std parser in
//! `tether-core`. `build.rs` has already validated the file on the host, so
//! a failure here means the two disagree.

use defmt::*;

use tether_core::config::{parse_config, BoardConfig};
use tether_hal_rp2040::gpio_to_uart;

/// Embedded configuration (compiled into firmware)
/// Edit channel.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../../channel.toml");

/// Parse and check the embedded configuration
///
/// Falls back to [`BoardConfig::default`] if the file is rejected.
pub fn load() -> BoardConfig {
    let config = match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            error!("channel.toml line {}: {:?}", e.line, e.kind);
            error!("Using default channel configuration");
            return BoardConfig::default();
        }
    };

    match config.validate(|pin| gpio_to_uart(pin).map(|(id, _)| id)) {
        Ok(()) => {
            info!("Parsed embedded configuration successfully");
            config
        }
        Err(e) => {
            error!("channel.toml rejected: {:?}", e);
            error!("Using default channel configuration");
            BoardConfig::default()
        }
    }
}
