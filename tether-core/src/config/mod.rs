//! Channel configuration
//!
//! Board-agnostic configuration types and the parser for the TOML subset
//! used by `channel.toml`.

pub mod toml;
pub mod types;

pub use toml::{parse_config, ParseError, ParseErrorKind};
pub use types::*;

/// RP2040 pin to UART table
#[cfg(test)]
pub(crate) fn rp2040_uart(pin: u8) -> Option<u8> {
    match pin {
        0 | 1 | 12 | 13 | 16 | 17 | 28 | 29 => Some(0),
        4 | 5 | 8 | 9 | 20 | 21 | 24 | 25 => Some(1),
        _ => None,
    }
}
