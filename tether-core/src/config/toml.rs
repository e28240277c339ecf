//! Simple TOML parser for channel configuration
//!
//! This is a minimal TOML parser that handles only the subset needed for
//! `channel.toml`. It does NOT support the full TOML grammar.
//!
//! Supported features:
//! - Key = value pairs (string, integer)
//! - Hexadecimal integers (`0xff`)
//! - `[console]` and `[link]` section headers
//! - Comments (# ...)
//!
//! Unknown keys are rejected so that typos do not silently fall back to
//! defaults.

use tether_hal::{DataBits, Parity, StopBits};

use super::types::{BoardConfig, ChannelConfig};

/// Parse error with the 1-based line it occurred on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

/// What went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseErrorKind {
    /// Invalid section header
    InvalidSection,
    /// Line is neither a header nor `key = value`
    InvalidLine,
    /// Key not known in this section
    UnknownKey,
    /// Invalid value type or out of range
    InvalidValue,
    /// Invalid pin string
    InvalidPin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Console,
    Link,
}

/// Parse TOML configuration into a [`BoardConfig`]
///
/// Keys that are absent keep their [`BoardConfig::default`] values.
pub fn parse_config(input: &str) -> Result<BoardConfig, ParseError> {
    let mut config = BoardConfig::default();
    let mut section = Section::Root;

    for (idx, line) in input.lines().enumerate() {
        let at = |kind: ParseErrorKind| ParseError { line: idx + 1, kind };
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            section = parse_section_header(strip_comment(line)).map_err(at)?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(at(ParseErrorKind::InvalidLine))?;

        match section {
            Section::Root => match key {
                "version" => config.version = parse_int(value).map_err(at)?,
                _ => return Err(at(ParseErrorKind::UnknownKey)),
            },
            Section::Console => apply_channel_value(&mut config.console, key, value).map_err(at)?,
            Section::Link => apply_channel_value(&mut config.link, key, value).map_err(at)?,
        }
    }

    Ok(config)
}

fn parse_section_header(line: &str) -> Result<Section, ParseErrorKind> {
    let header = line
        .strip_prefix('[')
        .and_then(|l| l.strip_suffix(']'))
        .ok_or(ParseErrorKind::InvalidSection)?;

    match header.trim() {
        "console" => Ok(Section::Console),
        "link" => Ok(Section::Link),
        _ => Err(ParseErrorKind::InvalidSection),
    }
}

fn apply_channel_value(
    channel: &mut ChannelConfig,
    key: &str,
    value: &str,
) -> Result<(), ParseErrorKind> {
    match key {
        "baudrate" => channel.baudrate = parse_int(value)?,
        "data_bits" => {
            channel.data_bits =
                DataBits::from_count(parse_int(value)?).ok_or(ParseErrorKind::InvalidValue)?
        }
        "parity" => channel.parity = parse_parity(value)?,
        "stop_bits" => {
            channel.stop_bits = match parse_int::<u8>(value)? {
                1 => StopBits::One,
                2 => StopBits::Two,
                _ => return Err(ParseErrorKind::InvalidValue),
            }
        }
        "fill_byte" => channel.fill_byte = parse_int(value)?,
        "timeout_ms" => channel.timeout_ms = parse_int(value)?,
        "tx_pin" => channel.tx_pin = parse_pin(value)?,
        "rx_pin" => channel.rx_pin = parse_pin(value)?,
        _ => return Err(ParseErrorKind::UnknownKey),
    }

    Ok(())
}

/// Drop a trailing comment outside of quotes
fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) if line[..pos].matches('"').count() % 2 == 0 => line[..pos].trim(),
        _ => line,
    }
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = strip_comment(value.trim());

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Parse a decimal or `0x` hexadecimal integer
fn parse_int<T: TryFrom<u32>>(value: &str) -> Result<T, ParseErrorKind> {
    let raw = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(&strip_underscores(hex), 16),
        None => strip_underscores(value).parse(),
    }
    .map_err(|_| ParseErrorKind::InvalidValue)?;

    T::try_from(raw).map_err(|_| ParseErrorKind::InvalidValue)
}

/// Copy `value` without the `_` separators TOML allows between digits
fn strip_underscores(value: &str) -> heapless::String<16> {
    let mut out = heapless::String::new();
    for c in value.chars().filter(|&c| c != '_') {
        if out.push(c).is_err() {
            // Too long for any u32; leave it unparsable
            out.clear();
            break;
        }
    }
    out
}

fn parse_parity(value: &str) -> Result<Parity, ParseErrorKind> {
    match parse_string(value) {
        "none" => Ok(Parity::None),
        "even" => Ok(Parity::Even),
        "odd" => Ok(Parity::Odd),
        _ => Err(ParseErrorKind::InvalidValue),
    }
}

/// Parse a pin string like "gpio4"
fn parse_pin(value: &str) -> Result<u8, ParseErrorKind> {
    let value = parse_string(value);

    let num = value
        .strip_prefix("gpio")
        .ok_or(ParseErrorKind::InvalidPin)?;
    let pin: u8 = num.parse().map_err(|_| ParseErrorKind::InvalidPin)?;

    if pin > 29 {
        return Err(ParseErrorKind::InvalidPin);
    }

    Ok(pin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pin() {
        assert_eq!(parse_pin("gpio4"), Ok(4));
        assert_eq!(parse_pin("\"gpio29\""), Ok(29));
        assert_eq!(parse_pin("gpio30"), Err(ParseErrorKind::InvalidPin));
        assert_eq!(parse_pin("pin4"), Err(ParseErrorKind::InvalidPin));
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int::<u8>("0xff"), Ok(0xff));
        assert_eq!(parse_int::<u32>("1_000_000"), Ok(1_000_000));
        assert_eq!(parse_int::<u8>("256"), Err(ParseErrorKind::InvalidValue));
        assert_eq!(parse_int::<u32>("-1"), Err(ParseErrorKind::InvalidValue));
    }

    #[test]
    fn test_parse_section_header() {
        assert_eq!(parse_section_header("[console]"), Ok(Section::Console));
        assert_eq!(parse_section_header("[ link ]"), Ok(Section::Link));
        assert_eq!(
            parse_section_header("[display]"),
            Err(ParseErrorKind::InvalidSection)
        );
    }

    #[test]
    fn test_parse_full_config() {
        let config_str = r#"
version = 1

[console]
baudrate = 115200
tx_pin = "gpio0"
rx_pin = "gpio1"

[link]  # board-to-board
baudrate = 1_000_000
data_bits = 8
parity = "even"
stop_bits = 2
fill_byte = 0x00
timeout_ms = 50
tx_pin = "gpio4"
rx_pin = "gpio5"
"#;

        let config = parse_config(config_str).unwrap();
        assert_eq!(config.console.baudrate, 115_200);
        assert_eq!(config.console.rx_pin, 1);
        assert_eq!(config.link.baudrate, 1_000_000);
        assert_eq!(config.link.parity, Parity::Even);
        assert_eq!(config.link.stop_bits, StopBits::Two);
        assert_eq!(config.link.fill_byte, 0x00);
        assert_eq!(config.link.timeout_ms, 50);
        assert_eq!(config.validate(crate::config::rp2040_uart), Ok(()));
    }

    #[test]
    fn test_missing_keys_keep_defaults() {
        let config = parse_config("[link]\nbaudrate = 9600\n").unwrap();
        assert_eq!(config.link.baudrate, 9600);
        assert_eq!(config.link.fill_byte, crate::bus::DEFAULT_FILL_BYTE);
        assert_eq!(config.console, BoardConfig::default().console);
    }

    #[test]
    fn test_errors_carry_line() {
        let err = parse_config("[console]\n\nbaud = 9600\n").unwrap_err();
        assert_eq!(
            err,
            ParseError {
                line: 3,
                kind: ParseErrorKind::UnknownKey
            }
        );

        let err = parse_config("[link]\ndata_bits = 9\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidValue);

        let err = parse_config("version\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidLine);
    }

    #[test]
    fn test_parsed_link_sharing_console_uart_is_rejected() {
        let config = parse_config("[link]\ntx_pin = \"gpio12\"\nrx_pin = \"gpio13\"\n").unwrap();
        assert_eq!(
            config.validate(crate::config::rp2040_uart),
            Err(crate::config::ConfigError::UartConflict)
        );
    }
}
