//! Configuration type definitions
//!
//! These types describe the serial channels of a board. They are filled in
//! from the embedded `channel.toml` by [`parse_config`](super::parse_config).

use tether_hal::{DataBits, Parity, StopBits, UartConfig};

use crate::bus::DEFAULT_FILL_BYTE;

/// Current configuration format version
pub const CONFIG_VERSION: u8 = 1;

/// Line and transfer settings of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    /// Byte sent by fill-mode transmits
    pub fill_byte: u8,
    /// Give up on a transfer after this long (0 waits forever)
    pub timeout_ms: u32,
    /// GPIO number of the TX pin
    pub tx_pin: u8,
    /// GPIO number of the RX pin
    pub rx_pin: u8,
}

impl ChannelConfig {
    /// Channel on the given pins with default line settings
    pub const fn on_pins(tx_pin: u8, rx_pin: u8) -> Self {
        Self {
            baudrate: 115_200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            fill_byte: DEFAULT_FILL_BYTE,
            timeout_ms: 100,
            tx_pin,
            rx_pin,
        }
    }

    /// Line settings for the register interface
    pub fn uart(&self) -> UartConfig {
        UartConfig {
            baudrate: self.baudrate,
            data_bits: self.data_bits,
            parity: self.parity,
            stop_bits: self.stop_bits,
        }
    }
}

/// Board-level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardConfig {
    /// Config format version
    pub version: u8,
    /// Console channel, driven through the blocking pipe
    pub console: ChannelConfig,
    /// Link channel, driven by the interrupt engine
    pub link: ChannelConfig,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            console: ChannelConfig::on_pins(0, 1),
            link: ChannelConfig::on_pins(4, 5),
        }
    }
}

/// Configuration consistency errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Unsupported format version
    VersionMismatch,
    /// A channel has a zero baud rate
    ZeroBaudrate,
    /// The same GPIO is assigned twice
    PinConflict(u8),
    /// A pin has no UART, or a channel's pins sit on different UARTs
    UnroutablePin(u8),
    /// Both channels resolve to the same UART peripheral
    UartConflict,
}

impl BoardConfig {
    /// Check cross-field constraints the parser cannot see
    ///
    /// `uart_of` maps a GPIO to the UART peripheral it can carry, which is
    /// chip specific. Each channel needs both pins on one UART, and the two
    /// channels need different UARTs.
    pub fn validate<U: PartialEq>(
        &self,
        uart_of: impl Fn(u8) -> Option<U>,
    ) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::VersionMismatch);
        }

        if self.console.baudrate == 0 || self.link.baudrate == 0 {
            return Err(ConfigError::ZeroBaudrate);
        }

        let pins = [
            self.console.tx_pin,
            self.console.rx_pin,
            self.link.tx_pin,
            self.link.rx_pin,
        ];
        for (i, pin) in pins.iter().enumerate() {
            if pins[i + 1..].contains(pin) {
                return Err(ConfigError::PinConflict(*pin));
            }
        }

        let console = self.console.uart_on(&uart_of)?;
        let link = self.link.uart_on(&uart_of)?;
        if console == link {
            return Err(ConfigError::UartConflict);
        }

        Ok(())
    }
}

impl ChannelConfig {
    fn uart_on<U: PartialEq>(&self, uart_of: &impl Fn(u8) -> Option<U>) -> Result<U, ConfigError> {
        let tx = uart_of(self.tx_pin).ok_or(ConfigError::UnroutablePin(self.tx_pin))?;
        match uart_of(self.rx_pin) {
            Some(rx) if rx == tx => Ok(tx),
            _ => Err(ConfigError::UnroutablePin(self.rx_pin)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::rp2040_uart;

    #[test]
    fn test_default_board_is_valid() {
        let config = BoardConfig::default();
        assert_eq!(config.validate(rp2040_uart), Ok(()));
        assert_eq!(config.link.fill_byte, 0xff);
        assert_eq!(config.console.uart(), UartConfig::default());
    }

    #[test]
    fn test_pin_conflict() {
        let mut config = BoardConfig::default();
        config.link.rx_pin = config.console.tx_pin;
        assert_eq!(config.validate(rp2040_uart), Err(ConfigError::PinConflict(0)));
    }

    #[test]
    fn test_zero_baudrate() {
        let mut config = BoardConfig::default();
        config.console.baudrate = 0;
        assert_eq!(config.validate(rp2040_uart), Err(ConfigError::ZeroBaudrate));
    }

    #[test]
    fn test_channels_on_same_uart() {
        // gpio12/13 are UART0, like the console on gpio0/1
        let mut config = BoardConfig::default();
        config.link.tx_pin = 12;
        config.link.rx_pin = 13;
        assert_eq!(config.validate(rp2040_uart), Err(ConfigError::UartConflict));

        config.link.tx_pin = 8;
        config.link.rx_pin = 9;
        assert_eq!(config.validate(rp2040_uart), Ok(()));
    }

    #[test]
    fn test_unroutable_pins() {
        let mut config = BoardConfig::default();
        config.link.tx_pin = 2;
        assert_eq!(config.validate(rp2040_uart), Err(ConfigError::UnroutablePin(2)));

        // TX on UART1, RX on UART0
        let mut config = BoardConfig::default();
        config.link.rx_pin = 13;
        assert_eq!(config.validate(rp2040_uart), Err(ConfigError::UnroutablePin(13)));
    }
}
