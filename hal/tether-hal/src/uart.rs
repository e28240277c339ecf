//! UART register interface
//!
//! The minimal per-unit primitives a transfer engine needs from a UART
//! peripheral. Chip HALs implement [`UartRegisters`] over their register
//! blocks; all methods take `&self` because they are called from both
//! thread and interrupt context on a memory-mapped peripheral.

use crate::error::BusError;

/// Interrupt sources of a UART channel
///
/// A small bit set over the two sources the transfer engine drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqSources(u8);

impl IrqSources {
    /// No sources
    pub const NONE: Self = Self(0);
    /// Transmit FIFO has room for another unit
    pub const TX: Self = Self(0x1);
    /// A unit has been received
    pub const RX: Self = Self(0x2);
    /// Both sources
    pub const ALL: Self = Self(0x3);

    /// Check if every source in `other` is set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check if no source is set
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Union of two source sets
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Raw bits
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl core::ops::BitOr for IrqSources {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl core::ops::BitOrAssign for IrqSources {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// UART register interface
///
/// Opaque capability consumed by the transfer engine. No framing, baud or
/// parity handling happens above this trait; [`setup`](Self::setup) applies
/// a [`UartConfig`] once at initialization.
pub trait UartRegisters {
    /// Apply line configuration and enable the peripheral
    fn setup(&self, config: &UartConfig) -> Result<(), BusError>;

    /// Enqueue a single unit for transmission
    ///
    /// Non-blocking. Returns [`BusError::Busy`] if the peripheral cannot
    /// accept the unit.
    fn write_unit(&self, unit: u8) -> Result<(), BusError>;

    /// Dequeue a single received unit
    ///
    /// Non-blocking. The value is unspecified if nothing was received.
    fn read_unit(&self) -> u8;

    /// Interrupt sources currently asserted
    fn pending(&self) -> IrqSources;

    /// Enable (re-arm) interrupt sources
    fn enable(&self, sources: IrqSources);

    /// Disable interrupt sources
    fn disable(&self, sources: IrqSources);

    /// Clear asserted interrupt sources
    fn clear(&self, sources: IrqSources);

    /// Check if the transmitter can accept another unit
    fn can_write(&self) -> bool;

    /// Check if a received unit is waiting
    fn can_read(&self) -> bool;

    /// Take the pending line fault, if any
    ///
    /// Parity, framing, overrun and break conditions are reported here
    /// rather than through the transfer engine.
    fn take_line_error(&self) -> Option<BusError>;
}

impl<T: UartRegisters + ?Sized> UartRegisters for &T {
    fn setup(&self, config: &UartConfig) -> Result<(), BusError> {
        T::setup(self, config)
    }

    fn write_unit(&self, unit: u8) -> Result<(), BusError> {
        T::write_unit(self, unit)
    }

    fn read_unit(&self) -> u8 {
        T::read_unit(self)
    }

    fn pending(&self) -> IrqSources {
        T::pending(self)
    }

    fn enable(&self, sources: IrqSources) {
        T::enable(self, sources)
    }

    fn disable(&self, sources: IrqSources) {
        T::disable(self, sources)
    }

    fn clear(&self, sources: IrqSources) {
        T::clear(self, sources)
    }

    fn can_write(&self) -> bool {
        T::can_write(self)
    }

    fn can_read(&self) -> bool {
        T::can_read(self)
    }

    fn take_line_error(&self) -> Option<BusError> {
        T::take_line_error(self)
    }
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 115200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
}

impl DataBits {
    /// Create from a bit count
    pub fn from_count(bits: u8) -> Option<Self> {
        match bits {
            5 => Some(DataBits::Five),
            6 => Some(DataBits::Six),
            7 => Some(DataBits::Seven),
            8 => Some(DataBits::Eight),
            _ => None,
        }
    }

    /// Number of bits
    pub fn count(self) -> u8 {
        match self {
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        }
    }
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_union() {
        let s = IrqSources::TX | IrqSources::RX;
        assert_eq!(s, IrqSources::ALL);
        assert!(s.contains(IrqSources::TX));
        assert!(!IrqSources::RX.contains(IrqSources::TX));
        assert!(IrqSources::NONE.is_empty());
    }

    #[test]
    fn test_data_bits_roundtrip() {
        for bits in 5..=8 {
            let db = DataBits::from_count(bits).unwrap();
            assert_eq!(db.count(), bits);
        }
        assert_eq!(DataBits::from_count(9), None);
    }
}
