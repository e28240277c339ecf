//! PL011 UART register interface
//!
//! RP2040 has two UART peripherals (UART0 and UART1). This module tracks
//! their usage and implements [`UartRegisters`] directly on their register
//! blocks, with the FIFOs disabled so that every unit raises its own
//! interrupt.

use embassy_rp::pac;
use embassy_rp::peripherals::{UART0, UART1};
use embassy_rp::Peri;

use tether_hal::uart::{DataBits, IrqSources, Parity, StopBits, UartConfig, UartRegisters};
use tether_hal::BusError;

/// UART peripheral identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartId {
    Uart0,
    Uart1,
}

impl UartId {
    fn regs(self) -> pac::uart::Uart {
        match self {
            UartId::Uart0 => pac::UART0,
            UartId::Uart1 => pac::UART1,
        }
    }
}

/// UART allocation state
pub struct UartAllocator {
    uart0_allocated: bool,
    uart1_allocated: bool,
}

impl Default for UartAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl UartAllocator {
    /// Create a new UART allocator
    pub fn new() -> Self {
        Self {
            uart0_allocated: false,
            uart1_allocated: false,
        }
    }

    /// Allocate a UART peripheral
    pub fn allocate(&mut self, id: UartId) -> Result<(), BusError> {
        let slot = match id {
            UartId::Uart0 => &mut self.uart0_allocated,
            UartId::Uart1 => &mut self.uart1_allocated,
        };

        if *slot {
            Err(BusError::Busy)
        } else {
            *slot = true;
            Ok(())
        }
    }

    /// Release a UART peripheral
    pub fn release(&mut self, id: UartId) {
        match id {
            UartId::Uart0 => self.uart0_allocated = false,
            UartId::Uart1 => self.uart1_allocated = false,
        }
    }
}

/// Role of a GPIO in a UART pin pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinRole {
    Tx,
    Rx,
}

/// Determine which UART, and in which role, can use a given GPIO pin
///
/// RP2040 has specific pin mappings for each UART.
pub fn gpio_to_uart(gpio: u8) -> Option<(UartId, PinRole)> {
    // UART0: GPIO 0/1, 12/13, 16/17, 28/29
    // UART1: GPIO 4/5, 8/9, 20/21, 24/25
    let id = match gpio {
        0 | 1 | 12 | 13 | 16 | 17 | 28 | 29 => UartId::Uart0,
        4 | 5 | 8 | 9 | 20 | 21 | 24 | 25 => UartId::Uart1,
        _ => return None,
    };
    let role = if gpio % 2 == 0 { PinRole::Tx } else { PinRole::Rx };
    Some((id, role))
}

/// Route a TX/RX pin pair to a UART
///
/// Validates the pair against the RP2040 pin map and selects the UART
/// function on both pads.
pub fn route_pins(id: UartId, tx_gpio: u8, rx_gpio: u8) -> Result<(), BusError> {
    if gpio_to_uart(tx_gpio) != Some((id, PinRole::Tx))
        || gpio_to_uart(rx_gpio) != Some((id, PinRole::Rx))
    {
        return Err(BusError::Invalid);
    }

    for (gpio, pull_up) in [(tx_gpio, false), (rx_gpio, true)] {
        let n = gpio as usize;
        pac::PADS_BANK0.gpio(n).write(|w| {
            w.set_ie(true);
            w.set_od(false);
            w.set_pue(pull_up);
        });
        // Function 2 is UART on every UART-capable pad
        pac::IO_BANK0.gpio(n).ctrl().write(|w| w.set_funcsel(2));
    }

    Ok(())
}

/// PL011 register interface for one UART
#[derive(Clone, Copy)]
pub struct Rp2040Uart {
    id: UartId,
    regs: pac::uart::Uart,
}

impl Rp2040Uart {
    /// Take ownership of UART0
    pub fn uart0(_uart: Peri<'static, UART0>) -> Self {
        Self::from_id(UartId::Uart0)
    }

    /// Take ownership of UART1
    pub fn uart1(_uart: Peri<'static, UART1>) -> Self {
        Self::from_id(UartId::Uart1)
    }

    fn from_id(id: UartId) -> Self {
        Self { id, regs: id.regs() }
    }

    /// Which peripheral this is
    pub fn id(&self) -> UartId {
        self.id
    }
}

/// Baud rate divisor (integer, fractional) for the PL011
///
/// Same rounding as the RP2040 datasheet: 16x oversampling with a 6-bit
/// fractional part, clamped to the divisor range.
pub fn baud_divisor(clk_peri_hz: u32, baudrate: u32) -> Result<(u16, u8), BusError> {
    if baudrate == 0 {
        return Err(BusError::Invalid);
    }

    let div = (8 * clk_peri_hz as u64) / baudrate as u64;
    let ibrd = div >> 7;

    Ok(match ibrd {
        0 => (1, 0),
        i if i >= 65535 => (65535, 0),
        i => (i as u16, (((div & 0x7f) + 1) / 2) as u8),
    })
}

impl UartRegisters for Rp2040Uart {
    fn setup(&self, config: &UartConfig) -> Result<(), BusError> {
        let r = self.regs;
        let (ibrd, fbrd) = baud_divisor(embassy_rp::clocks::clk_peri_freq(), config.baudrate)?;

        r.uartcr().write(|w| w.set_uarten(false));

        r.uartibrd().write(|w| w.set_baud_divint(ibrd));
        r.uartfbrd().write(|w| w.set_baud_divfrac(fbrd));

        // The divisor latches on the LCR_H write below
        r.uartlcr_h().write(|w| {
            w.set_wlen(config.data_bits.count() - 5);
            w.set_stp2(config.stop_bits == StopBits::Two);
            w.set_pen(config.parity != Parity::None);
            w.set_eps(config.parity == Parity::Even);
            w.set_fen(false);
        });

        r.uartimsc().write(|_| {});
        r.uarticr().write(|w| {
            w.set_rxic(true);
            w.set_txic(true);
        });

        r.uartcr().write(|w| {
            w.set_uarten(true);
            w.set_txe(true);
            w.set_rxe(true);
        });

        Ok(())
    }

    fn write_unit(&self, unit: u8) -> Result<(), BusError> {
        if self.regs.uartfr().read().txff() {
            return Err(BusError::Busy);
        }
        self.regs.uartdr().write(|w| w.set_data(unit));
        Ok(())
    }

    fn read_unit(&self) -> u8 {
        self.regs.uartdr().read().data()
    }

    fn pending(&self) -> IrqSources {
        let mis = self.regs.uartmis().read();
        let mut sources = IrqSources::NONE;
        if mis.txmis() {
            sources |= IrqSources::TX;
        }
        if mis.rxmis() {
            sources |= IrqSources::RX;
        }
        sources
    }

    fn enable(&self, sources: IrqSources) {
        self.regs.uartimsc().modify(|w| {
            if sources.contains(IrqSources::TX) {
                w.set_txim(true);
            }
            if sources.contains(IrqSources::RX) {
                w.set_rxim(true);
            }
        });
    }

    fn disable(&self, sources: IrqSources) {
        self.regs.uartimsc().modify(|w| {
            if sources.contains(IrqSources::TX) {
                w.set_txim(false);
            }
            if sources.contains(IrqSources::RX) {
                w.set_rxim(false);
            }
        });
    }

    fn clear(&self, sources: IrqSources) {
        self.regs.uarticr().write(|w| {
            w.set_txic(sources.contains(IrqSources::TX));
            w.set_rxic(sources.contains(IrqSources::RX));
        });
    }

    fn can_write(&self) -> bool {
        !self.regs.uartfr().read().txff()
    }

    fn can_read(&self) -> bool {
        !self.regs.uartfr().read().rxfe()
    }

    fn take_line_error(&self) -> Option<BusError> {
        let rsr = self.regs.uartrsr().read();

        let error = if rsr.oe() {
            BusError::Overrun
        } else if rsr.be() {
            BusError::Break
        } else if rsr.pe() {
            BusError::Parity
        } else if rsr.fe() {
            BusError::Framing
        } else {
            return None;
        };

        // Any write clears the receive status flags
        self.regs.uartrsr().write(|w| {
            w.set_oe(false);
            w.set_be(false);
            w.set_pe(false);
            w.set_fe(false);
        });

        Some(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpio_mapping() {
        assert_eq!(gpio_to_uart(0), Some((UartId::Uart0, PinRole::Tx)));
        assert_eq!(gpio_to_uart(1), Some((UartId::Uart0, PinRole::Rx)));
        assert_eq!(gpio_to_uart(8), Some((UartId::Uart1, PinRole::Tx)));
        assert_eq!(gpio_to_uart(25), Some((UartId::Uart1, PinRole::Rx)));
        assert_eq!(gpio_to_uart(2), None);
    }

    #[test]
    fn test_allocator() {
        let mut alloc = UartAllocator::new();
        assert!(alloc.allocate(UartId::Uart0).is_ok());
        assert_eq!(alloc.allocate(UartId::Uart0), Err(BusError::Busy));
        alloc.release(UartId::Uart0);
        assert!(alloc.allocate(UartId::Uart0).is_ok());
        assert!(alloc.allocate(UartId::Uart1).is_ok());
    }

    #[test]
    fn test_baud_divisor_115200() {
        // 125 MHz peripheral clock: 67.817 -> 67 + 52/64
        assert_eq!(baud_divisor(125_000_000, 115_200), Ok((67, 52)));
        assert_eq!(baud_divisor(125_000_000, 0), Err(BusError::Invalid));
    }
}
