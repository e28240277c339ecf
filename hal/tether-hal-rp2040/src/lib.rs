//! RP2040-specific HAL for Tether serial channels
//!
//! This crate provides RP2040 implementations of the shared `tether-hal`
//! traits:
//!
//! - UART peripheral allocation and pin routing
//! - PL011 register interface (implements `tether_hal::UartRegisters`)
//! - NVIC interrupt lines (implements `tether_hal::IrqLine`)

#![no_std]

pub mod irq;
pub mod uart;

pub use irq::NvicLine;
pub use uart::{gpio_to_uart, route_pins, PinRole, Rp2040Uart, UartAllocator, UartId};
