//! Tether Hardware Abstraction Layer
//!
//! This crate defines the hardware-facing traits of a serial channel. Chip
//! HALs (RP2040, ...) implement them, and the transfer engine in
//! `tether-core` and the blocking drivers in `tether-drivers` are written
//! against them only.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  tether-core (UartBus)  tether-drivers   │
//! └──────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌──────────────────────────────────────────┐
//! │  tether-hal (this crate - traits)        │
//! └──────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │  tether-hal-  │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::UartRegisters`] - Per-unit UART register primitives
//! - [`irq::IrqLine`] - Interrupt controller line of a channel
//! - [`bus::BlockingBus`] - Synchronous lock/execute/unlock bus

#![no_std]
#![deny(unsafe_code)]

pub mod bus;
pub mod error;
pub mod irq;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use bus::{BlockingBus, Buffers, BusLock};
pub use error::{BusError, Status};
pub use irq::IrqLine;
pub use uart::{DataBits, IrqSources, Parity, StopBits, UartConfig, UartRegisters};
