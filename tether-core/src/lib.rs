//! Board-agnostic core of the Tether serial stack
//!
//! This crate contains the parts of a serial channel that do not depend on
//! a specific chip:
//!
//! - Interrupt-driven UART transfer engine ([`bus::UartBus`])
//! - Bus events and the handler contract
//! - Channel state machine over the status bitfield
//! - Configuration types and the `channel.toml` parser

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod bus;
pub mod config;
pub mod event;
pub mod state;

pub use bus::{Transmit, UartBus, DEFAULT_FILL_BYTE};
pub use event::{Event, EventHandler, EventKind, Role, StubHandler};
pub use state::{ChannelState, StatusFlags};
