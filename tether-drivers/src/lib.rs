//! Blocking serial drivers
//!
//! This crate provides the synchronous side of a Tether channel, written
//! against the traits in `tether-hal`:
//!
//! - [`ConsolePipe`]: blocking, echoing pipe over any [`BlockingBus`]
//! - [`PolledBus`]: busy-polling [`BlockingBus`] over UART registers
//! - [`BypassConsole`]: lock-free character output for early and panic logs
//!
//! [`BlockingBus`]: tether_hal::BlockingBus

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod bypass;
pub mod console;
pub mod polled;

pub use bypass::BypassConsole;
pub use console::ConsolePipe;
pub use polled::PolledBus;
