//! Firmware tasks
//!
//! The link runs as an Embassy task on core 0. The console has core 1 to
//! itself and never yields, so it is a plain blocking loop.

pub mod console;
pub mod link;

pub use console::console_loop;
pub use link::{link_task, LinkBus, LINK_BUS};
