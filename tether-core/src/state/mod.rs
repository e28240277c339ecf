//! Channel state
//!
//! The status bitfield shared between caller and interrupt context, and
//! the channel state derived from it. The state machine is explicit,
//! finite and deterministic.

pub mod machine;
pub mod status;

pub use machine::ChannelState;
#[cfg(test)]
pub use machine::Step;
pub use status::StatusFlags;
