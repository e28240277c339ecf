//! Status bitfield
//!
//! The single-writer handoff token between the caller and the interrupt
//! handler. Caller-side mutation of a channel is only valid while the
//! relevant done flags are set; the interrupt handler sets them, and
//! `start_transfer` clears them.

use portable_atomic::{AtomicU8, Ordering};

/// Channel status flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusFlags(u8);

impl StatusFlags {
    /// Channel has been initialized
    pub const INITIALIZED: Self = Self(0x1);
    /// Transmit phase finished (or never configured)
    pub const TX_DONE: Self = Self(0x2);
    /// Receive phase finished (or never configured)
    pub const RX_DONE: Self = Self(0x4);
    /// Initialized with nothing in flight
    pub const IDLE: Self = Self(0x7);

    /// No flags set
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Raw bits
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Check if every flag in `other` is set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Check if no flag is set
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Union of two flag sets
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl core::ops::BitOr for StatusFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Atomically shared [`StatusFlags`]
#[derive(Debug)]
pub(crate) struct AtomicStatus(AtomicU8);

impl AtomicStatus {
    pub(crate) const fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    pub(crate) fn load(&self) -> StatusFlags {
        StatusFlags(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, flags: StatusFlags) {
        self.0.store(flags.0, Ordering::Release);
    }

    pub(crate) fn insert(&self, flags: StatusFlags) {
        self.0.fetch_or(flags.0, Ordering::AcqRel);
    }

    pub(crate) fn remove(&self, flags: StatusFlags) {
        self.0.fetch_and(!flags.0, Ordering::AcqRel);
    }
}
