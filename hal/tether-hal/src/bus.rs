//! Blocking bus contract
//!
//! A strictly synchronous bus flavor: the caller locks the bus, describes
//! one transfer, executes it and unlocks. [`execute_blocking`] does not
//! return until the transfer resolves or faults.
//!
//! [`execute_blocking`]: BlockingBus::execute_blocking

use crate::error::{BusError, Status};

/// Buffers for one blocking transfer
///
/// Transmit happens before receive. Both buffers are cut to the same
/// length, as a single `length` applies to the whole transfer.
#[derive(Debug)]
pub struct Buffers<'b> {
    tx: Option<&'b [u8]>,
    rx: Option<&'b mut [u8]>,
}

impl<'b> Buffers<'b> {
    /// Configure the buffers of a transfer of `len` units
    ///
    /// Buffers shorter than `len` are used in full.
    pub fn configure(tx: Option<&'b [u8]>, rx: Option<&'b mut [u8]>, len: usize) -> Self {
        Self {
            tx: tx.map(|b| &b[..len.min(b.len())]),
            rx: rx.map(|b| {
                let n = len.min(b.len());
                &mut b[..n]
            }),
        }
    }

    /// Transmit-only transfer
    pub fn transmit(tx: &'b [u8]) -> Self {
        Self::configure(Some(tx), None, tx.len())
    }

    /// Receive-only transfer
    pub fn receive(rx: &'b mut [u8]) -> Self {
        let len = rx.len();
        Self::configure(None, Some(rx), len)
    }

    /// Transmit buffer, if any
    pub fn tx(&self) -> Option<&[u8]> {
        self.tx
    }

    /// Receive buffer, if any
    pub fn rx_mut(&mut self) -> Option<&mut [u8]> {
        self.rx.as_deref_mut()
    }

    /// Total number of units this transfer moves
    pub fn len(&self) -> usize {
        self.tx.map_or(0, |b| b.len()) + self.rx.as_ref().map_or(0, |b| b.len())
    }

    /// Check if there is nothing to move
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Synchronous bus driver
///
/// `lock`/`unlock` protect against concurrent callers of the same bus
/// instance only.
pub trait BlockingBus {
    /// Lazily initialize the bus
    fn init(&self) -> Status;

    /// Acquire exclusive use of the bus
    ///
    /// Blocks until the bus is free.
    fn lock(&self);

    /// Release the bus
    fn unlock(&self);

    /// Run a transfer to completion
    ///
    /// `moved` receives the number of units actually transferred, also on
    /// failure. A fault after some units moved should be reported as
    /// [`BusError::Io`].
    fn execute_blocking(&self, buffers: Buffers<'_>, moved: &mut usize) -> Status;
}

impl<T: BlockingBus + ?Sized> BlockingBus for &T {
    fn init(&self) -> Status {
        T::init(self)
    }

    fn lock(&self) {
        T::lock(self)
    }

    fn unlock(&self) {
        T::unlock(self)
    }

    fn execute_blocking(&self, buffers: Buffers<'_>, moved: &mut usize) -> Status {
        T::execute_blocking(self, buffers, moved)
    }
}

/// Scoped bus lock
///
/// Unlocks the bus when dropped.
pub struct BusLock<'a, B: BlockingBus + ?Sized> {
    bus: &'a B,
}

impl<'a, B: BlockingBus + ?Sized> BusLock<'a, B> {
    /// Lock `bus` until the guard is dropped
    pub fn acquire(bus: &'a B) -> Self {
        bus.lock();
        Self { bus }
    }

    /// Run a transfer while holding the lock
    pub fn execute(&self, buffers: Buffers<'_>, moved: &mut usize) -> Status {
        self.bus.execute_blocking(buffers, moved)
    }
}

impl<B: BlockingBus + ?Sized> Drop for BusLock<'_, B> {
    fn drop(&mut self) {
        self.bus.unlock();
    }
}

/// Classify a fault by how far the transfer got
///
/// Used by bus implementations: once a unit has moved, any fault becomes
/// partial I/O.
pub fn classify(error: BusError, moved: usize) -> BusError {
    if moved > 0 {
        BusError::Io
    } else {
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[test]
    fn test_configure_cuts_to_length() {
        let tx = [1u8, 2, 3, 4];
        let mut rx = [0u8; 8];
        let mut b = Buffers::configure(Some(&tx), Some(&mut rx), 3);
        assert_eq!(b.tx(), Some(&tx[..3]));
        assert_eq!(b.rx_mut().map(|r| r.len()), Some(3));
        assert_eq!(b.len(), 6);
    }

    #[test]
    fn test_receive_only() {
        let mut rx = [0u8; 5];
        let b = Buffers::receive(&mut rx);
        assert!(b.tx().is_none());
        assert_eq!(b.len(), 5);
        assert!(!b.is_empty());
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(BusError::Framing, 0), BusError::Framing);
        assert_eq!(classify(BusError::Framing, 2), BusError::Io);
    }

    struct CountingBus {
        locks: Cell<u32>,
        unlocks: Cell<u32>,
    }

    impl BlockingBus for CountingBus {
        fn init(&self) -> Status {
            Ok(())
        }

        fn lock(&self) {
            self.locks.set(self.locks.get() + 1);
        }

        fn unlock(&self) {
            self.unlocks.set(self.unlocks.get() + 1);
        }

        fn execute_blocking(&self, buffers: Buffers<'_>, moved: &mut usize) -> Status {
            *moved = buffers.len();
            Ok(())
        }
    }

    #[test]
    fn test_lock_guard_unlocks_on_drop() {
        let bus = CountingBus {
            locks: Cell::new(0),
            unlocks: Cell::new(0),
        };

        {
            let guard = BusLock::acquire(&bus);
            assert_eq!(bus.locks.get(), 1);
            assert_eq!(bus.unlocks.get(), 0);

            let mut moved = 0;
            assert_eq!(guard.execute(Buffers::transmit(b"hi"), &mut moved), Ok(()));
            assert_eq!(moved, 2);
        }

        assert_eq!(bus.unlocks.get(), 1);
    }
}
