//! Polled blocking bus
//!
//! A [`BlockingBus`] that moves every unit by busy-polling the UART status
//! flags. No interrupts are involved, so it can run on a core or in a
//! context that has none to spare.

use portable_atomic::{AtomicBool, Ordering};

use tether_hal::bus::classify;
use tether_hal::{BlockingBus, Buffers, BusError, Status, UartConfig, UartRegisters};

/// Busy-polling bus over UART registers
pub struct PolledBus<R: UartRegisters> {
    regs: R,
    config: UartConfig,
    ready: AtomicBool,
    locked: AtomicBool,
    /// Polls per unit before giving up, `None` to wait forever
    spin_limit: Option<u32>,
}

impl<R: UartRegisters> PolledBus<R> {
    /// Create a bus that applies `config` on first [`init`](BlockingBus::init)
    pub const fn new(regs: R, config: UartConfig) -> Self {
        Self {
            regs,
            config,
            ready: AtomicBool::new(false),
            locked: AtomicBool::new(false),
            spin_limit: None,
        }
    }

    /// Give up on a unit after `polls` status checks
    ///
    /// The transfer then fails with [`BusError::Timeout`], or with
    /// [`BusError::Io`] if some units already moved.
    pub fn with_spin_limit(mut self, polls: u32) -> Self {
        self.spin_limit = Some(polls);
        self
    }

    /// Underlying register interface
    pub fn registers(&self) -> &R {
        &self.regs
    }

    fn wait(&self, ready: impl Fn(&R) -> bool) -> Result<(), BusError> {
        let mut polls: u32 = 0;

        while !ready(&self.regs) {
            if self.spin_limit.is_some_and(|limit| polls >= limit) {
                return Err(BusError::Timeout);
            }
            polls = polls.wrapping_add(1);
            core::hint::spin_loop();
        }

        Ok(())
    }

    fn transmit(&self, tx: &[u8], moved: &mut usize) -> Status {
        for &unit in tx {
            self.wait(|r| r.can_write())
                .and_then(|()| self.regs.write_unit(unit))
                .map_err(|e| classify(e, *moved))?;
            *moved += 1;
        }
        Ok(())
    }

    fn receive(&self, rx: &mut [u8], moved: &mut usize) -> Status {
        for slot in rx {
            self.wait(|r| r.can_read())
                .map_err(|e| classify(e, *moved))?;

            let unit = self.regs.read_unit();
            if let Some(e) = self.regs.take_line_error() {
                warn!("UART line fault after {} units: {:?}", *moved, e);
                return Err(classify(e, *moved));
            }

            *slot = unit;
            *moved += 1;
        }
        Ok(())
    }
}

impl<R: UartRegisters> BlockingBus for PolledBus<R> {
    fn init(&self) -> Status {
        if self.ready.load(Ordering::Acquire) {
            return Ok(());
        }

        self.regs.setup(&self.config)?;
        self.ready.store(true, Ordering::Release);
        debug!("polled UART ready at {} baud", self.config.baudrate);
        Ok(())
    }

    fn lock(&self) {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            core::hint::spin_loop();
        }
    }

    fn unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }

    fn execute_blocking(&self, mut buffers: Buffers<'_>, moved: &mut usize) -> Status {
        *moved = 0;

        if !self.ready.load(Ordering::Acquire) {
            return Err(BusError::Invalid);
        }

        if let Some(tx) = buffers.tx() {
            self.transmit(tx, moved)?;
        }

        if let Some(rx) = buffers.rx_mut() {
            self.receive(rx, moved)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use core::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::vec::Vec;

    use tether_hal::IrqSources;

    #[derive(Default)]
    struct FifoUart {
        setups: Cell<usize>,
        sent: RefCell<Vec<u8>>,
        incoming: RefCell<VecDeque<u8>>,
        tx_room: Cell<Option<usize>>,
        fault_at: Cell<Option<(usize, BusError)>>,
        reads: Cell<usize>,
    }

    impl UartRegisters for FifoUart {
        fn setup(&self, _config: &UartConfig) -> Result<(), BusError> {
            self.setups.set(self.setups.get() + 1);
            Ok(())
        }

        fn write_unit(&self, unit: u8) -> Result<(), BusError> {
            self.sent.borrow_mut().push(unit);
            Ok(())
        }

        fn read_unit(&self) -> u8 {
            self.reads.set(self.reads.get() + 1);
            self.incoming.borrow_mut().pop_front().unwrap_or(0)
        }

        fn pending(&self) -> IrqSources {
            IrqSources::NONE
        }

        fn enable(&self, _sources: IrqSources) {}

        fn disable(&self, _sources: IrqSources) {}

        fn clear(&self, _sources: IrqSources) {}

        fn can_write(&self) -> bool {
            self.tx_room
                .get()
                .map_or(true, |room| self.sent.borrow().len() < room)
        }

        fn can_read(&self) -> bool {
            !self.incoming.borrow().is_empty()
        }

        fn take_line_error(&self) -> Option<BusError> {
            match self.fault_at.get() {
                Some((at, e)) if self.reads.get() == at + 1 => Some(e),
                _ => None,
            }
        }
    }

    fn ready_bus(uart: FifoUart) -> PolledBus<FifoUart> {
        let bus = PolledBus::new(uart, UartConfig::default()).with_spin_limit(16);
        bus.init().unwrap();
        bus
    }

    #[test]
    fn test_init_is_lazy_and_once() {
        let bus = PolledBus::new(FifoUart::default(), UartConfig::default());
        assert_eq!(bus.registers().setups.get(), 0);

        bus.init().unwrap();
        bus.init().unwrap();
        assert_eq!(bus.registers().setups.get(), 1);
    }

    #[test]
    fn test_execute_before_init() {
        let bus = PolledBus::new(FifoUart::default(), UartConfig::default());
        let mut moved = 7;
        assert_eq!(
            bus.execute_blocking(Buffers::transmit(b"x"), &mut moved),
            Err(BusError::Invalid)
        );
        assert_eq!(moved, 0);
    }

    #[test]
    fn test_transmit_then_receive() {
        let uart = FifoUart::default();
        uart.incoming.borrow_mut().extend([9, 8]);
        let bus = ready_bus(uart);

        let tx = [1, 2, 3];
        let mut rx = [0u8; 2];
        let mut moved = 0;
        let status = bus.execute_blocking(Buffers::configure(Some(&tx), Some(&mut rx), 3), &mut moved);

        assert_eq!(status, Ok(()));
        assert_eq!(moved, 5);
        assert_eq!(rx, [9, 8]);
        assert_eq!(*bus.registers().sent.borrow(), [1, 2, 3]);
    }

    #[test]
    fn test_stall_before_first_unit_times_out() {
        let uart = FifoUart::default();
        uart.tx_room.set(Some(0));
        let bus = ready_bus(uart);

        let mut moved = 0;
        assert_eq!(
            bus.execute_blocking(Buffers::transmit(b"abc"), &mut moved),
            Err(BusError::Timeout)
        );
        assert_eq!(moved, 0);
    }

    #[test]
    fn test_stall_mid_transfer_is_partial() {
        let uart = FifoUart::default();
        uart.tx_room.set(Some(2));
        let bus = ready_bus(uart);

        let mut moved = 0;
        assert_eq!(
            bus.execute_blocking(Buffers::transmit(b"abcd"), &mut moved),
            Err(BusError::Io)
        );
        assert_eq!(moved, 2);
    }

    #[test]
    fn test_line_fault_on_first_unit() {
        let uart = FifoUart::default();
        uart.incoming.borrow_mut().extend([1, 2]);
        uart.fault_at.set(Some((0, BusError::Parity)));
        let bus = ready_bus(uart);

        let mut rx = [0u8; 2];
        let mut moved = 0;
        assert_eq!(
            bus.execute_blocking(Buffers::receive(&mut rx), &mut moved),
            Err(BusError::Parity)
        );
        assert_eq!(moved, 0);
    }

    #[test]
    fn test_line_fault_mid_receive_is_partial() {
        let uart = FifoUart::default();
        uart.incoming.borrow_mut().extend([1, 2, 3]);
        uart.fault_at.set(Some((1, BusError::Framing)));
        let bus = ready_bus(uart);

        let mut rx = [0u8; 3];
        let mut moved = 0;
        assert_eq!(
            bus.execute_blocking(Buffers::receive(&mut rx), &mut moved),
            Err(BusError::Io)
        );
        assert_eq!(moved, 1);
        assert_eq!(rx[0], 1);
    }

    #[test]
    fn test_lock_is_reentrant_after_unlock() {
        let bus = ready_bus(FifoUart::default());
        bus.lock();
        bus.unlock();
        bus.lock();
        assert!(bus.locked.load(Ordering::Relaxed));
        bus.unlock();
        assert!(!bus.locked.load(Ordering::Relaxed));
    }
}
