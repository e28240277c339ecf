//! Interrupt-driven UART bus
//!
//! [`UartBus`] is one channel of the transfer engine. The caller configures
//! buffers and starts a transfer; the interrupt handler
//! ([`UartBus::on_interrupt`]) then moves one unit per interrupt and
//! reports progress through the installed [`EventHandler`].
//!
//! # Handoff between contexts
//!
//! The status bitfield is the handoff token. Configuration calls are only
//! valid while their phase is done, which the interrupt handler
//! establishes and [`UartBus::start_transfer`] clears. The transfer context
//! itself sits behind a blocking mutex so that caller operations and an
//! interrupt step never interleave.
//!
//! # Preconditions
//!
//! Configuring a phase that is in flight is a programming error. It is a
//! fatal assertion in debug builds; in release builds the check is skipped
//! and the effect on the running transfer is unspecified.
//!
//! # Example
//!
//! ```ignore
//! static BUS: UartBus<'static, CriticalSectionRawMutex, Rp2040Uart, NvicLine> =
//!     UartBus::new(regs, line);
//!
//! BUS.init(&UartConfig::default())?;
//! BUS.set_handler(&|event| SIGNAL.signal(event));
//! BUS.set_tx(b"ping");
//! BUS.set_rx(RX_BUF.take());
//! BUS.start_transfer()?;
//! ```

mod context;
mod interrupt;

pub use context::Transmit;

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use tether_hal::{BusError, IrqLine, IrqSources, UartConfig, UartRegisters};

use crate::event::{EventHandler, STUB};
use crate::state::status::AtomicStatus;
use crate::state::{ChannelState, StatusFlags};

use context::TransferContext;

/// Default byte sent in fill mode
pub const DEFAULT_FILL_BYTE: u8 = 0xff;

/// One interrupt-driven UART channel
pub struct UartBus<'a, M: RawMutex, R: UartRegisters, I: IrqLine> {
    regs: R,
    line: I,
    status: AtomicStatus,
    ctx: Mutex<M, RefCell<TransferContext<'a>>>,
}

impl<'a, M: RawMutex, R: UartRegisters, I: IrqLine> UartBus<'a, M, R, I> {
    /// Create an uninitialized channel
    ///
    /// Usable in a `static`; nothing touches the hardware until
    /// [`init`](Self::init).
    pub const fn new(regs: R, line: I) -> Self {
        Self {
            regs,
            line,
            status: AtomicStatus::new(),
            ctx: Mutex::new(RefCell::new(TransferContext::new())),
        }
    }

    /// Initialize the channel
    ///
    /// Must be called exactly once, before any other operation. Applies
    /// `config` through the register interface and leaves the channel idle.
    pub fn init(&self, config: &UartConfig) -> Result<(), BusError> {
        debug_assert!(
            self.status.load().is_empty(),
            "UART channel initialized twice"
        );

        self.regs.setup(config).inspect_err(|e| {
            warn!("UART setup failed: {:?}", e);
        })?;

        self.ctx.lock(|ctx| *ctx.borrow_mut() = TransferContext::new());
        self.status.store(StatusFlags::IDLE);

        debug!("UART channel initialized at {} baud", config.baudrate);
        Ok(())
    }

    /// Set the receive buffer
    ///
    /// An empty buffer leaves receive unconfigured.
    ///
    /// # Panics
    ///
    /// In debug builds, if the channel is not initialized or a receive is
    /// in flight.
    pub fn set_rx(&self, rx: &'a mut [u8]) {
        self.expect(
            StatusFlags::INITIALIZED | StatusFlags::RX_DONE,
            "receive buffer set while a receive is in flight",
        );

        self.ctx.lock(|ctx| {
            let mut ctx = ctx.borrow_mut();
            ctx.rx = if rx.is_empty() { None } else { Some(rx) };
            ctx.rx_idx = 0;
        });
    }

    /// Set the transmit buffer, leaving fill mode
    ///
    /// An empty buffer leaves transmit unconfigured.
    ///
    /// # Panics
    ///
    /// In debug builds, if the channel is not initialized or a transmit is
    /// in flight.
    pub fn set_tx(&self, tx: &'a [u8]) {
        self.expect(
            StatusFlags::INITIALIZED | StatusFlags::TX_DONE,
            "transmit buffer set while a transmit is in flight",
        );

        self.ctx.lock(|ctx| {
            let mut ctx = ctx.borrow_mut();
            ctx.tx = if tx.is_empty() {
                Transmit::None
            } else {
                Transmit::Buffer(tx)
            };
            ctx.tx_idx = 0;
        });
    }

    /// Transmit `len` copies of `fill_byte`
    ///
    /// # Panics
    ///
    /// In debug builds, if the channel is not initialized or a transmit is
    /// in flight.
    pub fn set_tx_fill(&self, len: usize, fill_byte: u8) {
        self.expect(
            StatusFlags::INITIALIZED | StatusFlags::TX_DONE,
            "fill transmit set while a transmit is in flight",
        );

        self.ctx.lock(|ctx| {
            let mut ctx = ctx.borrow_mut();
            ctx.tx = if len == 0 {
                Transmit::None
            } else {
                Transmit::Fill {
                    byte: fill_byte,
                    len,
                }
            };
            ctx.tx_idx = 0;
        });
    }

    /// Install the event handler
    ///
    /// The handler is used until [`reset_handler`](Self::reset_handler).
    ///
    /// # Panics
    ///
    /// In debug builds, if the channel is not idle.
    pub fn set_handler(&self, handler: &'a dyn EventHandler) {
        self.expect(StatusFlags::IDLE, "handler set during a transfer");
        self.ctx.lock(|ctx| ctx.borrow_mut().handler = handler);
    }

    /// Revert to the stub handler, which panics on any event
    ///
    /// # Panics
    ///
    /// In debug builds, if the channel is not idle.
    pub fn reset_handler(&self) {
        self.expect(StatusFlags::IDLE, "handler reset during a transfer");
        self.ctx.lock(|ctx| ctx.borrow_mut().handler = STUB);
    }

    /// Forget both buffers and leave fill mode
    ///
    /// Returns the receive buffer, if one was set.
    ///
    /// # Panics
    ///
    /// In debug builds, if the channel is not idle.
    pub fn reset_buffers(&self) -> Option<&'a mut [u8]> {
        self.expect(StatusFlags::IDLE, "buffers reset during a transfer");
        self.ctx.lock(|ctx| {
            let mut ctx = ctx.borrow_mut();
            ctx.tx = Transmit::None;
            ctx.tx_idx = 0;
            ctx.rx_idx = 0;
            ctx.rx.take()
        })
    }

    /// Run `f` over the units received so far
    ///
    /// Returns `None` while a receive is in flight or if no receive buffer
    /// is set.
    pub fn with_received<U>(&self, f: impl FnOnce(&[u8]) -> U) -> Option<U> {
        if !self.status.load().contains(StatusFlags::RX_DONE) {
            return None;
        }

        self.ctx.lock(|ctx| {
            let ctx = ctx.borrow();
            let idx = ctx.rx_idx;
            ctx.rx.as_deref().map(|rx| f(&rx[..idx]))
        })
    }

    /// Start a transfer with the configured buffers
    ///
    /// If transmit is configured, its first unit is pushed right away so
    /// the hardware raises the interrupt that drives the rest. Receive is
    /// driven entirely by interrupts.
    ///
    /// # Panics
    ///
    /// In debug builds, if the channel is not idle or no buffer is set.
    pub fn start_transfer(&self) -> Result<(), BusError> {
        self.expect(StatusFlags::IDLE, "transfer started while another is in flight");

        let sources = self.ctx.lock(|ctx| {
            let mut ctx = ctx.borrow_mut();
            debug_assert!(ctx.has_work(), "transfer started with no buffers set");

            let mut sources = IrqSources::NONE;
            let mut in_flight = StatusFlags::empty();

            if let Some(first) = ctx.tx.unit_at(0) {
                self.regs.write_unit(first)?;
                ctx.tx_idx = 1;
                sources |= IrqSources::TX;
                in_flight = in_flight | StatusFlags::TX_DONE;
            }

            if ctx.rx_len() > 0 {
                ctx.rx_idx = 0;
                sources |= IrqSources::RX;
                in_flight = in_flight | StatusFlags::RX_DONE;
            }

            trace!(
                "UART transfer: tx={} rx={}",
                ctx.tx.len(),
                ctx.rx_len()
            );

            self.status.remove(in_flight);
            Ok::<_, BusError>(sources)
        })?;

        if !sources.is_empty() {
            self.line.unmask();
            self.regs.enable(sources);
        }

        Ok(())
    }

    /// Abort whatever is in flight and return to idle
    ///
    /// Unconditional. Interrupt sources are disabled and cleared first, then
    /// both phases are marked done under the context lock, so an interrupt
    /// that was already executing finishes its step before the flags change.
    /// Any interrupt that still arrives afterwards finds nothing in flight
    /// and fires no events. No events are fired for the aborted transfer.
    pub fn cancel_transfer(&self) {
        self.regs.disable(IrqSources::ALL);
        self.line.mask();
        self.regs.clear(IrqSources::ALL);
        self.line.clear_pending();

        self.ctx.lock(|_| {
            if self.status.load().contains(StatusFlags::INITIALIZED) {
                self.status.insert(StatusFlags::TX_DONE | StatusFlags::RX_DONE);
            }
        });

        debug!("UART transfer cancelled");
    }

    /// Current channel state
    pub fn state(&self) -> ChannelState {
        ChannelState::from_status(self.status.load())
    }

    /// Raw status flags
    pub fn status(&self) -> StatusFlags {
        self.status.load()
    }

    /// Check if the channel is initialized with nothing in flight
    pub fn is_idle(&self) -> bool {
        self.status.load().contains(StatusFlags::IDLE)
    }

    /// Check if the transmit descriptor is in fill mode
    pub fn is_fill_mode(&self) -> bool {
        self.ctx.lock(|ctx| ctx.borrow().tx.is_fill())
    }

    /// Take the pending line fault from the register interface
    ///
    /// Transport faults do not produce events; a stalled phase simply never
    /// completes. Callers that time out can inspect this to find out why.
    pub fn line_error(&self) -> Option<BusError> {
        self.regs.take_line_error()
    }

    /// Underlying register interface
    pub fn registers(&self) -> &R {
        &self.regs
    }

    fn expect(&self, flags: StatusFlags, msg: &str) {
        debug_assert!(self.status.load().contains(flags), "{}", msg);
    }
}
