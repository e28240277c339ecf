//! Interrupt handler
//!
//! One call to [`UartBus::on_interrupt`] moves at most one unit. The bus is
//! half-duplex: transmit runs to completion before receive starts. A
//! transmit step only writes when the TX source is pending and the
//! transmitter has room; anything else leaves the transfer where it was.

use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::Vec;

use tether_hal::{IrqLine, IrqSources, UartRegisters};

use crate::event::{Event, Role};
use crate::state::StatusFlags;

use super::context::TransferContext;
use super::UartBus;

/// Events produced by a single step: at most one phase event plus meta
type StepEvents = Vec<Event, 2>;

impl<'a, M: RawMutex, R: UartRegisters, I: IrqLine> UartBus<'a, M, R, I> {
    /// Service one interrupt of this channel
    ///
    /// Call from the channel's interrupt vector. Events are delivered to
    /// the handler after the step has updated the context and the
    /// hardware, so a handler may start the next transfer from the meta
    /// event. The pending indication is cleared last, on every path.
    pub fn on_interrupt(&self) {
        if !self.status.load().contains(StatusFlags::INITIALIZED) {
            self.line.clear_pending();
            return;
        }

        let (handler, events) = self.ctx.lock(|ctx| {
            let mut ctx = ctx.borrow_mut();
            let events = self.step(&mut ctx);
            (ctx.handler, events)
        });

        for event in events {
            handler.on_event(event);
        }

        self.line.clear_pending();
    }

    fn step(&self, ctx: &mut TransferContext<'a>) -> StepEvents {
        let mut events = StepEvents::new();
        let status = self.status.load();

        if status.contains(StatusFlags::IDLE) {
            // Nothing in flight, e.g. an interrupt that was already pending
            // when the transfer was cancelled
            trace!("UART spurious interrupt");
            self.shut_down();
            return events;
        }

        if !status.contains(StatusFlags::TX_DONE) {
            let len = ctx.tx.len();

            if ctx.tx_idx == len {
                // Last unit left the shifter; stop the TX source from re-raising
                self.regs.disable(IrqSources::TX);
                self.regs.clear(IrqSources::TX);
                self.status.insert(StatusFlags::TX_DONE);
                fire(&mut events, Event::complete(Role::Transmit, len));
            } else if let Some(unit) = ctx.tx.unit_at(ctx.tx_idx) {
                if !self.regs.pending().contains(IrqSources::TX) || !self.regs.can_write() {
                    // Raised by the RX source, or the holding register is
                    // still full: wait for the TX interrupt
                    trace!("UART transmit not ready at unit {}", ctx.tx_idx);
                    self.regs.enable(IrqSources::TX);
                    self.line.unmask();
                    return events;
                }

                if let Err(e) = self.regs.write_unit(unit) {
                    warn!("UART transmit aborted after {} units: {:?}", ctx.tx_idx, e);
                    self.status
                        .insert(StatusFlags::TX_DONE | StatusFlags::RX_DONE);
                    self.shut_down();
                    fire(&mut events, Event::error(Role::Transmit, ctx.tx_idx));
                    return events;
                }

                ctx.tx_idx += 1;
                self.regs.enable(IrqSources::TX);
            }
        } else if !status.contains(StatusFlags::RX_DONE) {
            let idx = ctx.rx_idx;

            match ctx.rx.as_deref_mut() {
                Some(rx) if idx < rx.len() => {
                    rx[idx] = self.regs.read_unit();
                    ctx.rx_idx = idx + 1;

                    if ctx.rx_idx == rx.len() {
                        self.status.insert(StatusFlags::RX_DONE);
                        fire(&mut events, Event::complete(Role::Receive, rx.len()));
                    } else {
                        self.regs.enable(IrqSources::RX);
                    }
                }
                // Receive was marked in flight without room to receive into
                _ => self.status.insert(StatusFlags::RX_DONE),
            }
        }

        if self
            .status
            .load()
            .contains(StatusFlags::TX_DONE | StatusFlags::RX_DONE)
        {
            self.shut_down();
            fire(&mut events, Event::meta_complete());
        } else {
            self.line.unmask();
        }

        events
    }

    /// Disable and clear every source, and mask the line
    fn shut_down(&self) {
        self.regs.clear(IrqSources::ALL);
        self.regs.disable(IrqSources::ALL);
        self.line.mask();
    }
}

fn fire(events: &mut StepEvents, event: Event) {
    let queued = events.push(event).is_ok();
    debug_assert!(queued, "more than two events in one interrupt step");
}
