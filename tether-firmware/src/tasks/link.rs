//! Board-to-board link task
//!
//! Runs request/response transfers on the interrupt-driven bus. The bus
//! has no timeout of its own: the task bounds every transfer with
//! `embassy-time` and cancels it on expiry.

use defmt::*;
use embassy_rp::interrupt;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::once_lock::OnceLock;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration, Ticker};

use tether_core::config::ChannelConfig;
use tether_core::{Event, EventKind, UartBus};
use tether_hal_rp2040::{NvicLine, Rp2040Uart, UartId};

/// Interrupt-driven bus of the link channel
pub type LinkBus = UartBus<'static, CriticalSectionRawMutex, Rp2040Uart, NvicLine>;

/// The link bus, shared with its interrupt vector
pub static LINK_BUS: OnceLock<LinkBus> = OnceLock::new();

/// Final event of the transfer in flight
static TRANSFER_DONE: Signal<CriticalSectionRawMutex, Event> = Signal::new();

/// Request sent at every poll
const REQUEST: &[u8] = b"PING";

/// Expected response length
const RESPONSE_LEN: usize = 4;

/// Time between polls
const POLL_INTERVAL_MS: u64 = 500;

/// Event handler, runs in interrupt context
fn on_link_event(event: Event) {
    trace!("link event: {:?}", event);
    if event.is_terminal() {
        TRANSFER_DONE.signal(event);
    }
}

/// Link task - polls the peer and reports its answers
#[embassy_executor::task]
pub async fn link_task(
    bus: &'static LinkBus,
    rx: &'static mut [u8; RESPONSE_LEN],
    config: ChannelConfig,
) {
    info!("Link task started");

    bus.set_handler(&on_link_event);

    let timeout = Duration::from_millis(config.timeout_ms as u64);
    let mut ticker = Ticker::every(Duration::from_millis(POLL_INTERVAL_MS));
    let mut rx: &'static mut [u8] = rx;

    loop {
        ticker.next().await;

        bus.set_tx(REQUEST);
        bus.set_rx(rx);
        TRANSFER_DONE.reset();

        if let Err(e) = bus.start_transfer() {
            warn!("Link transfer did not start: {:?}", e);
        } else if config.timeout_ms == 0 {
            report(TRANSFER_DONE.wait().await, bus);
        } else {
            match with_timeout(timeout, TRANSFER_DONE.wait()).await {
                Ok(event) => report(event, bus),
                Err(_) => {
                    let stalled = bus.state();
                    bus.cancel_transfer();
                    warn!(
                        "Link timed out (tx pending: {}, rx pending: {})",
                        stalled.transmit_pending(),
                        stalled.receive_pending()
                    );
                    match bus.line_error() {
                        Some(e) if e.is_line_fault() => warn!("Link line fault: {:?}", e),
                        Some(e) => warn!("Link UART fault: {:?}", e),
                        None => {}
                    }
                }
            }
        }

        rx = match bus.reset_buffers() {
            Some(rx) => rx,
            None => {
                error!("Link receive buffer lost, stopping");
                return;
            }
        };
    }
}

fn report(event: Event, bus: &LinkBus) {
    match event.kind {
        EventKind::Complete => {
            bus.with_received(|reply| info!("Link reply: {=[u8]:x}", reply));
        }
        EventKind::Error => {
            warn!("Link transmit aborted after {} units", event.size);
        }
    }
}

fn service(id: UartId) {
    if let Some(bus) = LINK_BUS.try_get() {
        if bus.registers().id() == id {
            bus.on_interrupt();
        }
    }
}

#[interrupt]
fn UART0_IRQ() {
    service(UartId::Uart0);
}

#[interrupt]
fn UART1_IRQ() {
    service(UartId::Uart1);
}
