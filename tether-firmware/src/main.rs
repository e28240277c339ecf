//! Tether - Serial Link Firmware
//!
//! Main firmware binary for RP2040-based boards. Brings up two serial
//! channels from the embedded `channel.toml`:
//!
//! - the link, driven by the interrupt transfer engine on core 0
//! - the console, a polled echoing pipe owned by core 1

#![no_std]
#![no_main]

use core::fmt::Write as _;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::multicore::{spawn_core1, Stack};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use tether_core::config::ChannelConfig;
use tether_core::UartBus;
use tether_drivers::{BypassConsole, ConsolePipe, PolledBus};
use tether_hal::BusError;
use tether_hal_rp2040::{gpio_to_uart, route_pins, NvicLine, Rp2040Uart, UartAllocator, UartId};

use crate::tasks::LINK_BUS;

mod config;
mod tasks;

// Core 1 runs the console on its own stack
static CORE1_STACK: StaticCell<Stack<4096>> = StaticCell::new();

// Link response buffer (lent to the bus for every transfer)
static LINK_RX: StaticCell<[u8; 4]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Tether firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = config::load();

    // Both UARTs are claimed up front; the config decides which is which
    let uarts = [Rp2040Uart::uart0(p.UART0), Rp2040Uart::uart1(p.UART1)];
    let mut allocator = UartAllocator::new();

    let console_uart = match claim(&mut allocator, &uarts, &config.console) {
        Ok(uart) => uart,
        Err(e) => defmt::panic!("Console pins unusable: {:?}", e),
    };
    let link_uart = match claim(&mut allocator, &uarts, &config.link) {
        Ok(uart) => uart,
        Err(e) => defmt::panic!("Link pins unusable: {:?}", e),
    };

    // Banner straight to the registers, before anything else owns them
    let mut bypass = BypassConsole::new(console_uart);
    if bypass.init().is_ok() {
        let _ = writeln!(bypass, "\r\ntether {}\r", env!("CARGO_PKG_VERSION"));
    }

    let bus = UartBus::new(link_uart, NvicLine::for_uart(link_uart.id()));
    if LINK_BUS.init(bus).is_err() {
        defmt::panic!("Link bus initialized twice");
    }
    let Some(link) = LINK_BUS.try_get() else {
        defmt::panic!("Link bus missing after init");
    };
    if let Err(e) = link.init(&config.link.uart()) {
        defmt::panic!("Link UART setup failed: {:?}", e);
    }
    info!("Link on {:?} at {} baud", link_uart.id(), config.link.baudrate);

    let console = ConsolePipe::new(PolledBus::new(console_uart, config.console.uart()));
    spawn_core1(
        p.CORE1,
        CORE1_STACK.init_with(Stack::new),
        move || tasks::console_loop(console),
    );
    info!("Console running on core 1");

    let rx = LINK_RX.init([0u8; 4]);
    spawner
        .spawn(tasks::link_task(link, rx, config.link))
        .unwrap();

    info!("All tasks spawned, firmware running");
}

/// Reserve the UART behind a channel's pins and route them to it
fn claim(
    allocator: &mut UartAllocator,
    uarts: &[Rp2040Uart; 2],
    channel: &ChannelConfig,
) -> Result<Rp2040Uart, BusError> {
    let (id, _) = gpio_to_uart(channel.tx_pin).ok_or(BusError::Invalid)?;

    allocator.allocate(id)?;
    if let Err(e) = route_pins(id, channel.tx_pin, channel.rx_pin) {
        allocator.release(id);
        return Err(e);
    }

    Ok(match id {
        UartId::Uart0 => uarts[0],
        UartId::Uart1 => uarts[1],
    })
}
