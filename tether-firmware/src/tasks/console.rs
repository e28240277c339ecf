//! Console echo loop
//!
//! Core 1 owns the console UART and polls it through the blocking pipe.
//! Every received byte is echoed by the pipe itself; this loop only turns
//! carriage returns into line breaks.

use defmt::*;

use tether_drivers::{ConsolePipe, PolledBus};
use tether_hal_rp2040::Rp2040Uart;

/// Blocking console of core 1
pub type Console = ConsolePipe<PolledBus<Rp2040Uart>>;

const PROMPT: &[u8] = b"> ";

/// Serve the console forever
pub fn console_loop(mut console: Console) -> ! {
    if let Err(e) = console.init() {
        error!("Console init failed: {:?}", e);
    }

    let _ = console.write(PROMPT);

    let mut byte = [0u8; 1];
    loop {
        match console.read(&mut byte) {
            Ok(1) if byte[0] == b'\r' => {
                let _ = console.write(b"\n");
                let _ = console.write(PROMPT);
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Console read failed: {:?}", e);
            }
        }
    }
}
