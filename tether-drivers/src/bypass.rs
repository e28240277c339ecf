//! Bypass console
//!
//! Unbuffered, lock-free character output straight to the UART registers.
//! Meant for early boot and panic messages, where neither the transfer
//! engine nor the console pipe can be trusted.

use core::fmt;

use tether_hal::{BusError, UartConfig, UartRegisters};

/// Polled character output
pub struct BypassConsole<R: UartRegisters> {
    regs: R,
}

impl<R: UartRegisters> BypassConsole<R> {
    pub const fn new(regs: R) -> Self {
        Self { regs }
    }

    /// Configure the line at 115200 8N1
    pub fn init(&self) -> Result<(), BusError> {
        self.regs.setup(&UartConfig::default())
    }

    /// Send one character, spinning until the transmitter accepts it
    pub fn putc(&self, c: u8) {
        while !self.regs.can_write() {
            core::hint::spin_loop();
        }
        // Nothing useful can be done with a rejected character here
        let _ = self.regs.write_unit(c);
    }

    /// Send every byte of `s`
    pub fn puts(&self, s: &str) {
        s.bytes().for_each(|c| self.putc(c));
    }
}

impl<R: UartRegisters> fmt::Write for BypassConsole<R> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.puts(s);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use core::cell::{Cell, RefCell};
    use core::fmt::Write;
    use std::vec::Vec;

    use tether_hal::IrqSources;

    #[derive(Default)]
    struct SlowUart {
        configured: Cell<Option<UartConfig>>,
        sent: RefCell<Vec<u8>>,
        /// Report busy on every other poll
        toggle: Cell<bool>,
    }

    impl UartRegisters for SlowUart {
        fn setup(&self, config: &UartConfig) -> Result<(), BusError> {
            self.configured.set(Some(*config));
            Ok(())
        }

        fn write_unit(&self, unit: u8) -> Result<(), BusError> {
            self.sent.borrow_mut().push(unit);
            Ok(())
        }

        fn read_unit(&self) -> u8 {
            0
        }

        fn pending(&self) -> IrqSources {
            IrqSources::NONE
        }

        fn enable(&self, _sources: IrqSources) {}

        fn disable(&self, _sources: IrqSources) {}

        fn clear(&self, _sources: IrqSources) {}

        fn can_write(&self) -> bool {
            !self.toggle.replace(!self.toggle.get())
        }

        fn can_read(&self) -> bool {
            false
        }

        fn take_line_error(&self) -> Option<BusError> {
            None
        }
    }

    #[test]
    fn test_init_uses_default_line() {
        let console = BypassConsole::new(SlowUart::default());
        console.init().unwrap();
        assert_eq!(console.regs.configured.get(), Some(UartConfig::default()));
    }

    #[test]
    fn test_formatted_output() {
        let mut console = BypassConsole::new(SlowUart::default());
        write!(console, "panic at {}:{}", "bus.rs", 42).unwrap();
        assert_eq!(&console.regs.sent.borrow()[..], b"panic at bus.rs:42");
    }
}
