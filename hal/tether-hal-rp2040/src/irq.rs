//! NVIC interrupt lines for the UART peripherals

use embassy_rp::interrupt::{Interrupt, InterruptExt};

use tether_hal::IrqLine;

use crate::uart::UartId;

/// NVIC line of one UART
#[derive(Clone, Copy)]
pub struct NvicLine {
    irq: Interrupt,
}

impl NvicLine {
    /// Line raised by the given UART
    pub fn for_uart(id: UartId) -> Self {
        let irq = match id {
            UartId::Uart0 => Interrupt::UART0_IRQ,
            UartId::Uart1 => Interrupt::UART1_IRQ,
        };
        Self { irq }
    }
}

impl IrqLine for NvicLine {
    fn mask(&self) {
        self.irq.disable();
    }

    #[allow(unsafe_code)]
    fn unmask(&self) {
        // SAFETY: the line is only unmasked by the channel that owns the
        // UART, whose handler is bound in the firmware before any transfer.
        unsafe { self.irq.enable() };
    }

    fn clear_pending(&self) {
        self.irq.unpend();
    }
}
