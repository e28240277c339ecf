//! Interrupt line control
//!
//! The interrupt controller side of a channel: the one line its peripheral
//! raises. Separate from [`UartRegisters`](crate::uart::UartRegisters),
//! which controls the peripheral's own interrupt sources.

/// Interrupt controller line bound to one channel
pub trait IrqLine {
    /// Mask (disable) the line
    fn mask(&self);

    /// Unmask (enable) the line
    fn unmask(&self);

    /// Clear the pending indication for the line
    fn clear_pending(&self);
}

impl<T: IrqLine + ?Sized> IrqLine for &T {
    fn mask(&self) {
        T::mask(self)
    }

    fn unmask(&self) {
        T::unmask(self)
    }

    fn clear_pending(&self) {
        T::clear_pending(self)
    }
}
