//! Transfer context
//!
//! Per-channel state behind the bus mutex: handler, descriptors and
//! progress indices. Progress indices are only advanced by the interrupt
//! handler.

use crate::event::{EventHandler, STUB};

/// Transmit descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transmit<'a> {
    /// Nothing to send
    #[default]
    None,
    /// Send the contents of a buffer
    Buffer(&'a [u8]),
    /// Send `len` copies of `byte`
    Fill { byte: u8, len: usize },
}

impl<'a> Transmit<'a> {
    /// Number of units to send
    pub fn len(&self) -> usize {
        match self {
            Transmit::None => 0,
            Transmit::Buffer(buf) => buf.len(),
            Transmit::Fill { len, .. } => *len,
        }
    }

    /// Check if there is nothing to send
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unit at position `idx`, if within the descriptor
    pub fn unit_at(&self, idx: usize) -> Option<u8> {
        match self {
            Transmit::None => None,
            Transmit::Buffer(buf) => buf.get(idx).copied(),
            Transmit::Fill { byte, len } => (idx < *len).then_some(*byte),
        }
    }

    /// Check if this is a fill-mode descriptor
    pub fn is_fill(&self) -> bool {
        matches!(self, Transmit::Fill { .. })
    }
}

pub(crate) struct TransferContext<'a> {
    pub(crate) handler: &'a dyn EventHandler,
    pub(crate) tx: Transmit<'a>,
    /// In fill mode this counts units written
    pub(crate) tx_idx: usize,
    pub(crate) rx: Option<&'a mut [u8]>,
    pub(crate) rx_idx: usize,
}

impl<'a> TransferContext<'a> {
    pub(crate) const fn new() -> Self {
        Self {
            handler: STUB,
            tx: Transmit::None,
            tx_idx: 0,
            rx: None,
            rx_idx: 0,
        }
    }

    pub(crate) fn rx_len(&self) -> usize {
        self.rx.as_ref().map_or(0, |rx| rx.len())
    }

    pub(crate) fn has_work(&self) -> bool {
        !self.tx.is_empty() || self.rx_len() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_descriptor() {
        let data = [0x10u8, 0x20, 0x30];
        let tx = Transmit::Buffer(&data);
        assert_eq!(tx.len(), 3);
        assert_eq!(tx.unit_at(1), Some(0x20));
        assert_eq!(tx.unit_at(3), None);
        assert!(!tx.is_fill());
    }

    #[test]
    fn test_fill_descriptor() {
        let tx = Transmit::Fill { byte: 0xff, len: 2 };
        assert_eq!(tx.unit_at(0), Some(0xff));
        assert_eq!(tx.unit_at(1), Some(0xff));
        assert_eq!(tx.unit_at(2), None);
        assert!(tx.is_fill());
    }

    #[test]
    fn test_empty_context() {
        let ctx = TransferContext::new();
        assert!(!ctx.has_work());
        assert_eq!(Transmit::None.unit_at(0), None);
    }
}
