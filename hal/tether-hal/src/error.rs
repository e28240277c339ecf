//! Bus status codes
//!
//! Every bus operation reports one of these on failure. The taxonomy has
//! one recoverable member, [`BusError::Io`], which means "some units moved
//! before the fault". Everything else is a hard fault.

/// Error reported by a serial bus or its register interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Partial I/O: the transfer stopped after moving some units
    Io,
    /// Unclassified hardware or driver fault
    Generic,
    /// Peripheral is busy (FIFO full, transfer in flight)
    Busy,
    /// Invalid argument or configuration
    Invalid,
    /// Operation did not resolve in time
    Timeout,
    /// Framing error on the line
    Framing,
    /// Parity error on the line
    Parity,
    /// Receive overrun
    Overrun,
    /// Break condition detected
    Break,
}

impl BusError {
    /// Check if this is the partial-I/O status
    ///
    /// Partial I/O is the only code that does not count as a failure at
    /// transfer start.
    pub fn is_partial(&self) -> bool {
        matches!(self, BusError::Io)
    }

    /// Check if this is a transport-level line fault
    pub fn is_line_fault(&self) -> bool {
        matches!(
            self,
            BusError::Framing | BusError::Parity | BusError::Overrun | BusError::Break
        )
    }
}

impl embedded_io::Error for BusError {
    fn kind(&self) -> embedded_io::ErrorKind {
        use embedded_io::ErrorKind;

        match self {
            BusError::Io | BusError::Generic | BusError::Busy => ErrorKind::Other,
            BusError::Invalid => ErrorKind::InvalidInput,
            BusError::Timeout => ErrorKind::TimedOut,
            BusError::Framing | BusError::Parity | BusError::Overrun | BusError::Break => {
                ErrorKind::InvalidData
            }
        }
    }
}

/// Status of the last completed bus operation
pub type Status = Result<(), BusError>;

/// Check if a status counts as a failure before the transfer started
///
/// Any fault other than partial I/O is treated as "nothing usable moved".
pub fn is_error_at_start(status: Status) -> bool {
    match status {
        Ok(()) => false,
        Err(e) => !e.is_partial(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_io_is_partial() {
        assert!(BusError::Io.is_partial());
        assert!(!BusError::Generic.is_partial());
        assert!(!BusError::Overrun.is_partial());
    }

    #[test]
    fn test_error_at_start() {
        assert!(!is_error_at_start(Ok(())));
        assert!(!is_error_at_start(Err(BusError::Io)));
        assert!(is_error_at_start(Err(BusError::Generic)));
        assert!(is_error_at_start(Err(BusError::Framing)));
        assert!(is_error_at_start(Err(BusError::Timeout)));
    }

    #[test]
    fn test_line_faults() {
        assert!(BusError::Parity.is_line_fault());
        assert!(BusError::Break.is_line_fault());
        assert!(!BusError::Busy.is_line_fault());
    }

    #[test]
    fn test_embedded_io_kinds() {
        use embedded_io::{Error, ErrorKind};

        assert_eq!(BusError::Busy.kind(), ErrorKind::Other);
        assert_eq!(BusError::Overrun.kind(), ErrorKind::InvalidData);
        assert_eq!(BusError::Parity.kind(), ErrorKind::InvalidData);
        assert_eq!(BusError::Timeout.kind(), ErrorKind::TimedOut);
    }
}
