//! Bus events
//!
//! Events are emitted from interrupt context to the handler installed with
//! [`UartBus::set_handler`](crate::bus::UartBus::set_handler). They are
//! plain values and are never stored by the bus.

/// Which part of a transfer an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    /// Transmit phase
    Transmit,
    /// Receive phase
    Receive,
    /// Whole transfer: fired once every configured phase is done
    Meta,
}

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventKind {
    /// Phase (or transfer) completed
    Complete,
    /// Phase aborted because the register interface rejected a unit
    Error,
}

/// A bus event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Event {
    pub role: Role,
    pub kind: EventKind,
    /// Units transferred in this phase when the event fired (0 for meta)
    pub size: usize,
}

impl Event {
    /// Completion of a phase
    pub const fn complete(role: Role, size: usize) -> Self {
        Self {
            role,
            kind: EventKind::Complete,
            size,
        }
    }

    /// Failure of a phase
    pub const fn error(role: Role, size: usize) -> Self {
        Self {
            role,
            kind: EventKind::Error,
            size,
        }
    }

    /// The transfer-level completion event
    pub const fn meta_complete() -> Self {
        Self::complete(Role::Meta, 0)
    }

    /// Check if this event ends the transfer
    pub fn is_terminal(&self) -> bool {
        self.role == Role::Meta || self.kind == EventKind::Error
    }
}

/// Receiver of bus events
///
/// Called from interrupt context: implementations must be short and must
/// not block. Closures `Fn(Event) + Sync` implement this trait.
pub trait EventHandler: Sync {
    fn on_event(&self, event: Event);
}

impl<F: Fn(Event) + Sync> EventHandler for F {
    fn on_event(&self, event: Event) {
        self(event)
    }
}

/// Handler installed until a real one is set
///
/// Every event reaching it is a configuration bug, so it panics instead of
/// dropping the event.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubHandler;

impl EventHandler for StubHandler {
    fn on_event(&self, event: Event) {
        panic!("bus event wasn't handled: {:?}", event);
    }
}

pub(crate) const STUB: &dyn EventHandler = &StubHandler;

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_closure_handler() {
        let count = AtomicUsize::new(0);
        let handler = |e: Event| {
            count.fetch_add(e.size, Ordering::Relaxed);
        };

        handler.on_event(Event::complete(Role::Transmit, 3));
        handler.on_event(Event::complete(Role::Receive, 4));
        assert_eq!(count.load(Ordering::Relaxed), 7);
    }

    #[test]
    #[should_panic(expected = "bus event wasn't handled")]
    fn test_stub_handler_traps() {
        STUB.on_event(Event::meta_complete());
    }

    #[test]
    fn test_terminal_events() {
        assert!(Event::meta_complete().is_terminal());
        assert!(Event::error(Role::Transmit, 2).is_terminal());
        assert!(!Event::complete(Role::Receive, 1).is_terminal());
    }
}
