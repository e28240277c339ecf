//! Console pipe
//!
//! A blocking pipe built over any [`BlockingBus`]. Every byte received is
//! echoed back out through the same bus, which makes it usable as an
//! interactive serial console.
//!
//! # Return values
//!
//! `write` and `read` report the number of bytes actually moved. A fault
//! that happens before anything usable moved is returned as `Err`, whatever
//! the bus reported as moved. A partial transfer (the bus stopped with
//! [`BusError::Io`]) returns the short count instead, and the fault is left
//! in [`last_error`](ConsolePipe::last_error).

use tether_hal::error::is_error_at_start;
use tether_hal::{BlockingBus, Buffers, BusError, BusLock, Status};

/// Blocking, echoing pipe over a bus
pub struct ConsolePipe<B: BlockingBus> {
    bus: B,
    last: Status,
}

impl<B: BlockingBus> ConsolePipe<B> {
    /// Wrap `bus`; nothing is touched until [`init`](Self::init)
    pub const fn new(bus: B) -> Self {
        Self { bus, last: Ok(()) }
    }

    /// Initialize the underlying bus
    pub fn init(&mut self) -> Status {
        self.last = self.bus.init();
        if let Err(e) = self.last {
            warn!("console bus init failed: {:?}", e);
        }
        self.last
    }

    /// Write `data`, blocking until it is sent or the bus faults
    ///
    /// An empty `data` returns `Ok(0)` without touching the bus.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, BusError> {
        if data.is_empty() {
            return Ok(0);
        }

        self.transfer(Buffers::transmit(data))
    }

    /// Fill `buffer`, blocking until it is full or the bus faults
    ///
    /// Whatever was received is echoed back. Echo failures are not
    /// reported, and [`last_error`](Self::last_error) keeps the status of
    /// the read itself.
    pub fn read(&mut self, buffer: &mut [u8]) -> Result<usize, BusError> {
        if buffer.is_empty() {
            return Ok(0);
        }

        let mut received = 0;
        let status = self.execute(Buffers::receive(&mut *buffer), &mut received);
        let ret = settle(status, received);

        let echoed = received.min(buffer.len());
        if let Err(e) = self.write(&buffer[..echoed]) {
            trace!("console echo failed: {:?}", e);
        }
        self.last = status;

        ret
    }

    /// Status of the most recent `init`, `write` or `read`
    pub fn last_error(&self) -> Status {
        self.last
    }

    /// Underlying bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    fn transfer(&mut self, buffers: Buffers<'_>) -> Result<usize, BusError> {
        let mut moved = 0;
        let status = self.execute(buffers, &mut moved);
        settle(status, moved)
    }

    fn execute(&mut self, buffers: Buffers<'_>, moved: &mut usize) -> Status {
        let status = BusLock::acquire(&self.bus).execute(buffers, moved);
        self.last = status;
        status
    }
}

/// Map a bus status and count to the pipe's return value
fn settle(status: Status, moved: usize) -> Result<usize, BusError> {
    match status {
        Err(e) if is_error_at_start(status) => Err(e),
        _ => Ok(moved),
    }
}

impl<B: BlockingBus> embedded_io::ErrorType for ConsolePipe<B> {
    type Error = BusError;
}

impl<B: BlockingBus> embedded_io::Write for ConsolePipe<B> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let sent = ConsolePipe::write(self, buf)?;
        if sent == 0 && !buf.is_empty() {
            return Err(self.last.err().unwrap_or(BusError::Io));
        }
        Ok(sent)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<B: BlockingBus> embedded_io::Read for ConsolePipe<B> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let received = ConsolePipe::read(self, buf)?;
        if received == 0 && !buf.is_empty() {
            return Err(self.last.err().unwrap_or(BusError::Io));
        }
        Ok(received)
    }
}
