use std::io::{Read, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::error::Result;
use crate::queue::{DeliveryQueue, ReadMode};
use crate::status::StatusView;
use crate::transmit::Transmitter;

/// Consumer-facing read/write channel.
///
/// Reads drain the delivery queue; writes go out through the transmit path.
/// All methods take `&self`, so one endpoint can be shared between a reading
/// thread and a writing thread. Writes serialize on their own lock, separate
/// from the queue's.
#[derive(Debug)]
pub struct Endpoint<W> {
    queue: Arc<DeliveryQueue>,
    transmitter: Mutex<Transmitter<W>>,
    mode: ReadMode,
    read_timeout: Option<Duration>,
}

impl<W: Write> Endpoint<W> {
    pub(crate) fn new(
        queue: Arc<DeliveryQueue>,
        transmitter: Transmitter<W>,
        mode: ReadMode,
        read_timeout: Option<Duration>,
    ) -> Self {
        Self {
            queue,
            transmitter: Mutex::new(transmitter),
            mode,
            read_timeout,
        }
    }

    /// Read up to `buf.len()` bytes using the endpoint's read mode.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        self.read_with(buf, self.mode)
    }

    /// Read up to `buf.len()` bytes with an explicit mode for this call.
    pub fn read_with(&self, buf: &mut [u8], mode: ReadMode) -> Result<usize> {
        self.queue.read(buf, mode, self.read_timeout)
    }

    /// Send bytes to the serial line through the transmit path.
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        self.transmitter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .transmit(data)
    }

    /// Switch between blocking and non-blocking reads.
    pub fn set_mode(&mut self, mode: ReadMode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> ReadMode {
        self.mode
    }

    /// Bound how long a blocking read waits. `None` waits indefinitely.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) {
        self.read_timeout = timeout;
    }

    /// Handle that can release a blocked read from another thread.
    pub fn interrupter(&self) -> Interrupter {
        Interrupter {
            queue: Arc::clone(&self.queue),
        }
    }

    /// Read-only view of the published state values.
    pub fn status(&self) -> StatusView {
        StatusView::new(Arc::clone(&self.queue))
    }

    /// Bytes currently waiting to be read.
    pub fn available(&self) -> usize {
        self.queue.len()
    }
}

impl<W: Write> Read for &Endpoint<W> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        Endpoint::read(*self, buf).map_err(Into::into)
    }
}

impl<W: Write> Write for &Endpoint<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        Endpoint::write(*self, buf).map_err(Into::into)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Releases a blocked [`Endpoint::read`] with [`crate::BridgeError::Interrupted`].
#[derive(Debug, Clone)]
pub struct Interrupter {
    queue: Arc<DeliveryQueue>,
}

impl Interrupter {
    pub fn interrupt(&self) {
        self.queue.interrupt();
    }
}
