use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use enclink_frame::{DecoderStats, FrameDecoder, DEFAULT_STAGING_CAPACITY};
use tracing::debug;

use crate::dispatch::Dispatcher;
use crate::endpoint::{Endpoint, Interrupter};
use crate::error::Result;
use crate::ingest::Ingestor;
use crate::queue::{DeliveryQueue, ReadMode, DEFAULT_QUEUE_CAPACITY};
use crate::status::StatusView;
use crate::transmit::Transmitter;

/// Sizes and read behavior for a [`Bridge`].
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Staging accumulator capacity in bytes. Default: 2048.
    pub staging_capacity: usize,
    /// Delivery queue capacity in bytes. Default: 2048.
    pub queue_capacity: usize,
    /// Default mode for [`Endpoint::read`].
    pub read_mode: ReadMode,
    /// Upper bound on a blocking read. Default: wait indefinitely.
    pub read_timeout: Option<Duration>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            staging_capacity: DEFAULT_STAGING_CAPACITY,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            read_mode: ReadMode::Blocking,
            read_timeout: None,
        }
    }
}

/// The bridge component: staging accumulator, delivery queue and state
/// snapshot, created together and living as long as the bridge.
///
/// Use it directly from one thread, or [`split`](Self::split) it so the
/// transport callback and the consumer run independently.
#[derive(Debug)]
pub struct Bridge<W> {
    ingestor: Ingestor,
    endpoint: Endpoint<W>,
    queue: Arc<DeliveryQueue>,
}

impl<W: Write> Bridge<W> {
    /// Build a bridge that transmits consumer writes to `transport`.
    pub fn new(transport: W, config: BridgeConfig) -> Self {
        let queue = Arc::new(DeliveryQueue::new(config.queue_capacity));
        let ingestor = Ingestor::new(
            FrameDecoder::with_capacity(config.staging_capacity),
            Dispatcher::new(Arc::clone(&queue)),
        );
        let endpoint = Endpoint::new(
            Arc::clone(&queue),
            Transmitter::new(transport),
            config.read_mode,
            config.read_timeout,
        );
        debug!(
            staging_capacity = config.staging_capacity,
            queue_capacity = config.queue_capacity,
            "bridge created"
        );

        Self {
            ingestor,
            endpoint,
            queue,
        }
    }

    /// Transport callback: accept newly arrived bytes. See [`Ingestor::receive`].
    pub fn receive(&mut self, chunk: &[u8]) -> usize {
        self.ingestor.receive(chunk)
    }

    /// Consumer read. See [`Endpoint::read`].
    pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
        self.endpoint.read(buf)
    }

    /// Consumer read with an explicit mode.
    pub fn read_with(&self, buf: &mut [u8], mode: ReadMode) -> Result<usize> {
        self.endpoint.read_with(buf, mode)
    }

    /// Consumer write. See [`Endpoint::write`].
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        self.endpoint.write(data)
    }

    pub fn status(&self) -> StatusView {
        self.endpoint.status()
    }

    pub fn interrupter(&self) -> Interrupter {
        self.endpoint.interrupter()
    }

    /// Clear the staging accumulator and drain the delivery queue.
    ///
    /// The state snapshot keeps its last value.
    pub fn reset(&mut self) {
        self.ingestor.reset();
        self.queue.drain();
    }

    pub fn decoder_stats(&self) -> DecoderStats {
        self.ingestor.stats()
    }

    /// Separate the ingestion side from the consumer side.
    pub fn split(self) -> (Ingestor, Endpoint<W>) {
        (self.ingestor, self.endpoint)
    }
}
