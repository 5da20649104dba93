use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::warn;

use crate::error::{BridgeError, Result};
use crate::ring::RingBuffer;
use crate::snapshot::StateSnapshot;

/// Default delivery queue capacity in bytes.
pub const DEFAULT_QUEUE_CAPACITY: usize = 2048;

/// How a read behaves when the queue is empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadMode {
    /// Wait until data arrives, the read is interrupted, or it times out.
    #[default]
    Blocking,
    /// Fail immediately with [`BridgeError::WouldBlock`].
    NonBlocking,
}

/// The single hand-off point between the ingestion side and the consumer.
///
/// One mutex guards the ring indices, the ring contents and the state
/// snapshot. Readers wait on a condition variable, which releases the mutex
/// while suspended, so a pushing producer never waits on a sleeping reader.
#[derive(Debug)]
pub struct DeliveryQueue {
    state: Mutex<QueueState>,
    readable: Condvar,
}

#[derive(Debug)]
struct QueueState {
    ring: RingBuffer,
    snapshot: StateSnapshot,
    interrupt_pending: bool,
    evicted: u64,
}

impl Default for DeliveryQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

impl DeliveryQueue {
    /// Create a queue holding up to `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState {
                ring: RingBuffer::with_capacity(capacity),
                snapshot: StateSnapshot::default(),
                interrupt_pending: false,
                evicted: 0,
            }),
            readable: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one byte, evicting the oldest byte if full.
    pub fn push(&self, byte: u8) -> bool {
        self.push_slice(&[byte]) > 0
    }

    /// Append bytes in order, evicting the oldest as needed.
    ///
    /// Returns how many bytes were evicted. Waiting readers are woken once.
    pub fn push_slice(&self, bytes: &[u8]) -> usize {
        let evicted = {
            let mut state = self.lock();
            let evicted = bytes.iter().filter(|&&b| state.ring.push(b)).count();
            state.evicted += evicted as u64;
            evicted
        };

        if evicted > 0 {
            warn!(evicted, "UART buffer overflow, dropping oldest data");
        }
        self.readable.notify_all();
        evicted
    }

    /// Take the oldest byte without waiting.
    pub fn try_pop(&self) -> Result<u8> {
        self.lock().ring.pop().ok_or(BridgeError::WouldBlock)
    }

    /// Take the oldest byte, waiting for one if the queue is empty.
    pub fn pop_blocking(&self) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.read(&mut byte, ReadMode::Blocking, None)?;
        Ok(byte[0])
    }

    /// Drain up to `buf.len()` bytes.
    ///
    /// Short reads are normal: whatever is queued when the read proceeds is
    /// returned, up to the buffer size. An empty `buf` returns `Ok(0)`
    /// immediately.
    ///
    /// In blocking mode an empty queue suspends the caller until a push, an
    /// [`interrupt`](Self::interrupt) or the optional `timeout`. Wakeups
    /// without data are absorbed by re-checking the queue.
    pub fn read(
        &self,
        buf: &mut [u8],
        mode: ReadMode,
        timeout: Option<Duration>,
    ) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.lock();

        while state.ring.is_empty() {
            if mode == ReadMode::NonBlocking {
                return Err(BridgeError::WouldBlock);
            }
            if state.interrupt_pending {
                state.interrupt_pending = false;
                return Err(BridgeError::Interrupted);
            }

            state = match deadline {
                None => self
                    .readable
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(BridgeError::TimedOut(timeout.unwrap_or_default()));
                    }
                    self.readable
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }

        Ok(state.ring.pop_into(buf))
    }

    /// Release a reader blocked on an empty queue with [`BridgeError::Interrupted`].
    ///
    /// If no reader is waiting, the interrupt stays pending and the next
    /// blocking read that finds the queue empty returns it. Reads that find
    /// data are not affected.
    pub fn interrupt(&self) {
        self.lock().interrupt_pending = true;
        self.readable.notify_all();
    }

    /// Latest state snapshot.
    pub fn snapshot(&self) -> StateSnapshot {
        self.lock().snapshot
    }

    /// Overwrite both snapshot fields at once.
    pub fn store_snapshot(&self, snapshot: StateSnapshot) {
        self.lock().snapshot = snapshot;
    }

    /// Bytes waiting for the consumer.
    pub fn len(&self) -> usize {
        self.lock().ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().ring.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().ring.capacity()
    }

    /// Total bytes evicted by overflow since construction.
    pub fn evicted(&self) -> u64 {
        self.lock().evicted
    }

    /// Drop every waiting byte.
    pub fn drain(&self) {
        self.lock().ring.clear();
    }
}
