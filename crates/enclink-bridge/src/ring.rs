//! Fixed-capacity byte ring with oldest-first eviction.
//!
//! ```text
//!   tail                 head
//!    │                    │
//!    ▼                    ▼
//! ┌──┬──┬──┬──┬──┬──┬──┬──┬──┐
//! │  │ a│ b│ c│ d│ e│ f│  │  │   one slot always stays free so that
//! └──┴──┴──┴──┴──┴──┴──┴──┴──┘   head == tail means "empty"
//! ```
//!
//! Pushing into a full ring advances `tail` past the oldest byte, so the ring
//! always holds the most recent `capacity` bytes in arrival order.

/// Bounded byte ring. Not synchronized; see [`crate::DeliveryQueue`].
#[derive(Debug, Clone)]
pub struct RingBuffer {
    slots: Box<[u8]>,
    head: usize,
    tail: usize,
}

impl RingBuffer {
    /// Create a ring that holds up to `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![0u8; capacity + 1].into_boxed_slice(),
            head: 0,
            tail: 0,
        }
    }

    /// Maximum number of bytes held at once.
    pub fn capacity(&self) -> usize {
        self.slots.len() - 1
    }

    /// Number of bytes waiting.
    pub fn len(&self) -> usize {
        (self.head + self.slots.len() - self.tail) % self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    /// Append one byte. Returns `true` if the oldest byte was evicted to make room.
    pub fn push(&mut self, byte: u8) -> bool {
        let slots = self.slots.len();
        self.slots[self.head] = byte;
        self.head = (self.head + 1) % slots;
        if self.head == self.tail {
            self.tail = (self.tail + 1) % slots;
            return true;
        }
        false
    }

    /// Remove and return the oldest byte.
    pub fn pop(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let byte = self.slots[self.tail];
        self.tail = (self.tail + 1) % self.slots.len();
        Some(byte)
    }

    /// Move up to `buf.len()` of the oldest bytes into `buf`.
    pub fn pop_into(&mut self, buf: &mut [u8]) -> usize {
        let mut count = 0;
        while count < buf.len() {
            match self.pop() {
                Some(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                None => break,
            }
        }
        count
    }

    /// Drop every waiting byte.
    pub fn clear(&mut self) {
        self.tail = self.head;
    }
}
