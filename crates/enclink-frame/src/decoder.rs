use bytes::BytesMut;
use tracing::{error, trace, warn};

use crate::codec::{decode_frame, Frame};
use crate::error::{FrameError, Result};

/// Default staging accumulator capacity in bytes.
pub const DEFAULT_STAGING_CAPACITY: usize = 2048;

/// Running counters for a [`FrameDecoder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Complete frames emitted.
    pub frames: u64,
    /// Bytes discarded while hunting for a signature.
    pub resync_bytes: u64,
    /// Chunks lost to a full accumulator reset.
    pub overflow_resets: u64,
}

/// Reassembles frames from an arbitrarily chunked byte stream.
///
/// Bytes that do not yet form a complete frame wait in a bounded staging
/// accumulator. The accumulator never grows past its capacity: a chunk that
/// would overflow it clears everything staged so far and is itself dropped.
#[derive(Debug)]
pub struct FrameDecoder {
    buf: BytesMut,
    capacity: usize,
    stats: DecoderStats,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Create a decoder with the default staging capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_STAGING_CAPACITY)
    }

    /// Create a decoder with an explicit staging capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            capacity,
            stats: DecoderStats::default(),
        }
    }

    /// Stage a chunk and iterate over the frames it completes.
    ///
    /// The returned iterator is lazy: frames it does not get to stay staged
    /// and are yielded by the next call.
    ///
    /// Fails with [`FrameError::EmptyChunk`] without touching any state, or
    /// with [`FrameError::Overflow`] after discarding everything staged.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Frames<'_>> {
        if chunk.is_empty() {
            return Err(FrameError::EmptyChunk);
        }

        if self.buf.len() + chunk.len() > self.capacity {
            let err = FrameError::Overflow {
                pending: self.buf.len(),
                incoming: chunk.len(),
                capacity: self.capacity,
            };
            error!(error = %err, "receive buffer overflow, resetting");
            self.buf.clear();
            self.stats.overflow_resets += 1;
            return Err(err);
        }

        self.buf.extend_from_slice(chunk);
        trace!(staged = self.buf.len(), "chunk staged");
        Ok(Frames { decoder: self })
    }

    /// Iterate over frames already staged, without adding input.
    pub fn frames(&mut self) -> Frames<'_> {
        Frames { decoder: self }
    }

    /// Discard every staged byte.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Number of bytes staged but not yet resolved into a frame.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Staging accumulator capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Counters since construction.
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    fn next_frame(&mut self) -> Option<Frame> {
        loop {
            match decode_frame(&mut self.buf, self.capacity) {
                Ok(Some(frame)) => {
                    self.stats.frames += 1;
                    return Some(frame);
                }
                Ok(None) => return None,
                Err(err) => {
                    self.stats.resync_bytes += 1;
                    warn!(error = %err, "{}", err.resync_reason());
                }
            }
        }
    }
}

/// Lazy sequence of frames completed by a [`FrameDecoder::feed`] call.
#[derive(Debug)]
pub struct Frames<'a> {
    decoder: &'a mut FrameDecoder,
}

impl Iterator for Frames<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        self.decoder.next_frame()
    }
}
