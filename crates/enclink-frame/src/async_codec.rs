//! `tokio-util` codec for callers that own an async serial stream.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, warn};

use crate::codec::{decode_frame, Frame};
use crate::decoder::{DecoderStats, DEFAULT_STAGING_CAPACITY};
use crate::error::{FrameError, Result};

/// Frame codec with the same resync rules as [`crate::FrameDecoder`].
///
/// `FramedRead` owns the read buffer, so there is no destructive overflow
/// reset and `overflow_resets` stays zero. The capacity bounds the frame
/// size a header may announce, which in turn bounds what stays buffered
/// between reads to less than one capacity's worth of bytes.
#[derive(Debug, Clone)]
pub struct EnclinkCodec {
    capacity: usize,
    stats: DecoderStats,
}

impl Default for EnclinkCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl EnclinkCodec {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_STAGING_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            stats: DecoderStats::default(),
        }
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }
}

impl Decoder for EnclinkCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        loop {
            match decode_frame(src, self.capacity) {
                Ok(Some(frame)) => {
                    self.stats.frames += 1;
                    return Ok(Some(frame));
                }
                Ok(None) => return Ok(None),
                Err(err) => {
                    self.stats.resync_bytes += 1;
                    warn!(error = %err, "{}", err.resync_reason());
                }
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None => {
                if !src.is_empty() {
                    debug!(discarded = src.len(), "stream ended mid-frame");
                    src.clear();
                }
                Ok(None)
            }
        }
    }
}

impl Encoder<Frame> for EnclinkCodec {
    type Error = FrameError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<()> {
        dst.extend_from_slice(frame.wire());
        Ok(())
    }
}
