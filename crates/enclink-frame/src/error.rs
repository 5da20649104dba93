/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// An empty chunk was handed to the decoder.
    #[error("empty chunk")]
    EmptyChunk,

    /// Appending a chunk would overflow the staging accumulator.
    #[error("staging overflow ({pending} pending + {incoming} incoming bytes, capacity {capacity})")]
    Overflow {
        pending: usize,
        incoming: usize,
        capacity: usize,
    },

    /// The bytes at the head of the stream are not a frame signature.
    #[error("invalid frame signature 0x{found:08X} (expected 0x0BADF00D)")]
    InvalidSignature { found: u32 },

    /// The header announces a frame that can never fit the staging accumulator.
    #[error("frame of {required} bytes exceeds staging capacity {capacity}")]
    OversizedFrame { required: usize, capacity: usize },

    /// The payload cannot be described by the 16-bit length field.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    ///
    /// Only produced through `tokio_util::codec::FramedRead`/`FramedWrite`,
    /// which require `From<io::Error>` on the codec error type.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// Log line for a byte discarded while resynchronizing on this error.
    pub(crate) fn resync_reason(&self) -> &'static str {
        match self {
            Self::InvalidSignature { .. } => {
                "invalid packet signature, discarding byte to resynchronize"
            }
            Self::OversizedFrame { .. } => {
                "announced frame exceeds staging capacity, discarding byte to resynchronize"
            }
            _ => "undecodable header, discarding byte to resynchronize",
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
