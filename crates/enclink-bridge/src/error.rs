use std::time::Duration;

/// Errors surfaced to callers of the bridge.
///
/// Ingestion-side faults never appear here; they are logged and absorbed.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A non-blocking read found the delivery queue empty.
    #[error("no data available (would block)")]
    WouldBlock,

    /// A blocked read was released by [`crate::Interrupter::interrupt`].
    #[error("read interrupted")]
    Interrupted,

    /// A blocked read saw no data before the configured timeout.
    #[error("read timed out after {0:?}")]
    TimedOut(Duration),

    /// Staging for an oversized transmit could not be allocated.
    #[error("failed to allocate {size} byte transmit buffer")]
    Alloc { size: usize },

    /// The serial transport rejected a read or write.
    #[error("transport error: {0}")]
    Transport(#[source] std::io::Error),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] enclink_frame::FrameError),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    /// The bridge error an `io::Error` was built from, if any.
    pub fn from_io(err: &std::io::Error) -> Option<&BridgeError> {
        err.get_ref()?.downcast_ref::<BridgeError>()
    }

    /// True for an interrupted read, whether seen directly or through `std::io`.
    pub fn is_interrupted_io(err: &std::io::Error) -> bool {
        matches!(Self::from_io(err), Some(BridgeError::Interrupted))
    }
}

/// `Interrupted` maps to `ErrorKind::Other` wrapping the [`BridgeError`],
/// never to `ErrorKind::Interrupted`, so `read_exact` and `io::copy` return
/// it instead of retrying. Recover it with [`BridgeError::from_io`].
impl From<BridgeError> for std::io::Error {
    fn from(err: BridgeError) -> Self {
        use std::io::ErrorKind;

        match err {
            BridgeError::WouldBlock => ErrorKind::WouldBlock.into(),
            BridgeError::Interrupted => std::io::Error::other(err),
            BridgeError::TimedOut(_) => std::io::Error::new(ErrorKind::TimedOut, err),
            BridgeError::Alloc { .. } => std::io::Error::new(ErrorKind::OutOfMemory, err),
            BridgeError::Transport(source) => source,
            BridgeError::Frame(enclink_frame::FrameError::Io(source)) => source,
            other => std::io::Error::new(ErrorKind::InvalidData, other),
        }
    }
}
