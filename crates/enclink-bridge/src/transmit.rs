use std::io::Write;

use tracing::debug;

use crate::error::{BridgeError, Result};

/// Writes up to this many bytes are staged in a fixed on-stack buffer.
pub const STACK_STAGING_SIZE: usize = 128;

/// Carries consumer writes out over the serial transport.
///
/// The caller's bytes are copied into staging owned by this call before the
/// transport sees them. Small writes use a fixed array; larger ones allocate
/// exactly the input length, released when the call returns.
#[derive(Debug)]
pub struct Transmitter<W> {
    inner: W,
}

impl<W: Write> Transmitter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Hand `data` to the transport once.
    ///
    /// Returns the byte count the transport accepted. Partial writes are not
    /// retried and transport errors are returned as-is.
    pub fn transmit(&mut self, data: &[u8]) -> Result<usize> {
        if data.is_empty() {
            return Ok(0);
        }

        if data.len() <= STACK_STAGING_SIZE {
            let mut staging = [0u8; STACK_STAGING_SIZE];
            staging[..data.len()].copy_from_slice(data);
            return self.send(&staging[..data.len()]);
        }

        let mut staging = Vec::new();
        staging
            .try_reserve_exact(data.len())
            .map_err(|_| BridgeError::Alloc { size: data.len() })?;
        staging.extend_from_slice(data);
        self.send(&staging)
    }

    fn send(&mut self, staged: &[u8]) -> Result<usize> {
        let written = self.inner.write(staged).map_err(BridgeError::Transport)?;
        self.inner.flush().map_err(BridgeError::Transport)?;
        debug!(requested = staged.len(), written, "transmitted to serial line");
        Ok(written)
    }

    /// Borrow the underlying transport.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Mutably borrow the underlying transport.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Consume the transmitter and return the transport.
    pub fn into_inner(self) -> W {
        self.inner
    }
}
