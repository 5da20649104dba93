use std::fs::File;
use std::io::{Read, Write};

use crate::error::Result;

/// A connected serial byte stream implementing Read + Write.
///
/// Usually wraps an opened tty device. A Unix socket can stand in for the
/// UART when bridging to a simulator or in tests.
pub struct SerialStream {
    inner: SerialStreamInner,
}

enum SerialStreamInner {
    Device(File),
    #[cfg(unix)]
    Socket(std::os::unix::net::UnixStream),
}

impl Read for SerialStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            SerialStreamInner::Device(file) => file.read(buf),
            #[cfg(unix)]
            SerialStreamInner::Socket(stream) => stream.read(buf),
        }
    }
}

impl Write for SerialStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            SerialStreamInner::Device(file) => file.write(buf),
            #[cfg(unix)]
            SerialStreamInner::Socket(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            SerialStreamInner::Device(file) => file.flush(),
            #[cfg(unix)]
            SerialStreamInner::Socket(stream) => stream.flush(),
        }
    }
}

impl SerialStream {
    /// Wrap an already opened and configured device file.
    pub fn from_file(file: File) -> Self {
        Self {
            inner: SerialStreamInner::Device(file),
        }
    }

    /// Wrap a Unix stream standing in for the UART.
    #[cfg(unix)]
    pub fn from_unix(stream: std::os::unix::net::UnixStream) -> Self {
        Self {
            inner: SerialStreamInner::Socket(stream),
        }
    }

    /// Try to clone this stream (creates a new file descriptor).
    ///
    /// The bridge reads on one handle and transmits on the other.
    pub fn try_clone(&self) -> Result<Self> {
        match &self.inner {
            SerialStreamInner::Device(file) => Ok(Self::from_file(file.try_clone()?)),
            #[cfg(unix)]
            SerialStreamInner::Socket(stream) => Ok(Self::from_unix(stream.try_clone()?)),
        }
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        match &self.inner {
            SerialStreamInner::Device(_) => "tty",
            #[cfg(unix)]
            SerialStreamInner::Socket(_) => "unix-socket",
        }
    }
}

impl std::fmt::Debug for SerialStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialStream")
            .field("type", &self.transport_name())
            .finish()
    }
}
