//! Serial device transport.
//!
//! Opens a UART character device in raw mode, applies the configured line
//! speed once, and hands back a [`SerialStream`] that implements `Read` and
//! `Write`. This is the lowest layer of enclink; framing and buffering live
//! in the crates built on top of it.

pub mod error;
pub mod traits;

#[cfg(unix)]
pub mod tty;

pub use error::{Result, TransportError};
pub use traits::SerialStream;

#[cfg(unix)]
pub use tty::{SerialConfig, SerialDevice, DEFAULT_BAUD_RATE};
