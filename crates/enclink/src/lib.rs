//! Framed UART bridge between a host and a secure enclave.
//!
//! enclink decodes the enclave's signature-synchronized frames from a serial
//! line, publishes state updates for introspection and hands every other
//! frame to a single consumer through a bounded, oldest-first-evicting queue.
//!
//! # Crate Structure
//!
//! - [`transport`]: serial device access (raw tty, fixed line speed)
//! - [`frame`]: frame codec and the resynchronizing staging decoder
//! - [`bridge`]: dispatch, delivery queue, consumer endpoint and transmit path

/// Re-export transport types.
pub mod transport {
    pub use enclink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use enclink_frame::*;
}

/// Re-export bridge types.
pub mod bridge {
    pub use enclink_bridge::*;
}
