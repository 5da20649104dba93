//! Signature-synchronized framing for the enclave UART protocol.
//!
//! Every message on the line is framed with:
//! - A 4-byte little-endian signature (`0x0BADF00D`) used to find frame boundaries
//! - A 2-byte little-endian frame type
//! - A 2-byte little-endian payload length
//!
//! The [`FrameDecoder`] turns arbitrarily chunked input into whole frames,
//! sliding forward one byte at a time whenever the signature does not line up.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod decoder;
pub mod error;
pub mod types;

#[cfg(feature = "async")]
pub use async_codec::EnclinkCodec;
pub use codec::{decode_frame, encode_frame, Frame, HEADER_SIZE, MAX_PAYLOAD, SIGNATURE};
pub use decoder::{DecoderStats, FrameDecoder, Frames, DEFAULT_STAGING_CAPACITY};
pub use error::{FrameError, Result};
pub use types::{frame_type_name, is_state_update, STATE_UPDATE};
