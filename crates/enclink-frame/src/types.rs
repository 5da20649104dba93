//! Frame type codes.
//!
//! Only the state-update type is interpreted. Every other code is opaque and
//! is forwarded to the consumer untouched.

/// Enclave state update: payload byte 0 is the root state, byte 1 the version.
pub const STATE_UPDATE: u16 = 0x0004;

/// Returns a human-readable name for a frame type code.
pub fn frame_type_name(code: u16) -> &'static str {
    match code {
        STATE_UPDATE => "STATE_UPDATE",
        _ => "OPAQUE",
    }
}

/// Returns true if the frame type carries a state update.
pub fn is_state_update(code: u16) -> bool {
    code == STATE_UPDATE
}
