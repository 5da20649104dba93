use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Frame header: signature (4) + type (2) + payload length (2) = 8 bytes.
pub const HEADER_SIZE: usize = 8;

/// Frame sync marker, little-endian on the wire (`0D F0 AD 0B`).
pub const SIGNATURE: u32 = 0x0BAD_F00D;

/// Largest payload the 16-bit length field can describe.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// One complete frame as it appeared on the line.
///
/// The full wire encoding is retained so opaque frames can be forwarded
/// byte-for-byte; the payload is a view into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The frame type code.
    pub frame_type: u16,
    wire: Bytes,
}

impl Frame {
    /// Build a frame from a type and payload.
    pub fn new(frame_type: u16, payload: &[u8]) -> Result<Self> {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
        encode_frame(frame_type, payload, &mut buf)?;
        Ok(Self {
            frame_type,
            wire: buf.freeze(),
        })
    }

    /// The payload bytes following the header.
    pub fn payload(&self) -> &[u8] {
        &self.wire[HEADER_SIZE..]
    }

    /// Number of payload bytes, as announced in the header.
    pub fn payload_len(&self) -> usize {
        self.wire.len() - HEADER_SIZE
    }

    /// The full wire encoding (header + payload).
    pub fn wire(&self) -> &Bytes {
        &self.wire
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        self.wire.len()
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────┬──────────┬─────────────────┐
/// │ Signature    │ Type     │ Length   │ Payload         │
/// │ (4B LE)      │ (2B LE)  │ (2B LE)  │ (Length bytes)  │
/// │ 0x0BADF00D   │          │          │                 │
/// └──────────────┴──────────┴──────────┴─────────────────┘
/// ```
pub fn encode_frame(frame_type: u16, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u32_le(SIGNATURE);
    dst.put_u16_le(frame_type);
    dst.put_u16_le(payload.len() as u16);
    dst.put_slice(payload);
    Ok(())
}

/// Decode one frame from the front of a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't hold a complete frame yet; nothing
/// is consumed in that case. On success the frame bytes are removed from
/// `src`.
///
/// A bad signature, or a header announcing more than `capacity` bytes in
/// total, discards exactly one leading byte before the error is returned, so
/// calling again resynchronizes one byte further along the stream.
pub fn decode_frame(src: &mut BytesMut, capacity: usize) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let found = u32::from_le_bytes([src[0], src[1], src[2], src[3]]);
    if found != SIGNATURE {
        src.advance(1);
        return Err(FrameError::InvalidSignature { found });
    }

    let frame_type = u16::from_le_bytes([src[4], src[5]]);
    let payload_len = u16::from_le_bytes([src[6], src[7]]) as usize;
    let total = HEADER_SIZE + payload_len;

    // A length that can never fit would stall the stream forever.
    if total > capacity {
        src.advance(1);
        return Err(FrameError::OversizedFrame {
            required: total,
            capacity,
        });
    }

    if src.len() < total {
        return Ok(None);
    }

    let wire = src.split_to(total).freeze();
    Ok(Some(Frame { frame_type, wire }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::STATE_UPDATE;

    #[test]
    fn encode_matches_wire_layout() {
        let mut buf = BytesMut::new();
        encode_frame(STATE_UPDATE, &[5, 7], &mut buf).unwrap();
        assert_eq!(
            buf.as_ref(),
            &[0x0D, 0xF0, 0xAD, 0x0B, 0x04, 0x00, 0x02, 0x00, 0x05, 0x07]
        );
    }

    #[test]
    fn decode_state_update_scenario() {
        let mut buf =
            BytesMut::from(&[0x0D, 0xF0, 0xAD, 0x0B, 0x04, 0x00, 0x02, 0x00, 0x05, 0x07][..]);
        let frame = decode_frame(&mut buf, 2048).unwrap().unwrap();

        assert_eq!(frame.frame_type, STATE_UPDATE);
        assert_eq!(frame.payload(), &[5, 7]);
        assert_eq!(frame.wire_size(), 10);
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_incomplete_header() {
        let mut buf = BytesMut::from(&[0x0D, 0xF0, 0xAD][..]);
        assert!(decode_frame(&mut buf, 2048).unwrap().is_none());
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn decode_incomplete_payload_keeps_bytes() {
        let mut buf = BytesMut::new();
        encode_frame(0x0099, b"abcdef", &mut buf).unwrap();
        buf.truncate(HEADER_SIZE + 2);

        assert!(decode_frame(&mut buf, 2048).unwrap().is_none());
        assert_eq!(buf.len(), HEADER_SIZE + 2);
    }

    #[test]
    fn bad_signature_drops_one_byte() {
        let mut buf = BytesMut::from(&[0xFF, 0x0D, 0xF0, 0xAD, 0x0B, 0x01, 0x00, 0x00, 0x00][..]);
        let err = decode_frame(&mut buf, 2048).unwrap_err();
        assert!(matches!(err, FrameError::InvalidSignature { .. }));
        assert_eq!(buf.len(), 8);

        let frame = decode_frame(&mut buf, 2048).unwrap().unwrap();
        assert_eq!(frame.frame_type, 1);
        assert_eq!(frame.payload_len(), 0);
    }

    #[test]
    fn oversized_length_resyncs_instead_of_waiting() {
        let mut buf = BytesMut::new();
        buf.put_u32_le(SIGNATURE);
        buf.put_u16_le(0x0099);
        buf.put_u16_le(4000);

        let err = decode_frame(&mut buf, 2048).unwrap_err();
        assert!(matches!(
            err,
            FrameError::OversizedFrame {
                required: 4008,
                capacity: 2048
            }
        ));
        assert_eq!(buf.len(), HEADER_SIZE - 1);
    }

    #[test]
    fn payload_too_large_rejected() {
        let payload = vec![0u8; MAX_PAYLOAD + 1];
        let mut buf = BytesMut::new();
        let err = encode_frame(1, &payload, &mut buf).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
        assert!(buf.is_empty());
    }

    #[test]
    fn frame_new_keeps_wire_encoding() {
        let frame = Frame::new(0x0099, &[0xAA, 0xBB, 0xCC]).unwrap();
        assert_eq!(frame.wire_size(), HEADER_SIZE + 3);
        assert_eq!(&frame.wire()[..4], &SIGNATURE.to_le_bytes());
        assert_eq!(frame.payload(), &[0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn multiple_frames_back_to_back() {
        let mut buf = BytesMut::new();
        encode_frame(1, b"first", &mut buf).unwrap();
        encode_frame(2, b"second", &mut buf).unwrap();

        let f1 = decode_frame(&mut buf, 2048).unwrap().unwrap();
        let f2 = decode_frame(&mut buf, 2048).unwrap().unwrap();
        assert_eq!((f1.frame_type, f1.payload()), (1, b"first".as_ref()));
        assert_eq!((f2.frame_type, f2.payload()), (2, b"second".as_ref()));
        assert!(buf.is_empty());
    }
}
