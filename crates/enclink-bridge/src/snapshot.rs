use serde::Serialize;

/// Latest enclave state reported by a state-update frame.
///
/// Each update overwrites both fields; no history is kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StateSnapshot {
    pub root_state: u8,
    pub version: u8,
}

impl StateSnapshot {
    /// Payload bytes a state update needs.
    pub const MIN_PAYLOAD: usize = 2;

    /// Read the snapshot from a state-update payload. Bytes past the second are ignored.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        if payload.len() < Self::MIN_PAYLOAD {
            return None;
        }
        Some(Self {
            root_state: payload[0],
            version: payload[1],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_gating() {
        assert_eq!(StateSnapshot::from_payload(&[]), None);
        assert_eq!(StateSnapshot::from_payload(&[1]), None);
        assert_eq!(
            StateSnapshot::from_payload(&[5, 7]),
            Some(StateSnapshot {
                root_state: 5,
                version: 7
            })
        );
        assert_eq!(
            StateSnapshot::from_payload(&[5, 7, 9, 9]),
            Some(StateSnapshot {
                root_state: 5,
                version: 7
            })
        );
    }

    #[test]
    fn serializes_field_names() {
        let json = serde_json::to_value(StateSnapshot {
            root_state: 3,
            version: 1,
        })
        .unwrap();
        assert_eq!(json["root_state"], 3);
        assert_eq!(json["version"], 1);
    }
}
