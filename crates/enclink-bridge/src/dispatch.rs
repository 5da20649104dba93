use std::sync::Arc;

use enclink_frame::{is_state_update, Frame};
use tracing::{debug, error, info};

use crate::queue::DeliveryQueue;
use crate::snapshot::StateSnapshot;

/// What the dispatcher did with a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// A state update overwrote the snapshot.
    StateUpdated(StateSnapshot),
    /// A state update was too short to apply; the snapshot is unchanged.
    ShortStatePayload { len: usize },
    /// An opaque frame was queued for the consumer, header included.
    Forwarded { bytes: usize, evicted: usize },
}

/// Routes decoded frames by type.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    queue: Arc<DeliveryQueue>,
}

impl Dispatcher {
    pub fn new(queue: Arc<DeliveryQueue>) -> Self {
        Self { queue }
    }

    /// Apply a state update, or forward any other frame verbatim.
    pub fn dispatch(&self, frame: &Frame) -> Dispatched {
        if is_state_update(frame.frame_type) {
            return self.apply_state_update(frame);
        }

        debug!(
            frame_type = frame.frame_type,
            size = frame.wire_size(),
            "unhandled packet type, forwarding to reader"
        );
        let evicted = self.queue.push_slice(frame.wire());
        Dispatched::Forwarded {
            bytes: frame.wire_size(),
            evicted,
        }
    }

    fn apply_state_update(&self, frame: &Frame) -> Dispatched {
        match StateSnapshot::from_payload(frame.payload()) {
            Some(snapshot) => {
                self.queue.store_snapshot(snapshot);
                info!(
                    root_state = snapshot.root_state,
                    version = snapshot.version,
                    "state update packet received"
                );
                Dispatched::StateUpdated(snapshot)
            }
            None => {
                error!(
                    len = frame.payload_len(),
                    "state update packet payload too small"
                );
                Dispatched::ShortStatePayload {
                    len: frame.payload_len(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use enclink_frame::STATE_UPDATE;

    use super::*;

    fn dispatcher() -> (Dispatcher, Arc<DeliveryQueue>) {
        let queue = Arc::new(DeliveryQueue::new(64));
        (Dispatcher::new(Arc::clone(&queue)), queue)
    }

    #[test]
    fn state_update_sets_snapshot_and_queues_nothing() {
        let (dispatcher, queue) = dispatcher();
        let frame = Frame::new(STATE_UPDATE, &[5, 7]).unwrap();

        let outcome = dispatcher.dispatch(&frame);
        let expected = StateSnapshot {
            root_state: 5,
            version: 7,
        };
        assert_eq!(outcome, Dispatched::StateUpdated(expected));
        assert_eq!(queue.snapshot(), expected);
        assert!(queue.is_empty());
    }

    #[test]
    fn short_state_update_leaves_snapshot_unchanged() {
        let (dispatcher, queue) = dispatcher();
        dispatcher.dispatch(&Frame::new(STATE_UPDATE, &[1, 2]).unwrap());

        for payload in [&[][..], &[9][..]] {
            let outcome = dispatcher.dispatch(&Frame::new(STATE_UPDATE, payload).unwrap());
            assert_eq!(
                outcome,
                Dispatched::ShortStatePayload { len: payload.len() }
            );
        }
        assert_eq!(
            queue.snapshot(),
            StateSnapshot {
                root_state: 1,
                version: 2
            }
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn extra_state_payload_bytes_are_ignored() {
        let (dispatcher, queue) = dispatcher();
        dispatcher.dispatch(&Frame::new(STATE_UPDATE, &[3, 4, 0xFF, 0xFF]).unwrap());
        assert_eq!(queue.snapshot().root_state, 3);
        assert_eq!(queue.snapshot().version, 4);
    }

    #[test]
    fn opaque_frame_is_forwarded_with_header() {
        let (dispatcher, queue) = dispatcher();
        let frame = Frame::new(0x0099, &[0xAA, 0xBB, 0xCC]).unwrap();

        let outcome = dispatcher.dispatch(&frame);
        assert_eq!(
            outcome,
            Dispatched::Forwarded {
                bytes: 11,
                evicted: 0
            }
        );

        let mut buf = [0u8; 32];
        let n = queue
            .read(&mut buf, crate::queue::ReadMode::NonBlocking, None)
            .unwrap();
        assert_eq!(
            &buf[..n],
            &[0x0D, 0xF0, 0xAD, 0x0B, 0x99, 0x00, 0x03, 0x00, 0xAA, 0xBB, 0xCC]
        );
        assert_eq!(queue.snapshot(), StateSnapshot::default());
    }

    #[test]
    fn forwarding_into_full_queue_reports_eviction() {
        let queue = Arc::new(DeliveryQueue::new(10));
        let dispatcher = Dispatcher::new(Arc::clone(&queue));
        let outcome = dispatcher.dispatch(&Frame::new(0x0001, &[1, 2, 3, 4]).unwrap());
        assert_eq!(
            outcome,
            Dispatched::Forwarded {
                bytes: 12,
                evicted: 2
            }
        );
        assert_eq!(queue.len(), 10);
    }
}
