use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use enclink_frame::{DecoderStats, FrameDecoder, FrameError};
use tracing::{debug, error};

use crate::dispatch::Dispatcher;
use crate::error::{BridgeError, Result};

const READ_CHUNK_SIZE: usize = 256;

/// Pause after a non-blocking reader reports no data.
const WOULD_BLOCK_BACKOFF: Duration = Duration::from_millis(5);

/// Ingestion side of the bridge: decoder plus dispatcher.
///
/// Owns the staging accumulator exclusively, so it needs `&mut self` but no
/// locking. Only the dispatcher's pushes touch shared state.
#[derive(Debug)]
pub struct Ingestor {
    decoder: FrameDecoder,
    dispatcher: Dispatcher,
}

impl Ingestor {
    pub fn new(decoder: FrameDecoder, dispatcher: Dispatcher) -> Self {
        Self {
            decoder,
            dispatcher,
        }
    }

    /// Accept a chunk from the transport and dispatch every frame it completes.
    ///
    /// Never fails and never waits on the consumer. Returns the number of
    /// bytes accepted: 0 for an empty chunk or one lost to an overflow reset.
    pub fn receive(&mut self, chunk: &[u8]) -> usize {
        let frames = match self.decoder.feed(chunk) {
            Ok(frames) => frames,
            Err(FrameError::EmptyChunk) => {
                error!("invalid receive parameters: empty chunk");
                return 0;
            }
            Err(_) => return 0,
        };

        for frame in frames {
            self.dispatcher.dispatch(&frame);
        }
        chunk.len()
    }

    /// Read from `reader` and feed every chunk to [`receive`](Self::receive).
    ///
    /// Runs until EOF, a read error, or `running` is cleared. Read timeouts
    /// and interruptions just re-check `running`. A non-blocking reader is
    /// polled with a short sleep between `WouldBlock` results. Returns the
    /// number of bytes read from the transport.
    pub fn pump<R: Read>(&mut self, reader: &mut R, running: &AtomicBool) -> Result<u64> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let mut total = 0u64;

        while running.load(Ordering::SeqCst) {
            let read = match reader.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(WOULD_BLOCK_BACKOFF);
                    continue;
                }
                Err(err) if matches!(err.kind(), ErrorKind::Interrupted | ErrorKind::TimedOut) => {
                    continue
                }
                Err(err) => return Err(BridgeError::Transport(err)),
            };

            if read == 0 {
                debug!(total, "serial stream closed");
                break;
            }

            total += read as u64;
            self.receive(&chunk[..read]);
        }

        Ok(total)
    }

    /// Discard any partially staged frame.
    pub fn reset(&mut self) {
        self.decoder.reset();
    }

    /// Bytes staged but not yet resolved into a frame.
    pub fn pending(&self) -> usize {
        self.decoder.pending()
    }

    /// Decoder counters since construction.
    pub fn stats(&self) -> DecoderStats {
        self.decoder.stats()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;
    use std::time::Instant;

    use bytes::BytesMut;
    use enclink_frame::{encode_frame, STATE_UPDATE};

    use super::*;
    use crate::queue::{DeliveryQueue, ReadMode};
    use crate::snapshot::StateSnapshot;

    fn ingestor(staging: usize, queue: usize) -> (Ingestor, Arc<DeliveryQueue>) {
        let queue = Arc::new(DeliveryQueue::new(queue));
        let ingestor = Ingestor::new(
            FrameDecoder::with_capacity(staging),
            Dispatcher::new(Arc::clone(&queue)),
        );
        (ingestor, queue)
    }

    fn drain(queue: &DeliveryQueue) -> Vec<u8> {
        let mut buf = vec![0u8; queue.capacity()];
        match queue.read(&mut buf, ReadMode::NonBlocking, None) {
            Ok(n) => buf[..n].to_vec(),
            Err(_) => Vec::new(),
        }
    }

    #[test]
    fn state_update_scenario() {
        let (mut ingestor, queue) = ingestor(2048, 2048);
        let accepted =
            ingestor.receive(&[0x0D, 0xF0, 0xAD, 0x0B, 0x04, 0x00, 0x02, 0x00, 0x05, 0x07]);

        assert_eq!(accepted, 10);
        assert_eq!(
            queue.snapshot(),
            StateSnapshot {
                root_state: 5,
                version: 7
            }
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn opaque_frame_scenario() {
        let (mut ingestor, queue) = ingestor(2048, 2048);
        let bytes = [
            0x0D, 0xF0, 0xAD, 0x0B, 0x99, 0x00, 0x03, 0x00, 0xAA, 0xBB, 0xCC,
        ];
        ingestor.receive(&bytes);
        assert_eq!(drain(&queue), bytes.to_vec());
    }

    #[test]
    fn empty_chunk_accepts_nothing() {
        let (mut ingestor, _queue) = ingestor(64, 64);
        assert_eq!(ingestor.receive(&[]), 0);
    }

    #[test]
    fn overflow_drops_chunk_and_staged_bytes() {
        let (mut ingestor, queue) = ingestor(16, 64);
        assert_eq!(ingestor.receive(&[0x0D, 0xF0, 0xAD, 0x0B, 0x99, 0x00]), 6);
        assert_eq!(ingestor.receive(&[0u8; 11]), 0);
        assert_eq!(ingestor.pending(), 0);
        assert_eq!(ingestor.stats().overflow_resets, 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn frames_split_across_chunks_are_forwarded_in_order() {
        let mut wire = BytesMut::new();
        encode_frame(0x0010, b"one", &mut wire).unwrap();
        encode_frame(STATE_UPDATE, &[2, 3], &mut wire).unwrap();
        encode_frame(0x0011, b"two", &mut wire).unwrap();

        let (mut ingestor, queue) = ingestor(2048, 2048);
        for chunk in wire.chunks(5) {
            assert_eq!(ingestor.receive(chunk), chunk.len());
        }

        let mut expected = BytesMut::new();
        encode_frame(0x0010, b"one", &mut expected).unwrap();
        encode_frame(0x0011, b"two", &mut expected).unwrap();
        assert_eq!(drain(&queue), expected.to_vec());
        assert_eq!(queue.snapshot().version, 3);
    }

    #[test]
    fn pump_feeds_until_eof() {
        let mut wire = BytesMut::from(&[0xEE, 0xEE][..]);
        encode_frame(0x0042, b"pumped", &mut wire).unwrap();
        let (mut ingestor, queue) = ingestor(2048, 2048);

        let running = AtomicBool::new(true);
        let total = ingestor
            .pump(&mut Cursor::new(wire.to_vec()), &running)
            .unwrap();

        assert_eq!(total, wire.len() as u64);
        assert_eq!(drain(&queue), wire[2..].to_vec());
        assert_eq!(ingestor.stats().resync_bytes, 2);
    }

    #[test]
    fn pump_stops_when_not_running() {
        let (mut ingestor, _queue) = ingestor(64, 64);
        let running = AtomicBool::new(false);
        let total = ingestor
            .pump(&mut Cursor::new(vec![1u8; 32]), &running)
            .unwrap();
        assert_eq!(total, 0);
    }

    #[test]
    fn pump_backs_off_on_would_block() {
        struct Idle {
            idle_reads: usize,
            data: Cursor<Vec<u8>>,
        }
        impl Read for Idle {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if self.idle_reads > 0 {
                    self.idle_reads -= 1;
                    return Err(std::io::Error::from(ErrorKind::WouldBlock));
                }
                self.data.read(buf)
            }
        }

        let mut wire = BytesMut::new();
        encode_frame(0x0042, b"late", &mut wire).unwrap();
        let mut reader = Idle {
            idle_reads: 4,
            data: Cursor::new(wire.to_vec()),
        };
        let (mut ingestor, queue) = ingestor(2048, 2048);
        let running = AtomicBool::new(true);

        let start = Instant::now();
        let total = ingestor.pump(&mut reader, &running).unwrap();

        assert!(start.elapsed() >= WOULD_BLOCK_BACKOFF * 4);
        assert_eq!(total, wire.len() as u64);
        assert_eq!(drain(&queue), wire.to_vec());
    }

    #[test]
    fn pump_surfaces_read_errors() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::from(ErrorKind::ConnectionReset))
            }
        }

        let (mut ingestor, _queue) = ingestor(64, 64);
        let running = AtomicBool::new(true);
        let err = ingestor.pump(&mut Broken, &running).unwrap_err();
        assert!(matches!(err, BridgeError::Transport(_)));
    }
}
