//! Frame dispatch and consumer hand-off for the enclave UART bridge.
//!
//! Bytes arriving from the serial line go through the [`Ingestor`], which
//! decodes frames, folds state updates into a [`StateSnapshot`] and forwards
//! everything else to a bounded [`DeliveryQueue`]. The consumer drains that
//! queue through an [`Endpoint`], which also carries writes back to the line.

pub mod bridge;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod ingest;
pub mod queue;
pub mod ring;
pub mod snapshot;
pub mod status;
pub mod transmit;

pub use bridge::{Bridge, BridgeConfig};
pub use dispatch::{Dispatched, Dispatcher};
pub use endpoint::{Endpoint, Interrupter};
pub use error::{BridgeError, Result};
pub use ingest::Ingestor;
pub use queue::{DeliveryQueue, ReadMode, DEFAULT_QUEUE_CAPACITY};
pub use ring::RingBuffer;
pub use snapshot::StateSnapshot;
pub use status::{StatusAttribute, StatusView};
pub use transmit::{Transmitter, STACK_STAGING_SIZE};
