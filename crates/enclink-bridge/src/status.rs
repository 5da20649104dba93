//! Read-only status values published for external introspection.

use std::sync::Arc;

use crate::queue::DeliveryQueue;
use crate::snapshot::StateSnapshot;

/// A published status value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAttribute {
    RootState,
    Version,
}

impl StatusAttribute {
    pub const ALL: [StatusAttribute; 2] = [StatusAttribute::RootState, StatusAttribute::Version];

    /// Attribute name as published.
    pub fn name(self) -> &'static str {
        match self {
            StatusAttribute::RootState => "root_state",
            StatusAttribute::Version => "version",
        }
    }

    /// Look up an attribute by its published name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|attr| attr.name() == name)
    }
}

/// Cloneable read handle on the state snapshot.
///
/// Every read takes the current value; two reads may observe different
/// snapshots.
#[derive(Debug, Clone)]
pub struct StatusView {
    queue: Arc<DeliveryQueue>,
}

impl StatusView {
    /// View the snapshot held by `queue`.
    pub fn new(queue: Arc<DeliveryQueue>) -> Self {
        Self { queue }
    }

    pub fn snapshot(&self) -> StateSnapshot {
        self.queue.snapshot()
    }

    pub fn root_state(&self) -> u8 {
        self.snapshot().root_state
    }

    pub fn version(&self) -> u8 {
        self.snapshot().version
    }

    /// Render one attribute as a decimal value followed by a newline.
    pub fn render(&self, attr: StatusAttribute) -> String {
        let snapshot = self.snapshot();
        let value = match attr {
            StatusAttribute::RootState => snapshot.root_state,
            StatusAttribute::Version => snapshot.version,
        };
        format!("{value}\n")
    }
}
