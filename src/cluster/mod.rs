//! Cluster view: what this node believes about every node it has heard
//! from, including itself under the key [`LOCAL_NODE`].

pub mod display;

use std::collections::HashMap;
use std::time::Instant;

use parking_lot::RwLock;

use crate::proto;

/// Key under which a node stores its own snapshot, making self-selection
/// uniform with peer selection.
pub const LOCAL_NODE: &str = "localhost";

/// One row of the cluster view.
#[derive(Debug, Clone)]
pub struct NodeEntry {
    pub snapshot: proto::MetricsSnapshot,
    pub last_seen: Instant,
}

/// Mapping from node key (observed sender address, or [`LOCAL_NODE`]) to
/// its latest snapshot.
///
/// Entries are never deleted: staleness is decided by readers against
/// the node TTL, which bounds memory by the peer set plus observed
/// senders. Writers are the gossip ingress handler and the egress timer.
#[derive(Debug, Default)]
pub struct ClusterView {
    nodes: RwLock<HashMap<String, NodeEntry>>,
}

impl ClusterView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a node's snapshot and refresh its last-seen time. A
    /// later push replaces an earlier one unconditionally.
    pub fn update(&self, node: &str, snapshot: proto::MetricsSnapshot) {
        self.nodes.write().insert(
            node.to_string(),
            NodeEntry {
                snapshot,
                last_seen: Instant::now(),
            },
        );
    }

    /// Deep copy of the view, safe to iterate without holding the lock.
    pub fn snapshot(&self) -> HashMap<String, NodeEntry> {
        self.nodes.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(cpu: f64) -> proto::MetricsSnapshot {
        proto::MetricsSnapshot {
            cpu,
            mem: 40.0,
            temp_c: 50.0,
            temp_status: "SAFE".to_string(),
            zone: "cpu-thermal".to_string(),
        }
    }

    #[test]
    fn update_overwrites_and_advances_last_seen() {
        let view = ClusterView::new();
        view.update("10.0.0.2", snap(10.0));
        let first = view.snapshot()["10.0.0.2"].clone();

        view.update("10.0.0.2", snap(90.0));
        let second = view.snapshot()["10.0.0.2"].clone();

        assert_eq!(second.snapshot.cpu, 90.0);
        assert!(second.last_seen >= first.last_seen);
        assert_eq!(view.snapshot().len(), 1);
    }

    #[test]
    fn snapshot_is_a_deep_copy() {
        let view = ClusterView::new();
        view.update(LOCAL_NODE, snap(10.0));

        let mut copy = view.snapshot();
        copy.get_mut(LOCAL_NODE).unwrap().snapshot.cpu = 99.0;

        assert_eq!(view.snapshot()[LOCAL_NODE].snapshot.cpu, 10.0);
    }
}
