//! Feasibility filtering and node selection.
//!
//! Pure functions over a cluster-view snapshot so the policy is testable
//! without any network or producers running.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::cluster::{NodeEntry, LOCAL_NODE};
use crate::proto;

/// A node is feasible only while its projected CPU stays strictly below
/// this ceiling.
pub const CPU_CEILING: f64 = 95.0;

/// Same, for projected memory saturation.
pub const MEM_CEILING: f64 = 90.0;

/// Candidates surviving the feasibility filter. `safe` is the subset of
/// `valid` that is also thermally safe.
#[derive(Debug, Default, PartialEq)]
pub struct CandidatePools {
    pub valid: Vec<String>,
    pub safe: Vec<String>,
}

impl CandidatePools {
    /// The pool selection draws from: thermally safe nodes when any
    /// exist, otherwise every node with capacity. `None` means the
    /// cluster has no capacity for this job.
    pub fn pick(&self) -> Option<&[String]> {
        if !self.safe.is_empty() {
            Some(&self.safe)
        } else if !self.valid.is_empty() {
            Some(&self.valid)
        } else {
            None
        }
    }
}

/// Filter the cluster view for nodes that can take `job`.
///
/// Drops entries older than `ttl`, then requires strict headroom on both
/// axes: `cpu + req_cpu < 95` and `mem + req_mem < 90`. Boundary
/// equality is rejected. An empty temp status counts as thermally safe
/// (nodes without sensors are not penalized).
pub fn filter_candidates(
    view: &HashMap<String, NodeEntry>,
    job: &proto::JobRequest,
    ttl: Duration,
    now: Instant,
) -> CandidatePools {
    let mut pools = CandidatePools::default();

    for (node, entry) in view {
        if now.saturating_duration_since(entry.last_seen) > ttl {
            continue;
        }

        let m = &entry.snapshot;
        let cpu_ok = (m.cpu + job.req_cpu) < CPU_CEILING;
        let mem_ok = (m.mem + job.req_mem) < MEM_CEILING;
        if !(cpu_ok && mem_ok) {
            continue;
        }

        pools.valid.push(node.clone());
        if m.temp_status == "SAFE" || m.temp_status.is_empty() {
            pools.safe.push(node.clone());
        }

        let display_temp = if m.temp_status.is_empty() {
            "N/A"
        } else {
            m.temp_status.as_str()
        };
        tracing::info!(candidate = %node, cpu = m.cpu, temp = display_temp, "Candidate found");
    }

    pools
}

/// Select one pool member uniformly at random, then override with the
/// local node whenever it is present: running in place beats paying
/// network serialization, while randomization avoids thundering-herd
/// convergence when forwarding is unavoidable.
pub fn select_node(pool: &[String]) -> String {
    let mut selected = &pool[rand::thread_rng().gen_range(0..pool.len())];
    for node in pool {
        if node == LOCAL_NODE {
            selected = node;
            break;
        }
    }
    selected.clone()
}
