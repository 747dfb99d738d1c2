use std::net::SocketAddr;
use std::time::Duration;

/// TCP port every node serves gRPC on and every push/forward dials.
pub const PEER_PORT: u16 = 60000;

/// Maximum silence before a cluster-view entry is considered stale.
pub const NODE_TTL: Duration = Duration::from_secs(4);

/// Interval between gossip egress cycles.
pub const GOSSIP_INTERVAL: Duration = Duration::from_secs(3);

/// Deadline for one best-effort gossip push, connection included.
pub const PUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Deadline for establishing the connection when forwarding a job.
pub const DIAL_TIMEOUT: Duration = Duration::from_secs(2);

/// Deadline for a forwarded SubmitJob call. The remote executes the
/// container before answering, so this bounds the whole job runtime.
pub const JOB_FORWARD_TIMEOUT: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub listen_addr: SocketAddr,
    /// Gossip egress targets, bare IPs or hostnames without port.
    pub peers: Vec<String>,
    /// Port used when dialing peers (gossip pushes and job forwards).
    pub peer_port: u16,
    pub gossip_interval: Duration,
    pub node_ttl: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], PEER_PORT)),
            peers: Vec::new(),
            peer_port: PEER_PORT,
            gossip_interval: GOSSIP_INTERVAL,
            node_ttl: NODE_TTL,
        }
    }
}

impl NodeConfig {
    pub fn new(peers: Vec<String>) -> Self {
        Self {
            peers,
            ..Default::default()
        }
    }
}
