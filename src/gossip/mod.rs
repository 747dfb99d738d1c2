//! Gossip egress: periodic best-effort pushes of the local snapshot.
//!
//! Each peer gets its own short-lived push task per cycle; tasks do not
//! coordinate and failures are swallowed. A peer that stops receiving
//! pushes simply goes stale in everyone else's cluster view.

use tonic::transport::Endpoint;

use crate::config::PUSH_TIMEOUT;
use crate::error::Result;
use crate::proto;
use crate::proto::metrics_service_client::MetricsServiceClient;

/// Fan the snapshot out to every configured peer, one task per peer.
pub fn broadcast(peers: &[String], port: u16, snapshot: &proto::MetricsSnapshot) {
    for peer in peers {
        let peer = peer.trim();
        if peer.is_empty() {
            continue;
        }
        let peer = peer.to_string();
        let snapshot = snapshot.clone();
        tokio::spawn(async move {
            push_to_peer(&peer, port, snapshot).await;
        });
    }
}

/// One best-effort push. Errors are logged at debug and dropped.
pub async fn push_to_peer(peer: &str, port: u16, snapshot: proto::MetricsSnapshot) {
    match tokio::time::timeout(PUSH_TIMEOUT, try_push(peer, port, snapshot)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::debug!(peer = %peer, error = %e, "Gossip push failed"),
        Err(_) => tracing::debug!(peer = %peer, timeout = ?PUSH_TIMEOUT, "Gossip push timed out"),
    }
}

async fn try_push(peer: &str, port: u16, snapshot: proto::MetricsSnapshot) -> Result<()> {
    let channel = Endpoint::from_shared(format!("http://{peer}:{port}"))?
        .connect_timeout(PUSH_TIMEOUT)
        .timeout(PUSH_TIMEOUT)
        .connect()
        .await?;

    let mut client = MetricsServiceClient::new(channel);
    client.push(snapshot).await?;
    Ok(())
}
