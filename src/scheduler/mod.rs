//! Local placement decisions: execute here or forward to a peer.

pub mod placement;

use std::sync::Arc;
use std::time::Instant;

use tonic::transport::Endpoint;

use crate::cluster::{ClusterView, LOCAL_NODE};
use crate::config::{NodeConfig, DIAL_TIMEOUT, JOB_FORWARD_TIMEOUT};
use crate::error::{MeshError, Result};
use crate::executor::ContainerRuntime;
use crate::proto;
use crate::proto::metrics_service_client::MetricsServiceClient;

pub struct Scheduler {
    view: Arc<ClusterView>,
    runtime: Arc<dyn ContainerRuntime>,
    config: NodeConfig,
}

impl Scheduler {
    pub fn new(view: Arc<ClusterView>, runtime: Arc<dyn ContainerRuntime>, config: NodeConfig) -> Self {
        Self {
            view,
            runtime,
            config,
        }
    }

    /// Place one job: filter the cluster view, pick a node, then either
    /// run the container locally or forward and wait for the remote ack.
    /// Returns the key of the node that actually ran the job.
    ///
    /// A forwarded job re-enters this same path on the receiving node;
    /// no hop count is carried.
    pub async fn schedule(&self, job: &proto::JobRequest) -> Result<String> {
        let view = self.view.snapshot();
        tracing::info!(
            job = %job.name,
            req_cpu = job.req_cpu,
            req_mem = job.req_mem,
            "Assessing candidates"
        );

        let pools =
            placement::filter_candidates(&view, job, self.config.node_ttl, Instant::now());
        let Some(pool) = pools.pick() else {
            return Err(MeshError::NoCapacity(job.name.clone()));
        };

        let target = placement::select_node(pool);
        if target == LOCAL_NODE {
            tracing::info!(job = %job.name, "Executing locally");
            self.runtime.run(&job.image, &job.args).await?;
            return Ok(LOCAL_NODE.to_string());
        }

        forward_job(&target, job, self.config.peer_port).await
    }
}

/// Forward a job to `peer` and block until the remote node's executor
/// returns. The call deadline covers the whole remote execution.
pub async fn forward_job(peer: &str, job: &proto::JobRequest, port: u16) -> Result<String> {
    tracing::info!(job = %job.id, peer = %peer, "Forwarding job, waiting for completion");

    let endpoint = Endpoint::from_shared(format!("http://{peer}:{port}"))?
        .connect_timeout(DIAL_TIMEOUT)
        .timeout(JOB_FORWARD_TIMEOUT);

    let channel = endpoint.connect().await.map_err(|e| MeshError::Forward {
        peer: peer.to_string(),
        reason: format!("dial failed: {e}"),
    })?;

    let mut client = MetricsServiceClient::new(channel);
    let ack = client
        .submit_job(job.clone())
        .await
        .map_err(|status| MeshError::Forward {
            peer: peer.to_string(),
            reason: format!("remote execution failed: {}", status.message()),
        })?
        .into_inner();

    Ok(resolve_runner(&ack.forwarded_to, peer))
}

/// A remote reporting "localhost" means *that* node ran the job; rewrite
/// it to the peer's address so the caller sees the actual runner.
pub fn resolve_runner(forwarded_to: &str, peer: &str) -> String {
    if forwarded_to == LOCAL_NODE {
        peer.to_string()
    } else {
        forwarded_to.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_localhost_rewrites_to_peer_address() {
        assert_eq!(resolve_runner("localhost", "10.0.0.7"), "10.0.0.7");
        assert_eq!(resolve_runner("10.0.0.9", "10.0.0.7"), "10.0.0.9");
    }
}
