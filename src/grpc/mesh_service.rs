use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tonic::{Request, Response, Status};

use crate::cluster::ClusterView;
use crate::proto::metrics_service_server::MetricsService;
use crate::proto::{Ack, JobRequest, MetricsSnapshot};
use crate::scheduler::Scheduler;

/// gRPC ingress of a mesh node: gossip pushes and job submissions.
pub struct MeshService {
    view: Arc<ClusterView>,
    scheduler: Arc<Scheduler>,
}

impl MeshService {
    pub fn new(view: Arc<ClusterView>, scheduler: Arc<Scheduler>) -> Self {
        Self { view, scheduler }
    }
}

#[tonic::async_trait]
impl MetricsService for MeshService {
    async fn push(&self, request: Request<MetricsSnapshot>) -> Result<Response<Ack>, Status> {
        // The sender's identity is its observed network address.
        let sender = request
            .remote_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let snapshot = request.into_inner();
        tracing::trace!(sender = %sender, cpu = snapshot.cpu, mem = snapshot.mem, "Received push");
        self.view.update(&sender, snapshot);

        Ok(Response::new(Ack {
            msg: "OK".to_string(),
            forwarded_to: String::new(),
        }))
    }

    async fn submit_job(&self, request: Request<JobRequest>) -> Result<Response<Ack>, Status> {
        let job = request.into_inner();
        tracing::info!(job = %job.name, id = %job.id, "Received job request");

        let scheduler = self.scheduler.clone();
        let result = AssertUnwindSafe(async move { scheduler.schedule(&job).await })
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(target)) => Ok(Response::new(Ack {
                msg: "Completed Successfully".to_string(),
                forwarded_to: target,
            })),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Job scheduling failed");
                Err(e.into_status())
            }
            Err(_) => {
                tracing::error!("Panic in SubmitJob handler");
                Err(Status::internal("Internal error in SubmitJob handler"))
            }
        }
    }
}
