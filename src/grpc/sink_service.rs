use std::net::SocketAddr;

use tonic::transport::Server;
use tonic::{Request, Response, Status};

use crate::proto::metrics_service_server::{MetricsService, MetricsServiceServer};
use crate::proto::{Ack, JobRequest, MetricsSnapshot};

/// Bare metrics sink for the `leader` subcommand: logs every snapshot it
/// receives and schedules nothing.
#[derive(Debug, Default)]
pub struct MetricsSink;

#[tonic::async_trait]
impl MetricsService for MetricsSink {
    async fn push(&self, request: Request<MetricsSnapshot>) -> Result<Response<Ack>, Status> {
        let m = request.into_inner();
        tracing::info!(
            cpu = format!("{:.2}", m.cpu),
            mem = format!("{:.2}", m.mem),
            temp_c = format!("{:.1}", m.temp_c),
            status = %m.temp_status,
            zone = %m.zone,
            "Received snapshot"
        );
        Ok(Response::new(Ack {
            msg: "OK".to_string(),
            forwarded_to: String::new(),
        }))
    }

    async fn submit_job(&self, _request: Request<JobRequest>) -> Result<Response<Ack>, Status> {
        Err(Status::unimplemented(
            "job scheduling is not available on a metrics sink",
        ))
    }
}

pub async fn run_sink(addr: SocketAddr) -> crate::error::Result<()> {
    tracing::info!(addr = %addr, "Metrics sink listening");
    Server::builder()
        .add_service(MetricsServiceServer::new(MetricsSink))
        .serve(addr)
        .await?;
    Ok(())
}
