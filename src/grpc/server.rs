use std::net::SocketAddr;
use std::sync::Arc;

use tonic::transport::Server;

use crate::cluster::ClusterView;
use crate::grpc::mesh_service::MeshService;
use crate::proto::metrics_service_server::MetricsServiceServer;
use crate::scheduler::Scheduler;

pub struct GrpcServer {
    addr: SocketAddr,
    view: Arc<ClusterView>,
    scheduler: Arc<Scheduler>,
}

impl GrpcServer {
    pub fn new(addr: SocketAddr, view: Arc<ClusterView>, scheduler: Arc<Scheduler>) -> Self {
        Self {
            addr,
            view,
            scheduler,
        }
    }

    pub async fn run(self) -> Result<(), tonic::transport::Error> {
        let service = MeshService::new(self.view, self.scheduler);

        tracing::info!(addr = %self.addr, "Starting gRPC server");

        Server::builder()
            .add_service(MetricsServiceServer::new(service))
            .serve(self.addr)
            .await
    }
}
