use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::cluster::{display, ClusterView, LOCAL_NODE};
use crate::config::NodeConfig;
use crate::error::Result;
use crate::executor::DockerRuntime;
use crate::gossip;
use crate::grpc::GrpcServer;
use crate::scheduler::Scheduler;
use crate::telemetry::cpu::{self, ProcStatSource};
use crate::telemetry::mem::{self, SysMemorySource};
use crate::telemetry::thermal::{self, SysfsThermalSource};
use crate::telemetry::{LocalSnapshot, TempReading};

/// One mesh node: telemetry producers, gossip, scheduler, RPC server and
/// the cluster display.
pub struct Node {
    config: NodeConfig,
}

impl Node {
    pub fn new(config: NodeConfig) -> Self {
        Self { config }
    }

    /// Run until the shutdown token fires or the gRPC server dies.
    ///
    /// Producer construction failures abort startup synchronously; from
    /// then on everything is best-effort until shutdown, which drains by
    /// invoking each producer's cleanup.
    pub async fn run(self, shutdown: CancellationToken) -> Result<()> {
        let view = Arc::new(ClusterView::new());
        let snapshot = Arc::new(LocalSnapshot::new());
        let runtime = Arc::new(DockerRuntime::new());
        let scheduler = Arc::new(Scheduler::new(
            view.clone(),
            runtime,
            self.config.clone(),
        ));

        let (cpu_rx, cpu_handle) = cpu::spawn_producer(
            ProcStatSource::new()?,
            cpu::SAMPLE_INTERVAL,
            cpu::detect_cores(),
        )?;
        let (mem_rx, mem_handle) =
            mem::spawn_producer(SysMemorySource::new(), mem::SAMPLE_INTERVAL)?;
        let (temp_rx, temp_handle) =
            thermal::spawn_producer(SysfsThermalSource::new(), thermal::SAMPLE_INTERVAL)?;
        let handles = [cpu_handle, mem_handle, temp_handle];

        spawn_consumers(snapshot.clone(), cpu_rx, mem_rx, temp_rx);

        let server = GrpcServer::new(self.config.listen_addr, view.clone(), scheduler);

        tracing::info!(
            listen = %self.config.listen_addr,
            peers = ?self.config.peers,
            "Node started"
        );

        let result: Result<()> = tokio::select! {
            res = server.run() => res.map_err(crate::error::MeshError::from),
            _ = gossip_loop(&self.config, &snapshot, &view) => Ok(()),
            _ = shutdown.cancelled() => {
                tracing::info!("Shutting down");
                Ok(())
            }
        };

        for handle in &handles {
            handle.cleanup();
        }
        result
    }
}

/// Pipe each producer stream into its snapshot field, one task per
/// stream. The tasks end when the producers close their channels.
fn spawn_consumers(
    snapshot: Arc<LocalSnapshot>,
    mut cpu_rx: mpsc::Receiver<f64>,
    mut mem_rx: mpsc::Receiver<f64>,
    mut temp_rx: mpsc::Receiver<TempReading>,
) {
    let cpu_snap = snapshot.clone();
    tokio::spawn(async move {
        while let Some(v) = cpu_rx.recv().await {
            cpu_snap.update_cpu(v);
        }
    });

    let mem_snap = snapshot.clone();
    tokio::spawn(async move {
        while let Some(v) = mem_rx.recv().await {
            mem_snap.update_mem(v);
        }
    });

    tokio::spawn(async move {
        while let Some(r) = temp_rx.recv().await {
            snapshot.update_temp(r);
        }
    });
}

/// Egress timer: write the local snapshot into the view under
/// "localhost", broadcast it to every peer, refresh the display.
async fn gossip_loop(config: &NodeConfig, snapshot: &LocalSnapshot, view: &ClusterView) {
    let mut ticker = tokio::time::interval(config.gossip_interval);
    loop {
        ticker.tick().await;

        let current = snapshot.read().to_proto();
        view.update(LOCAL_NODE, current.clone());
        gossip::broadcast(&config.peers, config.peer_port, &current);
        display::print(&view.snapshot(), config.node_ttl);
    }
}
