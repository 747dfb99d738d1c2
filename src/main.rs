use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use edge_mesh::config::NodeConfig;
use edge_mesh::node::Node;
use edge_mesh::shutdown::install_shutdown_handler;
use edge_mesh::{client, diag, grpc};

#[derive(Parser, Debug)]
#[command(name = "edge-mesh")]
#[command(about = "Decentralized kernel-metric driven scheduling for edge FaaS")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the P2P mesh: collect, share and schedule
    Peer {
        /// Comma-separated list of peer IPs
        #[arg(long, value_delimiter = ',')]
        peers: Vec<String>,
    },
    /// Submit a workload (IMG_RESIZE, DATA_ETL, MATRIX_OPS)
    Run { workload: String },
    /// Print the CPU pressure stream
    Cpuwatch,
    /// Print the memory saturation stream
    Memwatch,
    /// Print the thermal stream
    Tempwatch,
    /// Push local metrics to a single collector
    Aggregate {
        /// Collector address (host or host:port)
        #[arg(long, default_value = "127.0.0.1:60000")]
        target: String,
    },
    /// Receive and log snapshots from aggregators
    Leader,
}

fn parse_peers(raw: Vec<String>) -> Vec<String> {
    raw.into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Peer { peers } => {
            let config = NodeConfig::new(parse_peers(peers));
            tracing::info!(
                listen = %config.listen_addr,
                peers = ?config.peers,
                "Starting edge-mesh node"
            );
            let shutdown = install_shutdown_handler();
            Node::new(config).run(shutdown).await?;
        }
        Commands::Run { workload } => {
            let Some(job) = edge_mesh::workload::job_request(&workload) else {
                eprintln!("Unknown workload. Available: {}", edge_mesh::workload::AVAILABLE);
                std::process::exit(1);
            };
            if let Err(e) = client::submit_job(job).await {
                eprintln!(">> Job Failed: {e}");
                std::process::exit(1);
            }
        }
        Commands::Cpuwatch => diag::cpu_watch().await?,
        Commands::Memwatch => diag::mem_watch().await?,
        Commands::Tempwatch => diag::temp_watch().await?,
        Commands::Aggregate { target } => diag::aggregate(&target).await?,
        Commands::Leader => {
            let addr = NodeConfig::default().listen_addr;
            grpc::sink_service::run_sink(addr).await?;
        }
    }

    Ok(())
}
