pub mod client;
pub mod cluster;
pub mod config;
pub mod diag;
pub mod error;
pub mod executor;
pub mod gossip;
pub mod grpc;
pub mod node;
pub mod scheduler;
pub mod shutdown;
pub mod telemetry;
pub mod workload;

pub use error::{MeshError, Result};

// Re-export generated protobuf types
pub mod proto {
    tonic::include_proto!("mesh");
}
