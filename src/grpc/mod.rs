pub mod mesh_service;
pub mod server;
pub mod sink_service;

pub use server::GrpcServer;
