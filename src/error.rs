use thiserror::Error;
use tonic::Status;

#[derive(Error, Debug)]
pub enum MeshError {
    #[error("collector initialization failed: {0}")]
    Init(String),

    #[error("telemetry read failed: {0}")]
    Telemetry(String),

    #[error("no suitable nodes found for job {0} (cluster overloaded)")]
    NoCapacity(String),

    #[error("forwarding to {peer} failed: {reason}")]
    Forward { peer: String, reason: String },

    #[error("container execution failed: {0}")]
    Exec(String),

    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    #[error("rpc error: {0}")]
    Rpc(#[from] Status),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MeshError {
    /// Map a scheduling failure onto the gRPC status returned to the
    /// SubmitJob caller. The status message is the one-line reason the
    /// `run` command prints.
    pub fn into_status(self) -> Status {
        let msg = self.to_string();
        match self {
            MeshError::NoCapacity(_) => Status::resource_exhausted(msg),
            MeshError::Forward { .. } => Status::unavailable(msg),
            MeshError::Rpc(status) => status,
            _ => Status::internal(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, MeshError>;
