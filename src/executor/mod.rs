//! Thin façade over the container runtime: pull, create, start, wait.

use std::process::Stdio;

use tokio::process::Command;

use crate::error::{MeshError, Result};

const DOCKER_SHORT_ID_LEN: usize = 12;

/// Runs a container image to completion. Blocking from the caller's
/// perspective: `run` resolves once the container is no longer running.
#[tonic::async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn run(&self, image: &str, args: &[String]) -> Result<()>;
}

/// Runtime backed by the docker CLI.
#[derive(Debug, Clone, Default)]
pub struct DockerRuntime;

impl DockerRuntime {
    pub fn new() -> Self {
        Self
    }

    async fn docker(&self, args: &[String]) -> Result<String> {
        let output = Command::new("docker")
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| MeshError::Exec(format!("docker {}: {e}", args[0])))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MeshError::Exec(format!(
                "docker {} failed: {}",
                args[0],
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[tonic::async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn run(&self, image: &str, args: &[String]) -> Result<()> {
        // Pull progress is discarded; only failure matters.
        self.docker(&pull_args(image)).await?;

        let container_id = self.docker(&create_args(image, args)).await?;
        let short_id = &container_id[..container_id.len().min(DOCKER_SHORT_ID_LEN)];

        self.docker(&start_args(&container_id)).await?;
        tracing::info!(container = short_id, "Container running, waiting for completion");

        // Blocks until the container is no longer running. The
        // container's own exit code is not an execution failure.
        self.docker(&wait_args(&container_id)).await?;
        tracing::info!(container = short_id, "Container finished");

        Ok(())
    }
}

fn pull_args(image: &str) -> Vec<String> {
    vec!["pull".to_string(), image.to_string()]
}

fn create_args(image: &str, args: &[String]) -> Vec<String> {
    let mut out = vec!["create".to_string(), image.to_string()];
    out.extend(args.iter().cloned());
    out
}

fn start_args(container_id: &str) -> Vec<String> {
    vec!["start".to_string(), container_id.to_string()]
}

fn wait_args(container_id: &str) -> Vec<String> {
    vec!["wait".to_string(), container_id.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_appends_command_arguments() {
        let args = vec!["--cpu".to_string(), "2".to_string()];
        assert_eq!(
            create_args("alexeiled/stress-ng", &args),
            vec!["create", "alexeiled/stress-ng", "--cpu", "2"]
        );
    }

    #[test]
    fn lifecycle_argument_vectors() {
        assert_eq!(pull_args("busybox"), vec!["pull", "busybox"]);
        assert_eq!(start_args("abc123"), vec!["start", "abc123"]);
        assert_eq!(wait_args("abc123"), vec!["wait", "abc123"]);
    }
}
