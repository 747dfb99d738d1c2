//! The `run` subcommand: submit one job to the local node and wait for
//! the execution result.

use tonic::transport::Endpoint;

use crate::config::{DIAL_TIMEOUT, JOB_FORWARD_TIMEOUT, PEER_PORT};
use crate::error::Result;
use crate::proto;
use crate::proto::metrics_service_client::MetricsServiceClient;

/// Submit `job` to the node on this host and print the outcome. The
/// call blocks until the job finished somewhere in the mesh.
pub async fn submit_job(job: proto::JobRequest) -> Result<()> {
    println!("Submitting Task: {}", job.name);

    let channel = Endpoint::from_shared(format!("http://127.0.0.1:{PEER_PORT}"))?
        .connect_timeout(DIAL_TIMEOUT)
        .timeout(JOB_FORWARD_TIMEOUT)
        .connect()
        .await?;
    let mut client = MetricsServiceClient::new(channel);

    println!(">> Submitting Job... (Waiting for execution completion)");
    let ack = client.submit_job(job).await?.into_inner();

    println!(">> Result: {}", ack.msg);
    println!(">> Executed by Node: {}", ack.forwarded_to);
    Ok(())
}
