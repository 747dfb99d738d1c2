//! Workload profiles recognized by the `run` subcommand.
//!
//! High-level workload names map to synthetic stress-ng containers so
//! specific kernel subsystems (CPU vs VM) can be stimulated predictably.

use uuid::Uuid;

use crate::proto;

const STRESS_IMAGE: &str = "alexeiled/stress-ng";

pub const AVAILABLE: &str = "IMG_RESIZE, DATA_ETL, MATRIX_OPS";

/// Build a job request for a named workload profile, with a fresh id.
/// Returns `None` for unknown names.
pub fn job_request(kind: &str) -> Option<proto::JobRequest> {
    let (req_cpu, req_mem, args): (f64, f64, &[&str]) = match kind {
        // Image resizing: high CPU, low memory footprint.
        "IMG_RESIZE" => (70.0, 10.0, &["--cpu", "2", "--timeout", "30s"]),
        // Extract-transform-load: large buffer allocation, moderate CPU.
        "DATA_ETL" => (10.0, 30.0, &["--vm", "2", "--vm-bytes", "128M", "--timeout", "30s"]),
        // Dense matrix math: floating point and cache pressure.
        "MATRIX_OPS" => (40.0, 15.0, &["--matrix", "1", "--timeout", "30s"]),
        _ => return None,
    };

    Some(proto::JobRequest {
        id: Uuid::new_v4().to_string(),
        name: kind.to_string(),
        image: STRESS_IMAGE.to_string(),
        args: args.iter().map(|s| s.to_string()).collect(),
        req_cpu,
        req_mem,
    })
}
