use std::collections::HashMap;
use std::fs;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::ProducerHandle;
use crate::error::{MeshError, Result};

pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Kernel ticks per second for /proc/<pid>/stat time fields. USER_HZ is
/// 100 on every kernel this runs on.
const CLOCK_TICKS_PER_SEC: u64 = 100;

const NANOS_PER_TICK: u64 = 1_000_000_000 / CLOCK_TICKS_PER_SEC;

/// Cumulative scheduled-runtime counters, one per live process.
///
/// Contract: totals are monotonically non-decreasing per live pid, and a
/// pid stops appearing once its process exits. Implementations may be
/// backed by kernel probes, /proc, or synthetic test data.
pub trait CpuCounterSource: Send {
    /// Total runtime in nanoseconds for every live pid.
    fn totals(&mut self) -> Result<Vec<(u32, u64)>>;
}

/// Counter source backed by /proc/<pid>/stat (utime + stime).
pub struct ProcStatSource;

impl ProcStatSource {
    pub fn new() -> Result<Self> {
        fs::read_dir("/proc").map_err(|e| MeshError::Init(format!("cannot read /proc: {e}")))?;
        Ok(Self)
    }
}

impl CpuCounterSource for ProcStatSource {
    fn totals(&mut self) -> Result<Vec<(u32, u64)>> {
        let mut totals = Vec::new();
        for entry in fs::read_dir("/proc")? {
            let entry = entry?;
            let Ok(pid) = entry.file_name().to_string_lossy().parse::<u32>() else {
                continue;
            };
            // Processes can exit between the directory walk and the read.
            let Ok(stat) = fs::read_to_string(entry.path().join("stat")) else {
                continue;
            };
            if let Some(ns) = parse_runtime_ns(&stat) {
                totals.push((pid, ns));
            }
        }
        Ok(totals)
    }
}

/// Extract utime + stime from a /proc/<pid>/stat line, scaled to
/// nanoseconds. The comm field may contain spaces, so fields are counted
/// from the closing paren.
fn parse_runtime_ns(stat: &str) -> Option<u64> {
    let (_, rest) = stat.rsplit_once(')')?;
    let mut fields = rest.split_whitespace();
    // utime and stime are fields 14 and 15 of the full line; after the
    // comm field that is offsets 11 and 12.
    let utime: u64 = fields.nth(11)?.parse().ok()?;
    let stime: u64 = fields.next()?.parse().ok()?;
    Some((utime + stime) * NANOS_PER_TICK)
}

/// Per-pid delta tracking between ticks.
///
/// A missing pid contributes no delta and its previous total is dropped;
/// a decreasing total (counter reset) is treated as no progress.
#[derive(Debug, Default)]
pub struct DeltaAccumulator {
    prev: HashMap<u32, u64>,
}

impl DeltaAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one set of cumulative totals in, returning the summed
    /// nanoseconds of runtime consumed since the previous call.
    pub fn advance(&mut self, totals: &[(u32, u64)]) -> u64 {
        let mut next = HashMap::with_capacity(totals.len());
        let mut sum = 0u64;
        for &(pid, ns) in totals {
            let prev = self.prev.get(&pid).copied().unwrap_or(0);
            if ns > prev {
                sum += ns - prev;
            }
            next.insert(pid, ns);
        }
        self.prev = next;
        sum
    }
}

pub fn detect_cores() -> usize {
    let sys = sysinfo::System::new_all();
    let n = sys.cpus().len();
    if n == 0 {
        1
    } else {
        n
    }
}

/// Start the CPU producer: one normalized pressure value per tick.
///
/// The emitted value is `sum_delta / (interval * cores) * 100`, keeping
/// the range [0, 100] regardless of parallelism. The accumulator is
/// primed with one sample up front so the first emission carries delta
/// semantics rather than lifetime totals.
pub fn spawn_producer<S>(
    mut source: S,
    interval: Duration,
    num_cores: usize,
) -> Result<(mpsc::Receiver<f64>, ProducerHandle)>
where
    S: CpuCounterSource + 'static,
{
    let mut acc = DeltaAccumulator::new();
    if let Ok(totals) = source.totals() {
        acc.advance(&totals);
    }

    let scaled_interval_ns = interval.as_nanos() as f64 * num_cores as f64;
    let (tx, rx) = mpsc::channel(1);
    let token = CancellationToken::new();
    let loop_token = token.clone();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        ticker.tick().await; // first tick completes immediately
        loop {
            tokio::select! {
                _ = loop_token.cancelled() => break,
                _ = ticker.tick() => {
                    let totals = match source.totals() {
                        Ok(totals) => totals,
                        Err(e) => {
                            tracing::debug!(error = %e, "CPU sample failed, skipping tick");
                            continue;
                        }
                    };
                    let delta_ns = acc.advance(&totals);
                    let percent = delta_ns as f64 / scaled_interval_ns * 100.0;
                    if tx.send(percent).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    Ok((rx, ProducerHandle::new(token)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulator_sums_per_pid_deltas() {
        let mut acc = DeltaAccumulator::new();
        assert_eq!(acc.advance(&[(1, 100), (2, 50)]), 150);
        assert_eq!(acc.advance(&[(1, 180), (2, 70)]), 100);
    }

    #[test]
    fn accumulator_drops_exited_pids() {
        let mut acc = DeltaAccumulator::new();
        acc.advance(&[(1, 100), (2, 100)]);
        // pid 2 exited; pid 3 is new and contributes its full total.
        assert_eq!(acc.advance(&[(1, 150), (3, 30)]), 80);
        // If pid 2 ever came back, its counter starts from scratch.
        assert_eq!(acc.advance(&[(1, 150), (2, 10), (3, 30)]), 10);
    }

    #[test]
    fn accumulator_ignores_counter_resets() {
        let mut acc = DeltaAccumulator::new();
        acc.advance(&[(1, 500)]);
        assert_eq!(acc.advance(&[(1, 400)]), 0);
        // Next advance measures from the reset value.
        assert_eq!(acc.advance(&[(1, 450)]), 50);
    }

    #[test]
    fn parses_proc_stat_runtime() {
        // Field layout of /proc/<pid>/stat, comm containing spaces and parens.
        let stat = "1234 (tokio runtime (x)) S 1 1234 1234 0 -1 4194560 \
                    100 0 0 0 250 150 0 0 20 0 4 0 100 0 0";
        let ns = parse_runtime_ns(stat).unwrap();
        assert_eq!(ns, (250 + 150) * NANOS_PER_TICK);
    }

    #[test]
    fn rejects_malformed_stat_line() {
        assert!(parse_runtime_ns("garbage with no paren").is_none());
        assert!(parse_runtime_ns("1 (short) S 0 0").is_none());
    }
}
