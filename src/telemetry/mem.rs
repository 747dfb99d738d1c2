use std::time::Duration;

use sysinfo::System;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::ProducerHandle;
use crate::error::{MeshError, Result};

pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Total and available memory, in any consistent unit.
pub trait MemorySource: Send {
    fn sample(&mut self) -> Result<(u64, u64)>;
}

/// Memory source backed by the OS counters (MemTotal / MemAvailable).
pub struct SysMemorySource {
    sys: System,
}

impl SysMemorySource {
    pub fn new() -> Self {
        Self { sys: System::new() }
    }
}

impl MemorySource for SysMemorySource {
    fn sample(&mut self) -> Result<(u64, u64)> {
        self.sys.refresh_memory();
        let total = self.sys.total_memory();
        if total == 0 {
            return Err(MeshError::Telemetry(
                "could not determine total memory".into(),
            ));
        }
        Ok((total, self.sys.available_memory()))
    }
}

/// Saturation % = (total - available) / total * 100.
pub fn saturation_percent(total: u64, available: u64) -> f64 {
    (total.saturating_sub(available)) as f64 / total as f64 * 100.0
}

/// Start the memory producer: one saturation percentage per tick.
pub fn spawn_producer<S>(
    mut source: S,
    interval: Duration,
) -> Result<(mpsc::Receiver<f64>, ProducerHandle)>
where
    S: MemorySource + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    let token = CancellationToken::new();
    let loop_token = token.clone();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = loop_token.cancelled() => break,
                _ = ticker.tick() => {
                    let (total, available) = match source.sample() {
                        Ok(sample) => sample,
                        Err(e) => {
                            tracing::debug!(error = %e, "Memory sample failed, skipping tick");
                            continue;
                        }
                    };
                    if tx.send(saturation_percent(total, available)).await.is_err() {
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
    fn saturation_formula() {
        assert_eq!(saturation_percent(1000, 250), 75.0);
        assert_eq!(saturation_percent(1000, 1000), 0.0);
        assert_eq!(saturation_percent(1000, 0), 100.0);
    }

    #[test]
    fn system_source_reads_real_counters() {
        let mut source = SysMemorySource::new();
        let (total, available) = source.sample().unwrap();
        assert!(total > 0);
        assert!(available <= total);
    }
}
