use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{ProducerHandle, TempReading, TempStatus};
use crate::error::{MeshError, Result};

pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Thermal safety thresholds in degrees Celsius. Classification is
/// producer-side policy, not part of the sensor source.
pub const HOT_THRESHOLD_C: f64 = 80.0;
pub const WARM_THRESHOLD_C: f64 = 60.0;

/// One raw observation of the tracked thermal zone.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneSample {
    pub zone: String,
    pub millicelsius: i64,
}

/// Source of raw zone temperatures.
///
/// `Ok(None)` means no zone has been observed (missing sensor); `Err`
/// means a transient read failure and the tick is skipped.
pub trait ThermalSource: Send {
    fn sample(&mut self) -> Result<Option<ZoneSample>>;
}

/// Zone types considered the primary thermal signal, most specific
/// first. Anything else (wifi, ACPI aggregates, battery) does not
/// predict compute throttling.
const PREFERRED_ZONE_TYPES: &[&str] = &["x86_pkg_temp", "cpu-thermal", "cpu_thermal", "soc_thermal"];

/// Thermal source backed by /sys/class/thermal.
///
/// The primary zone is chosen once at construction; a host without any
/// thermal zone yields `Ok(None)` forever rather than failing init.
pub struct SysfsThermalSource {
    zone_name: String,
    temp_path: Option<PathBuf>,
}

impl SysfsThermalSource {
    pub fn new() -> Self {
        Self::from_dir("/sys/class/thermal")
    }

    fn from_dir(dir: &str) -> Self {
        let mut fallback: Option<(String, PathBuf)> = None;
        let mut best: Option<(usize, String, PathBuf)> = None;

        let Ok(entries) = fs::read_dir(dir) else {
            return Self {
                zone_name: String::new(),
                temp_path: None,
            };
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !entry.file_name().to_string_lossy().starts_with("thermal_zone") {
                continue;
            }
            let Ok(zone_type) = fs::read_to_string(path.join("type")) else {
                continue;
            };
            let zone_type = zone_type.trim().to_string();
            let temp_path = path.join("temp");

            match PREFERRED_ZONE_TYPES.iter().position(|t| *t == zone_type) {
                Some(rank) if best.as_ref().map_or(true, |(r, _, _)| rank < *r) => {
                    best = Some((rank, zone_type, temp_path));
                }
                Some(_) => {}
                None => {
                    if fallback.is_none() {
                        fallback = Some((zone_type, temp_path));
                    }
                }
            }
        }

        let chosen = best.map(|(_, name, path)| (name, path)).or(fallback);
        match chosen {
            Some((zone_name, temp_path)) => {
                tracing::info!(zone = %zone_name, "Tracking thermal zone");
                Self {
                    zone_name,
                    temp_path: Some(temp_path),
                }
            }
            None => {
                tracing::info!("No thermal zone found, reporting temperature unavailable");
                Self {
                    zone_name: String::new(),
                    temp_path: None,
                }
            }
        }
    }
}

impl ThermalSource for SysfsThermalSource {
    fn sample(&mut self) -> Result<Option<ZoneSample>> {
        let Some(path) = &self.temp_path else {
            return Ok(None);
        };
        let raw = fs::read_to_string(path)?;
        let millicelsius: i64 = raw
            .trim()
            .parse()
            .map_err(|e| MeshError::Telemetry(format!("bad reading {raw:?}: {e}")))?;
        Ok(Some(ZoneSample {
            zone: self.zone_name.clone(),
            millicelsius,
        }))
    }
}

/// Classify a temperature against the fixed safety thresholds.
pub fn classify(temp_c: f64) -> TempStatus {
    if temp_c > HOT_THRESHOLD_C {
        TempStatus::Hot
    } else if temp_c > WARM_THRESHOLD_C {
        TempStatus::Warm
    } else {
        TempStatus::Safe
    }
}

/// Start the thermal producer: one [`TempReading`] per tick.
pub fn spawn_producer<S>(
    mut source: S,
    interval: Duration,
) -> Result<(mpsc::Receiver<TempReading>, ProducerHandle)>
where
    S: ThermalSource + 'static,
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
                    let reading = match source.sample() {
                        Ok(Some(sample)) => {
                            let temp_c = sample.millicelsius as f64 / 1000.0;
                            TempReading {
                                temp_c,
                                status: classify(temp_c),
                                zone: sample.zone,
                            }
                        }
                        Ok(None) => TempReading::unavailable(),
                        Err(e) => {
                            tracing::debug!(error = %e, "Thermal sample failed, skipping tick");
                            continue;
                        }
                    };
                    if tx.send(reading).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    Ok((rx, ProducerHandle::new(token)))
}
