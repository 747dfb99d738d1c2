//! Diagnostic subcommands: run a single producer and print its stream,
//! or aggregate all producers and push to one collector.

use std::time::Duration;

use tonic::transport::Endpoint;

use crate::config::PEER_PORT;
use crate::error::Result;
use crate::proto::metrics_service_client::MetricsServiceClient;
use crate::telemetry::cpu::{self, ProcStatSource};
use crate::telemetry::mem::{self, SysMemorySource};
use crate::telemetry::thermal::{self, SysfsThermalSource};
use crate::telemetry::{LocalSnapshot, TempStatus};

/// Deadline for each aggregator push to its collector.
const SINK_PUSH_TIMEOUT: Duration = Duration::from_millis(500);

pub async fn cpu_watch() -> Result<()> {
    let (mut rx, handle) = cpu::spawn_producer(
        ProcStatSource::new()?,
        cpu::SAMPLE_INTERVAL,
        cpu::detect_cores(),
    )?;
    println!("Collecting CPU... CTRL+C to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Some(v) = rx.recv() => println!("CPU: {v:.2}%"),
        }
    }
    handle.cleanup();
    Ok(())
}

pub async fn mem_watch() -> Result<()> {
    let (mut rx, handle) = mem::spawn_producer(SysMemorySource::new(), mem::SAMPLE_INTERVAL)?;
    println!("Collecting MEMORY usage... CTRL+C to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Some(v) = rx.recv() => println!("MEM Saturation: {v:.2}%"),
        }
    }
    handle.cleanup();
    Ok(())
}

pub async fn temp_watch() -> Result<()> {
    let (mut rx, handle) =
        thermal::spawn_producer(SysfsThermalSource::new(), thermal::SAMPLE_INTERVAL)?;
    println!("Collecting Thermal... CTRL+C to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Some(r) = rx.recv() => {
                if r.status == TempStatus::Unavailable {
                    println!("TEMP: {}", r.status);
                } else {
                    println!("[{}] {:.1}\u{b0}C ({})", r.zone, r.temp_c, r.status);
                }
            }
        }
    }
    handle.cleanup();
    Ok(())
}

/// Run all producers and push the aggregated snapshot to one collector
/// once per second, printing each aggregate line as it goes.
pub async fn aggregate(target: &str) -> Result<()> {
    let target = if target.contains(':') {
        target.to_string()
    } else {
        format!("{target}:{PEER_PORT}")
    };

    let channel = Endpoint::from_shared(format!("http://{target}"))?
        .timeout(SINK_PUSH_TIMEOUT)
        .connect()
        .await?;
    let mut client = MetricsServiceClient::new(channel);

    let snapshot = std::sync::Arc::new(LocalSnapshot::new());

    let (mut cpu_rx, cpu_handle) = cpu::spawn_producer(
        ProcStatSource::new()?,
        cpu::SAMPLE_INTERVAL,
        cpu::detect_cores(),
    )?;
    let (mut mem_rx, mem_handle) =
        mem::spawn_producer(SysMemorySource::new(), mem::SAMPLE_INTERVAL)?;
    let (mut temp_rx, temp_handle) =
        thermal::spawn_producer(SysfsThermalSource::new(), thermal::SAMPLE_INTERVAL)?;
    let handles = [cpu_handle, mem_handle, temp_handle];

    let cpu_snap = snapshot.clone();
    tokio::spawn(async move {
        while let Some(v) = cpu_rx.recv().await {
            cpu_snap.update_cpu(v);
        }
    });
    let mem_snap = snapshot.clone();
    tokio::spawn(async move {
        while let Some(v) = mem_rx.recv().await {
            mem_snap.update_mem(v);
        }
    });
    let temp_snap = snapshot.clone();
    tokio::spawn(async move {
        while let Some(r) = temp_rx.recv().await {
            temp_snap.update_temp(r);
        }
    });

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    println!("Running aggregator... CTRL+C to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                let s = snapshot.read();
                if let Err(e) = client.push(s.to_proto()).await {
                    tracing::warn!(error = %e, "Push to collector failed");
                }
                println!(
                    "[AGG] CPU={:.2}%  MEM={:.2}%  TEMP={:.1}\u{b0}C ({})  zone={}",
                    s.cpu_percent, s.mem_percent, s.temp_c, s.temp_status, s.zone_name
                );
            }
        }
    }

    for handle in &handles {
        handle.cleanup();
    }
    Ok(())
}
