//! Telemetry pipeline: kernel counters in, normalized pressure values out.
//!
//! Each producer is a factory returning a lazy stream of per-tick values
//! plus a [`ProducerHandle`] that releases the underlying source. Values
//! carry delta semantics: they describe the interval just elapsed, never
//! cumulative counters. Dropped ticks are allowed under transient read
//! failures; the producer retries on the next tick.

pub mod cpu;
pub mod mem;
pub mod snapshot;
pub mod thermal;

use tokio_util::sync::CancellationToken;

pub use snapshot::{LocalSnapshot, Metrics, TempReading, TempStatus};

/// Scoped cleanup for a running producer. Cancelling stops the ticker
/// loop, which drops the sender and closes the stream. Idempotent.
#[derive(Debug, Clone)]
pub struct ProducerHandle {
    token: CancellationToken,
}

impl ProducerHandle {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    pub fn cleanup(&self) {
        self.token.cancel();
    }
}
