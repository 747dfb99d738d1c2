use parking_lot::RwLock;

use crate::proto;

/// Hard ceiling applied to CPU values before storing. Kernel accounting
/// can spike past 100% in virtualized or containerized environments;
/// instead of smoothing we clamp.
pub const CPU_CLAMP: f64 = 95.0;

/// Thermal classification of the tracked zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TempStatus {
    Safe,
    Warm,
    Hot,
    /// No sensor observation yet. Encodes as the empty string on the
    /// wire, which the scheduler treats as thermally safe.
    #[default]
    Unavailable,
}

impl TempStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TempStatus::Safe => "SAFE",
            TempStatus::Warm => "WARM",
            TempStatus::Hot => "HOT",
            TempStatus::Unavailable => "",
        }
    }
}

impl std::fmt::Display for TempStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TempStatus::Unavailable => write!(f, "UNAVAILABLE"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// One emission of the thermal producer.
#[derive(Debug, Clone, PartialEq)]
pub struct TempReading {
    pub temp_c: f64,
    pub status: TempStatus,
    pub zone: String,
}

impl TempReading {
    pub fn unavailable() -> Self {
        Self {
            temp_c: 0.0,
            status: TempStatus::Unavailable,
            zone: String::new(),
        }
    }
}

/// By-value copy of the local metrics, as handed to gossip and display.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metrics {
    pub cpu_percent: f64,
    pub mem_percent: f64,
    pub temp_c: f64,
    pub temp_status: TempStatus,
    pub zone_name: String,
}

impl Metrics {
    pub fn to_proto(&self) -> proto::MetricsSnapshot {
        proto::MetricsSnapshot {
            cpu: self.cpu_percent,
            mem: self.mem_percent,
            temp_c: self.temp_c,
            temp_status: self.temp_status.as_str().to_string(),
            zone: self.zone_name.clone(),
        }
    }
}

/// Latest values from all local producers, shared between the consumer
/// tasks (writers) and the gossip/display loop (reader).
///
/// The lock is held only to copy plain fields; readers never observe a
/// half-written update and no critical section spans an await point.
#[derive(Debug, Default)]
pub struct LocalSnapshot {
    inner: RwLock<Metrics>,
}

impl LocalSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a CPU pressure value, clamped to [`CPU_CLAMP`].
    pub fn update_cpu(&self, v: f64) {
        let v = if v > CPU_CLAMP { CPU_CLAMP } else { v };
        self.inner.write().cpu_percent = v;
    }

    pub fn update_mem(&self, v: f64) {
        self.inner.write().mem_percent = v;
    }

    pub fn update_temp(&self, r: TempReading) {
        let mut inner = self.inner.write();
        inner.temp_c = r.temp_c;
        inner.temp_status = r.status;
        inner.zone_name = r.zone;
    }

    /// Return a copy so callers can iterate without holding the lock.
    pub fn read(&self) -> Metrics {
        self.inner.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_values_are_clamped() {
        let snap = LocalSnapshot::new();
        snap.update_cpu(142.7);
        assert_eq!(snap.read().cpu_percent, CPU_CLAMP);

        snap.update_cpu(95.0);
        assert_eq!(snap.read().cpu_percent, 95.0);

        snap.update_cpu(12.5);
        assert_eq!(snap.read().cpu_percent, 12.5);
    }

    #[test]
    fn read_returns_consistent_copy() {
        let snap = LocalSnapshot::new();
        snap.update_cpu(10.0);
        snap.update_mem(20.0);
        snap.update_temp(TempReading {
            temp_c: 51.0,
            status: TempStatus::Safe,
            zone: "x86_pkg_temp".to_string(),
        });

        let copy = snap.read();
        assert_eq!(copy.cpu_percent, 10.0);
        assert_eq!(copy.mem_percent, 20.0);
        assert_eq!(copy.temp_c, 51.0);
        assert_eq!(copy.temp_status, TempStatus::Safe);
        assert_eq!(copy.zone_name, "x86_pkg_temp");

        // Mutating after the copy must not affect it.
        snap.update_cpu(80.0);
        assert_eq!(copy.cpu_percent, 10.0);
    }

    #[test]
    fn unobserved_temp_encodes_as_empty_string() {
        let snap = LocalSnapshot::new();
        let proto = snap.read().to_proto();
        assert_eq!(proto.temp_status, "");
        assert_eq!(proto.zone, "");
        assert_eq!(proto.temp_c, 0.0);
    }
}
