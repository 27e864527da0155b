use std::fmt;

use serde::{Deserialize, Serialize};

use crate::profile::ProfileName;
use crate::version::{MIN_SUPPORTED_VERSION, STATUS_FORMAT_VERSION};

/// Metrics captured once per tick.
///
/// `None` marks a reading that is unavailable or disabled. An unavailable
/// reading never satisfies an enter condition and always satisfies an exit
/// condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub load1: f64,
    /// Short-window CPU busy percentage. `None` while the sampler warms up.
    pub short_busy_pct: Option<u8>,
    pub cpu_temp_c: Option<i32>,
    pub gpu_util_pct: Option<u8>,
    pub gpu_temp_c: Option<i32>,
    #[serde(default)]
    pub force_process: bool,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: u32,
}

fn default_cpu_count() -> u32 {
    1
}

impl Default for MetricSnapshot {
    fn default() -> Self {
        Self {
            load1: 0.0,
            short_busy_pct: None,
            cpu_temp_c: None,
            gpu_util_pct: None,
            gpu_temp_c: None,
            force_process: false,
            cpu_count: default_cpu_count(),
        }
    }
}

/// Why the engine picked a target profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    Override,
    GpuThermal,
    ForcedProcess,
    Spike,
    Hysteresis,
}

impl DecisionReason {
    pub fn label(&self) -> &'static str {
        match self {
            DecisionReason::Override => "manual override",
            DecisionReason::GpuThermal => "GPU temperature",
            DecisionReason::ForcedProcess => "forced process",
            DecisionReason::Spike => "CPU burst",
            DecisionReason::Hysteresis => "load",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub target: ProfileName,
    pub reason: DecisionReason,
}

/// Engine bookkeeping that survives restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersistedState {
    pub last_attempted: Option<ProfileName>,
    pub last_verified: Option<ProfileName>,
    /// Unix seconds of the last emitted notification.
    pub last_notified: Option<i64>,
}

/// Read-only status document written by the daemon every tick and consumed by
/// presentation tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub format_version: u32,
    pub timestamp: i64,
    pub version: String,
    pub pid: u32,
    pub provider_profile: Option<ProfileName>,
    pub override_profile: Option<ProfileName>,
    pub state: PersistedState,
    pub metrics: MetricSnapshot,
    #[serde(default)]
    pub last_decision: Option<DecisionRecord>,
}

impl StatusSnapshot {
    pub fn new(timestamp: i64, metrics: MetricSnapshot) -> Self {
        Self {
            format_version: STATUS_FORMAT_VERSION,
            timestamp,
            version: String::new(),
            pid: std::process::id(),
            provider_profile: None,
            override_profile: None,
            state: PersistedState::default(),
            metrics,
            last_decision: None,
        }
    }

    pub fn is_supported(&self) -> bool {
        (MIN_SUPPORTED_VERSION..=STATUS_FORMAT_VERSION).contains(&self.format_version)
    }

    /// Seconds since the document was written.
    pub fn age_secs(&self, now: i64) -> i64 {
        (now - self.timestamp).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_defaults_are_neutral() {
        let snapshot = MetricSnapshot::default();
        assert_eq!(snapshot.load1, 0.0);
        assert!(snapshot.short_busy_pct.is_none());
        assert!(snapshot.cpu_temp_c.is_none());
        assert!(snapshot.gpu_util_pct.is_none());
        assert!(snapshot.gpu_temp_c.is_none());
        assert!(!snapshot.force_process);
    }

    #[test]
    fn test_status_version_support() {
        let mut status = StatusSnapshot::new(100, MetricSnapshot::default());
        assert!(status.is_supported());
        status.format_version = STATUS_FORMAT_VERSION + 1;
        assert!(!status.is_supported());
        status.format_version = 0;
        assert!(!status.is_supported());
    }

    #[test]
    fn test_status_age_never_negative() {
        let status = StatusSnapshot::new(100, MetricSnapshot::default());
        assert_eq!(status.age_secs(130), 30);
        assert_eq!(status.age_secs(50), 0);
    }

    #[test]
    fn test_reason_labels() {
        assert_eq!(DecisionReason::GpuThermal.to_string(), "GPU temperature");
        assert_eq!(DecisionReason::Spike.label(), "CPU burst");
    }
}
