//! Metric snapshot traits and sampler settings.

use std::path::PathBuf;
use std::time::Duration;

use powershift_protocol::MetricSnapshot;

use crate::command::DEFAULT_COMMAND_TIMEOUT;

/// Produces one metric snapshot per tick.
///
/// Implementations never fail: a source that cannot be read reports its
/// field as unavailable.
pub trait SnapshotSource {
    fn snapshot(&mut self) -> MetricSnapshot;
}

/// Which signals are sampled and how.
///
/// A disabled signal is reported as unavailable without touching its source.
#[derive(Debug, Clone)]
pub struct SamplerSettings {
    pub cpu_temp: bool,
    pub gpu_util: bool,
    pub gpu_temp: bool,
    pub short_busy: bool,
    /// Process names that force the performance profile while running.
    pub force_processes: Vec<String>,
    /// How long a driver-queried GPU temperature stays valid.
    pub gpu_temp_cache_ttl: Duration,
    /// Where the driver-queried GPU temperature is cached between ticks.
    pub gpu_temp_cache_path: Option<PathBuf>,
    pub command_timeout: Duration,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            cpu_temp: true,
            gpu_util: true,
            gpu_temp: false,
            short_busy: true,
            force_processes: Vec::new(),
            gpu_temp_cache_ttl: Duration::from_secs(10),
            gpu_temp_cache_path: None,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }
}
