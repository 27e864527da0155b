use powershift_protocol::MetricSnapshot;
use tracing::trace;

use super::{
    CpuBusySampler, CpuTempSampler, ForceProcessDetector, GpuTempSampler, GpuUtilSampler,
    LoadSampler, SysRoots,
};
use crate::sampler::{SamplerSettings, SnapshotSource};

/// All samplers of the running system behind one `SnapshotSource`.
pub struct SystemSampler {
    settings: SamplerSettings,
    load: LoadSampler,
    busy: CpuBusySampler,
    cpu_temp: CpuTempSampler,
    gpu_util: GpuUtilSampler,
    gpu_temp: GpuTempSampler,
    force: ForceProcessDetector,
}

impl SystemSampler {
    pub fn new(settings: SamplerSettings) -> Self {
        Self::with_roots(settings, &SysRoots::default())
    }

    pub fn with_roots(settings: SamplerSettings, roots: &SysRoots) -> Self {
        Self {
            load: LoadSampler::new(roots),
            busy: CpuBusySampler::new(roots),
            cpu_temp: CpuTempSampler::new(roots),
            gpu_util: GpuUtilSampler::new(roots, settings.command_timeout),
            gpu_temp: GpuTempSampler::new(
                roots,
                settings.gpu_temp_cache_path.clone(),
                settings.gpu_temp_cache_ttl,
                settings.command_timeout,
            ),
            force: ForceProcessDetector::new(&settings.force_processes),
            settings,
        }
    }

    /// Readable backends per signal, for diagnostics.
    pub fn describe(&self) -> Vec<(&'static str, Vec<String>)> {
        vec![
            ("cpu temperature", self.cpu_temp.describe()),
            ("gpu utilization", self.gpu_util.describe()),
            ("gpu temperature", self.gpu_temp.describe()),
        ]
    }
}

impl SnapshotSource for SystemSampler {
    fn snapshot(&mut self) -> MetricSnapshot {
        let snapshot = MetricSnapshot {
            load1: self.load.load1(),
            short_busy_pct: if self.settings.short_busy {
                self.busy.sample()
            } else {
                None
            },
            cpu_temp_c: self
                .settings
                .cpu_temp
                .then(|| self.cpu_temp.sample())
                .flatten(),
            gpu_util_pct: self
                .settings
                .gpu_util
                .then(|| self.gpu_util.sample())
                .flatten(),
            gpu_temp_c: self
                .settings
                .gpu_temp
                .then(|| self.gpu_temp.sample())
                .flatten(),
            force_process: self.force.detect(),
            cpu_count: self.load.cpu_count(),
        };

        trace!(?snapshot, "Sampled metrics");
        snapshot
    }
}
