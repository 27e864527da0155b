use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, trace};

use super::{entries_with_prefix, read_number, read_trimmed, to_whole_degrees, SysRoots};
use crate::command::{run_with_timeout, DEFAULT_COMMAND_TIMEOUT};
use crate::persist::write_atomic;

const NVIDIA_SMI: &str = "nvidia-smi";

/// hwmon driver names that expose a GPU temperature directly.
const GPU_HWMON_NAMES: &[&str] = &["amdgpu", "radeon", "nouveau", "i915", "xe"];

/// `nvidia-smi` wrapper returning one value per GPU.
#[derive(Debug, Clone)]
struct NvidiaSmi {
    timeout: Duration,
}

impl NvidiaSmi {
    fn detect(timeout: Duration) -> Option<Self> {
        which::which(NVIDIA_SMI).ok().map(|_| Self { timeout })
    }

    fn query_max(&self, field: &str) -> Option<i64> {
        let query = format!("--query-gpu={field}");
        let output = run_with_timeout(
            NVIDIA_SMI,
            &[&query, "--format=csv,noheader,nounits"],
            self.timeout,
        )
        .map_err(|e| debug!(error = %e, field, "nvidia-smi query failed"))
        .ok()?;

        if !output.success() {
            trace!(stderr = %output.stderr.trim(), "nvidia-smi returned failure");
            return None;
        }
        parse_max_csv(&output.stdout)
    }
}

fn parse_max_csv(stdout: &str) -> Option<i64> {
    stdout
        .lines()
        .filter_map(|line| line.trim().parse::<f64>().ok())
        .map(|v| v.round() as i64)
        .max()
}

/// Maximum utilization across all discovered GPUs.
///
/// Reads `gpu_busy_percent` from DRM devices (amdgpu, some Intel drivers) and
/// `nvidia-smi` when installed. Backends that are missing contribute nothing.
#[derive(Debug, Clone)]
pub struct GpuUtilSampler {
    drm_dir: PathBuf,
    nvidia: Option<NvidiaSmi>,
}

impl Default for GpuUtilSampler {
    fn default() -> Self {
        Self::new(&SysRoots::default(), DEFAULT_COMMAND_TIMEOUT)
    }
}

impl GpuUtilSampler {
    pub fn new(roots: &SysRoots, timeout: Duration) -> Self {
        Self {
            drm_dir: roots.sys.join("class/drm"),
            nvidia: NvidiaSmi::detect(timeout),
        }
    }

    /// Sysfs backends only.
    pub fn sysfs_only(mut self) -> Self {
        self.nvidia = None;
        self
    }

    pub fn sample(&self) -> Option<u8> {
        let sysfs = self.read_sysfs_busy();
        let nvidia = self
            .nvidia
            .as_ref()
            .and_then(|smi| smi.query_max("utilization.gpu"));

        sysfs
            .into_iter()
            .chain(nvidia)
            .max()
            .map(|v| v.clamp(0, 100) as u8)
    }

    fn read_sysfs_busy(&self) -> Option<i64> {
        entries_with_prefix(&self.drm_dir, "card")
            .into_iter()
            .filter(|card| !card.file_name().is_some_and(|n| n.to_string_lossy().contains('-')))
            .filter_map(|card| read_number::<i64>(&card.join("device/gpu_busy_percent")))
            .max()
    }

    pub fn describe(&self) -> Vec<String> {
        let mut sources: Vec<String> = entries_with_prefix(&self.drm_dir, "card")
            .into_iter()
            .filter(|card| card.join("device/gpu_busy_percent").exists())
            .map(|card| card.display().to_string())
            .collect();
        if self.nvidia.is_some() {
            sources.push(NVIDIA_SMI.to_string());
        }
        sources
    }
}

/// GPU temperature in whole degrees Celsius.
///
/// Always prefers a direct hwmon sensor. Only when none reports a value does
/// it fall back to the driver query, whose result is cached in a small
/// `timestamp value` file to bound polling overhead.
#[derive(Debug, Clone)]
pub struct GpuTempSampler {
    hwmon_dir: PathBuf,
    cache_path: Option<PathBuf>,
    cache_ttl: Duration,
    nvidia: Option<NvidiaSmi>,
}

impl GpuTempSampler {
    pub fn new(
        roots: &SysRoots,
        cache_path: Option<PathBuf>,
        cache_ttl: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            hwmon_dir: roots.sys.join("class/hwmon"),
            cache_path,
            cache_ttl,
            nvidia: NvidiaSmi::detect(timeout),
        }
    }

    pub fn hwmon_only(mut self) -> Self {
        self.nvidia = None;
        self
    }

    pub fn sample(&self) -> Option<i32> {
        self.sample_at(chrono::Utc::now().timestamp())
    }

    pub(crate) fn sample_at(&self, now: i64) -> Option<i32> {
        if let Some(temp) = self.read_hwmon() {
            return Some(temp);
        }
        if let Some(temp) = self.read_cache(now) {
            trace!(temp, "GPU temperature from cache");
            return Some(temp);
        }

        let temp = self
            .nvidia
            .as_ref()
            .and_then(|smi| smi.query_max("temperature.gpu"))
            .map(to_whole_degrees)?;
        self.write_cache(now, temp);
        Some(temp)
    }

    fn read_hwmon(&self) -> Option<i32> {
        entries_with_prefix(&self.hwmon_dir, "hwmon")
            .into_iter()
            .filter(|dir| {
                read_trimmed(&dir.join("name"))
                    .is_some_and(|name| GPU_HWMON_NAMES.contains(&name.to_lowercase().as_str()))
            })
            .filter_map(|dir| read_number::<i64>(&dir.join("temp1_input")))
            .filter(|raw| *raw > 0)
            .map(to_whole_degrees)
            .max()
    }

    fn read_cache(&self, now: i64) -> Option<i32> {
        let path = self.cache_path.as_ref()?;
        let (stamp, value) = parse_cache(&read_trimmed(path)?)?;
        let age = now - stamp;
        if age >= 0 && (age as u64) < self.cache_ttl.as_secs() {
            Some(value)
        } else {
            None
        }
    }

    fn write_cache(&self, now: i64, temp: i32) {
        let Some(path) = &self.cache_path else {
            return;
        };
        if let Err(e) = write_atomic(path, &format!("{now} {temp}")) {
            debug!(error = %e, path = ?path, "Failed to write GPU temperature cache");
        }
    }

    pub fn describe(&self) -> Vec<String> {
        let mut sources: Vec<String> = entries_with_prefix(&self.hwmon_dir, "hwmon")
            .into_iter()
            .filter_map(|dir| {
                let name = read_trimmed(&dir.join("name"))?;
                GPU_HWMON_NAMES
                    .contains(&name.as_str())
                    .then(|| format!("{} ({name})", dir.display()))
            })
            .collect();
        if self.nvidia.is_some() {
            sources.push(format!("{NVIDIA_SMI} (cached)"));
        }
        sources
    }
}

fn parse_cache(content: &str) -> Option<(i64, i32)> {
    let mut parts = content.split_whitespace();
    let stamp = parts.next()?.parse().ok()?;
    let value = parts.next()?.parse().ok()?;
    Some((stamp, value))
}
