//! Linux implementations backed by procfs, sysfs, `powerprofilesctl` and `notify-send`.

mod cpu_busy;
mod gpu;
mod load;
mod notify_send;
mod powerprofiles;
mod processes;
mod system;
mod thermal;

pub use cpu_busy::CpuBusySampler;
pub use gpu::{GpuTempSampler, GpuUtilSampler};
pub use load::LoadSampler;
pub use notify_send::NotifySend;
pub use powerprofiles::PowerProfilesCtl;
pub use processes::ForceProcessDetector;
pub use system::SystemSampler;
pub use thermal::CpuTempSampler;

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const PROC_ROOT: &str = "/proc";
const SYS_ROOT: &str = "/sys";

/// Filesystem roots the samplers read from. Tests point these at fixture trees.
#[derive(Debug, Clone)]
pub struct SysRoots {
    pub proc: PathBuf,
    pub sys: PathBuf,
}

impl Default for SysRoots {
    fn default() -> Self {
        Self {
            proc: PathBuf::from(PROC_ROOT),
            sys: PathBuf::from(SYS_ROOT),
        }
    }
}

impl SysRoots {
    pub fn new(proc: impl Into<PathBuf>, sys: impl Into<PathBuf>) -> Self {
        Self {
            proc: proc.into(),
            sys: sys.into(),
        }
    }
}

pub(crate) fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}

pub(crate) fn read_number<T: FromStr>(path: &Path) -> Option<T> {
    read_trimmed(path)?.parse().ok()
}

/// Converts a raw sensor value to whole degrees. Values above 1000 are
/// milli-degrees.
pub(crate) fn to_whole_degrees(raw: i64) -> i32 {
    let degrees = if raw > 1000 { raw / 1000 } else { raw };
    degrees as i32
}

/// Sorted subdirectories of `dir` whose name starts with `prefix`.
pub(crate) fn entries_with_prefix(dir: &Path, prefix: &str) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().starts_with(prefix))
        .map(|e| e.path())
        .collect();
    paths.sort();
    paths
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};

    pub fn temp_dir(name: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!(
            "powershift-platform-{name}-{}-{now}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }

    pub fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture dir");
        }
        fs::write(&path, contents).expect("write fixture");
    }
}
