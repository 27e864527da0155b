use std::path::PathBuf;

use super::{read_trimmed, SysRoots};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CpuTimes {
    idle: u64,
    total: u64,
}

impl CpuTimes {
    /// Busy percentage since `previous`, rounded to the nearest integer.
    fn busy_since(&self, previous: CpuTimes) -> u8 {
        let total_delta = self.total.saturating_sub(previous.total);
        if total_delta == 0 {
            return 0;
        }
        let idle_delta = self.idle.saturating_sub(previous.idle).min(total_delta);
        let busy = (total_delta - idle_delta) as f64 / total_delta as f64 * 100.0;
        busy.round().clamp(0.0, 100.0) as u8
    }
}

/// Short-window CPU busy percentage from the aggregate `/proc/stat` line.
///
/// Holds the previous sample between calls. The first call has nothing to
/// compare against and reports `None` (warming up).
#[derive(Debug, Clone)]
pub struct CpuBusySampler {
    stat_path: PathBuf,
    previous: Option<CpuTimes>,
}

impl Default for CpuBusySampler {
    fn default() -> Self {
        Self::new(&SysRoots::default())
    }
}

impl CpuBusySampler {
    pub fn new(roots: &SysRoots) -> Self {
        Self {
            stat_path: roots.proc.join("stat"),
            previous: None,
        }
    }

    pub fn sample(&mut self) -> Option<u8> {
        let current = read_trimmed(&self.stat_path).and_then(|s| parse_cpu_line(&s))?;
        let busy = self.previous.map(|previous| current.busy_since(previous));
        self.previous = Some(current);
        busy
    }

    pub fn is_warmed_up(&self) -> bool {
        self.previous.is_some()
    }
}

fn parse_cpu_line(stat: &str) -> Option<CpuTimes> {
    let line = stat.lines().next()?;
    let rest = line.strip_prefix("cpu ")?;
    let values: Vec<u64> = rest
        .split_whitespace()
        .filter_map(|s| s.parse().ok())
        .collect();

    if values.len() < 4 {
        return None;
    }

    // user nice system idle iowait irq softirq steal; guest time is already in user.
    let idle = values[3] + values.get(4).copied().unwrap_or(0);
    let total = values.iter().take(8).sum();
    Some(CpuTimes { idle, total })
}
