use std::path::PathBuf;

use sysinfo::System;

use super::{read_trimmed, SysRoots};

/// 1-minute load average and logical CPU count.
#[derive(Debug, Clone)]
pub struct LoadSampler {
    loadavg_path: PathBuf,
}

impl Default for LoadSampler {
    fn default() -> Self {
        Self::new(&SysRoots::default())
    }
}

impl LoadSampler {
    pub fn new(roots: &SysRoots) -> Self {
        Self {
            loadavg_path: roots.proc.join("loadavg"),
        }
    }

    /// Reads `loadavg` first and falls back to sysinfo. Never negative.
    pub fn load1(&self) -> f64 {
        read_trimmed(&self.loadavg_path)
            .and_then(|content| parse_load1(&content))
            .unwrap_or_else(|| System::load_average().one)
            .max(0.0)
    }

    pub fn cpu_count(&self) -> u32 {
        std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(1)
    }
}

fn parse_load1(content: &str) -> Option<f64> {
    content.split_whitespace().next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linux::testutil;

    #[test]
    fn test_parse_load1() {
        assert_eq!(parse_load1("0.52 0.58 0.59 1/389 12345"), Some(0.52));
        assert_eq!(parse_load1(""), None);
        assert_eq!(parse_load1("garbage 1 2"), None);
    }

    #[test]
    fn test_reads_loadavg_file() {
        let root = testutil::temp_dir("load");
        testutil::write(&root, "proc/loadavg", "5.00 3.10 1.20 4/512 999\n");
        let sampler = LoadSampler::new(&SysRoots::new(root.join("proc"), root.join("sys")));

        assert_eq!(sampler.load1(), 5.0);
        assert!(sampler.cpu_count() >= 1);
    }
}
