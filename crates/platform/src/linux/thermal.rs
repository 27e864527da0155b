use std::path::PathBuf;

use sysinfo::Components;

use super::{entries_with_prefix, read_number, read_trimmed, to_whole_degrees, SysRoots};

/// Sensor labels that identify the CPU package, checked in order.
const CPU_SENSOR_LABELS: &[&str] = &["package", "tctl", "tdie", "coretemp", "k10temp", "cpu"];

/// Thermal zone types that belong to the CPU.
const CPU_ZONE_TYPES: &[&str] = &["x86_pkg_temp", "cpu-thermal", "cpu_thermal", "soc_thermal"];

/// CPU temperature in whole degrees Celsius.
///
/// Tries the platform sensor interface first, then the raw thermal-zone files.
#[derive(Debug, Clone)]
pub struct CpuTempSampler {
    thermal_dir: PathBuf,
    use_sensors: bool,
}

impl Default for CpuTempSampler {
    fn default() -> Self {
        Self::new(&SysRoots::default())
    }
}

impl CpuTempSampler {
    pub fn new(roots: &SysRoots) -> Self {
        Self {
            thermal_dir: roots.sys.join("class/thermal"),
            use_sensors: true,
        }
    }

    /// Skip the sensor interface and read thermal zones only.
    pub fn zones_only(mut self) -> Self {
        self.use_sensors = false;
        self
    }

    pub fn sample(&self) -> Option<i32> {
        if self.use_sensors {
            if let Some(temp) = read_sensor_temp() {
                return Some(temp);
            }
        }
        self.read_zone_temp()
    }

    fn read_zone_temp(&self) -> Option<i32> {
        let mut preferred = None;
        let mut hottest: Option<i32> = None;

        for zone in entries_with_prefix(&self.thermal_dir, "thermal_zone") {
            let Some(raw) = read_number::<i64>(&zone.join("temp")) else {
                continue;
            };
            if raw <= 0 {
                continue;
            }
            let temp = to_whole_degrees(raw);
            let zone_type = read_trimmed(&zone.join("type")).unwrap_or_default();

            if preferred.is_none() && CPU_ZONE_TYPES.contains(&zone_type.as_str()) {
                preferred = Some(temp);
            }
            hottest = Some(hottest.map_or(temp, |t| t.max(temp)));
        }

        preferred.or(hottest)
    }

    /// Names of the readable sources, for diagnostics.
    pub fn describe(&self) -> Vec<String> {
        let mut sources = Vec::new();
        if self.use_sensors && read_sensor_temp().is_some() {
            sources.push("sensors".to_string());
        }
        for zone in entries_with_prefix(&self.thermal_dir, "thermal_zone") {
            if let Some(zone_type) = read_trimmed(&zone.join("type")) {
                sources.push(format!("{} ({zone_type})", zone.display()));
            }
        }
        sources
    }
}

fn read_sensor_temp() -> Option<i32> {
    let components = Components::new_with_refreshed_list();

    for pattern in CPU_SENSOR_LABELS {
        let found = components.list().iter().find_map(|component| {
            let label = component.label().to_lowercase();
            if !label.contains(pattern) {
                return None;
            }
            component.temperature().filter(|t| *t > 0.0)
        });
        if let Some(temp) = found {
            return Some(temp.round() as i32);
        }
    }

    None
}
