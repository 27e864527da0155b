use serde::{Deserialize, Serialize};

/// Enter/exit pair for one tier. `exit < enter` is required so a reading
/// between the two never changes the tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band<T> {
    pub enter: T,
    pub exit: T,
}

impl<T: PartialOrd> Band<T> {
    pub fn new(enter: T, exit: T) -> Self {
        Self { enter, exit }
    }

    pub fn is_valid(&self) -> bool {
        self.exit < self.enter
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadThresholds {
    pub balanced: Band<f64>,
    pub performance: Band<f64>,
}

impl Default for LoadThresholds {
    fn default() -> Self {
        Self {
            balanced: Band::new(1.0, 0.5),
            performance: Band::new(4.0, 2.5),
        }
    }
}

/// CPU temperature thresholds in degrees Celsius. When `enabled` is false
/// the sensor is neither sampled nor consulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuTempThresholds {
    pub enabled: bool,
    pub balanced: Band<i32>,
    pub performance: Band<i32>,
}

impl Default for CpuTempThresholds {
    fn default() -> Self {
        Self {
            enabled: true,
            balanced: Band::new(60, 50),
            performance: Band::new(80, 70),
        }
    }
}

/// GPU utilization thresholds in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuUtilThresholds {
    pub enabled: bool,
    pub balanced: Band<u8>,
    pub performance: Band<u8>,
}

impl Default for GpuUtilThresholds {
    fn default() -> Self {
        Self {
            enabled: true,
            balanced: Band::new(30, 15),
            performance: Band::new(60, 40),
        }
    }
}

/// GPU temperature hard trigger. Not subject to hysteresis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuTempTrigger {
    pub enabled: bool,
    pub enter: i32,
    /// How long a driver-queried reading may be reused.
    pub cache_secs: u64,
}

impl Default for GpuTempTrigger {
    fn default() -> Self {
        Self {
            enabled: false,
            enter: 75,
            cache_secs: 10,
        }
    }
}

/// Short-window CPU busy accelerator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpikeConfig {
    pub enabled: bool,
    /// Fraction of the performance-enter load, expressed as busy percent,
    /// at which a burst forces the performance profile.
    pub fraction: f64,
}

impl Default for SpikeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fraction: 0.75,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ThresholdSet {
    pub load: LoadThresholds,
    pub cpu_temp: CpuTempThresholds,
    pub gpu_util: GpuUtilThresholds,
    pub gpu_temp: GpuTempTrigger,
    pub spike: SpikeConfig,
}

impl ThresholdSet {
    /// Checks the strict hysteresis gap of every band.
    pub fn validate(&self) -> Result<(), String> {
        let bands: [(&str, bool); 6] = [
            ("load.balanced", self.load.balanced.is_valid()),
            ("load.performance", self.load.performance.is_valid()),
            ("cpu_temp.balanced", self.cpu_temp.balanced.is_valid()),
            ("cpu_temp.performance", self.cpu_temp.performance.is_valid()),
            ("gpu_util.balanced", self.gpu_util.balanced.is_valid()),
            ("gpu_util.performance", self.gpu_util.performance.is_valid()),
        ];

        for (name, valid) in bands {
            if !valid {
                return Err(format!("{name}: exit must be lower than enter"));
            }
        }

        if self.load.balanced.exit < 0.0 {
            return Err("load.balanced: exit must not be negative".to_string());
        }
        if !(self.spike.fraction > 0.0) {
            return Err("spike.fraction must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Busy percentage at which the spike accelerator fires.
    ///
    /// The performance-enter load spread across `cpu_count` cores, as a
    /// percentage of total capacity, scaled by the spike fraction.
    pub fn spike_trigger_pct(&self, cpu_count: u32) -> u32 {
        let per_core_pct = 100.0 / f64::from(cpu_count.max(1));
        let trigger = self.load.performance.enter * per_core_pct * self.spike.fraction;
        // Small hosts would otherwise need more than 100% busy.
        trigger.round().clamp(1.0, 100.0) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_hold_hysteresis_gap() {
        assert!(ThresholdSet::default().validate().is_ok());
    }

    #[test]
    fn test_equal_enter_exit_is_invalid() {
        let mut thresholds = ThresholdSet::default();
        thresholds.load.performance = Band::new(3.0, 3.0);
        let err = thresholds.validate().unwrap_err();
        assert!(err.contains("load.performance"));
    }

    #[test]
    fn test_every_band_is_checked() {
        let mut thresholds = ThresholdSet::default();
        thresholds.gpu_util.performance = Band::new(40, 60);
        assert!(thresholds.validate().unwrap_err().contains("gpu_util.performance"));

        let mut thresholds = ThresholdSet::default();
        thresholds.cpu_temp.balanced = Band::new(50, 55);
        assert!(thresholds.validate().unwrap_err().contains("cpu_temp.balanced"));
    }

    #[test]
    fn test_disabled_signal_still_validated() {
        let mut thresholds = ThresholdSet::default();
        thresholds.cpu_temp.enabled = false;
        thresholds.cpu_temp.performance = Band::new(70, 80);
        assert!(thresholds.validate().is_err());
    }

    #[test]
    fn test_spike_fraction_must_be_positive() {
        let mut thresholds = ThresholdSet::default();
        thresholds.spike.fraction = 0.0;
        assert!(thresholds.validate().is_err());
    }

    #[test]
    fn test_spike_trigger_pct() {
        let thresholds = ThresholdSet::default();
        // 4.0 load on 8 cores is 50% capacity, 75% of that is 37.5
        assert_eq!(thresholds.spike_trigger_pct(8), 38);
        assert_eq!(thresholds.spike_trigger_pct(16), 19);
        // More load than cores caps at a fully busy machine
        assert_eq!(thresholds.spike_trigger_pct(2), 100);
        assert_eq!(thresholds.spike_trigger_pct(1), 100);
        assert_eq!(thresholds.spike_trigger_pct(0), thresholds.spike_trigger_pct(1));
    }
}
