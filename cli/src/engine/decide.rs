//! Hysteresis state machine mapping (current profile, metrics) to a target.

use powershift_protocol::{DecisionReason, MetricSnapshot, ProfileName};

use super::thresholds::ThresholdSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub target: ProfileName,
    pub reason: DecisionReason,
}

impl Decision {
    fn new(target: ProfileName, reason: DecisionReason) -> Self {
        Self { target, reason }
    }
}

/// A pinned profile wins over every metric.
pub fn decide_pinned(
    pinned: Option<ProfileName>,
    current: ProfileName,
    snapshot: &MetricSnapshot,
    thresholds: &ThresholdSet,
) -> Decision {
    match pinned {
        Some(profile) => Decision::new(profile, DecisionReason::Override),
        None => decide(current, snapshot, thresholds),
    }
}

/// Picks the target profile for this tick.
///
/// Fast paths first (GPU thermal trigger, forced process, CPU burst), then
/// tier-specific hysteresis keyed by `current`. Overrides are handled by
/// [`decide_pinned`].
pub fn decide(current: ProfileName, snapshot: &MetricSnapshot, thresholds: &ThresholdSet) -> Decision {
    if gpu_thermal_trigger(snapshot, thresholds) {
        return Decision::new(ProfileName::Performance, DecisionReason::GpuThermal);
    }
    if snapshot.force_process {
        return Decision::new(ProfileName::Performance, DecisionReason::ForcedProcess);
    }
    if spike_trigger(snapshot, thresholds) {
        return Decision::new(ProfileName::Performance, DecisionReason::Spike);
    }

    let signals = Signals::new(snapshot, thresholds);
    let target = match current {
        ProfileName::Performance => {
            if !signals.calm_below(Tier::Performance) {
                ProfileName::Performance
            } else if signals.calm_below(Tier::Balanced) {
                ProfileName::PowerSaver
            } else {
                ProfileName::Balanced
            }
        }
        ProfileName::Balanced => {
            if signals.busy_above(Tier::Performance) {
                ProfileName::Performance
            } else if signals.calm_below(Tier::Balanced) {
                ProfileName::PowerSaver
            } else {
                ProfileName::Balanced
            }
        }
        ProfileName::PowerSaver => {
            if signals.busy_above(Tier::Performance) {
                ProfileName::Performance
            } else if signals.busy_above(Tier::Balanced) {
                ProfileName::Balanced
            } else {
                ProfileName::PowerSaver
            }
        }
    };

    Decision::new(target, DecisionReason::Hysteresis)
}

fn gpu_thermal_trigger(snapshot: &MetricSnapshot, thresholds: &ThresholdSet) -> bool {
    thresholds.gpu_temp.enabled
        && snapshot
            .gpu_temp_c
            .is_some_and(|temp| temp >= thresholds.gpu_temp.enter)
}

fn spike_trigger(snapshot: &MetricSnapshot, thresholds: &ThresholdSet) -> bool {
    if !thresholds.spike.enabled {
        return false;
    }
    let Some(busy) = snapshot.short_busy_pct else {
        return false;
    };
    u32::from(busy) >= thresholds.spike_trigger_pct(snapshot.cpu_count)
}

#[derive(Debug, Clone, Copy)]
enum Tier {
    Balanced,
    Performance,
}

/// Metric readings with awareness applied: a disabled or unavailable signal
/// is `None`.
struct Signals<'a> {
    load1: f64,
    cpu_temp: Option<i32>,
    gpu_util: Option<u8>,
    thresholds: &'a ThresholdSet,
}

impl<'a> Signals<'a> {
    fn new(snapshot: &MetricSnapshot, thresholds: &'a ThresholdSet) -> Self {
        Self {
            load1: snapshot.load1,
            cpu_temp: snapshot.cpu_temp_c.filter(|_| thresholds.cpu_temp.enabled),
            gpu_util: snapshot.gpu_util_pct.filter(|_| thresholds.gpu_util.enabled),
            thresholds,
        }
    }

    /// Any signal at or above the tier's enter value. Unavailable signals
    /// never trigger.
    fn busy_above(&self, tier: Tier) -> bool {
        let t = self.thresholds;
        let (load, temp, util) = match tier {
            Tier::Balanced => (t.load.balanced, t.cpu_temp.balanced, t.gpu_util.balanced),
            Tier::Performance => (
                t.load.performance,
                t.cpu_temp.performance,
                t.gpu_util.performance,
            ),
        };

        self.load1 >= load.enter
            || self.cpu_temp.is_some_and(|c| c >= temp.enter)
            || self.gpu_util.is_some_and(|g| g >= util.enter)
    }

    /// Every signal below the tier's exit value. Unavailable signals always
    /// qualify.
    fn calm_below(&self, tier: Tier) -> bool {
        let t = self.thresholds;
        let (load, temp, util) = match tier {
            Tier::Balanced => (t.load.balanced, t.cpu_temp.balanced, t.gpu_util.balanced),
            Tier::Performance => (
                t.load.performance,
                t.cpu_temp.performance,
                t.gpu_util.performance,
            ),
        };

        self.load1 < load.exit
            && self.cpu_temp.map_or(true, |c| c < temp.exit)
            && self.gpu_util.map_or(true, |g| g < util.exit)
    }
}
