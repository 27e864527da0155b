//! Profile selection: override resolution, hysteresis decision, apply with
//! read-back, and change notifications.

mod apply;
mod decide;
mod notify;
mod overrides;
mod state;
mod thresholds;

pub use apply::{AppliedResult, ApplyController};
pub use decide::{decide_pinned, Decision};
pub use notify::{Notification, NotificationGate, NotifyOutcome};
pub use overrides::OverrideStore;
pub use state::{remove_file, write_atomic, StatePaths, StateStore};
pub use thresholds::ThresholdSet;

#[cfg(test)]
pub(crate) use apply::fake::FakeProvider;
#[cfg(test)]
pub(crate) use notify::fake::FakeNotifier;

use powershift_platform::{Notifier, ProfileProvider, SnapshotSource};
use powershift_protocol::{
    DecisionReason, DecisionRecord, MetricSnapshot, ProfileName, StatusSnapshot,
};
use tracing::{debug, warn};

use crate::config::EngineConfig;

/// Profile assumed for decisions when the provider cannot be read.
pub const FALLBACK_PROFILE: ProfileName = ProfileName::Balanced;

/// Everything one tick observed and did.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub snapshot: MetricSnapshot,
    pub decision: Decision,
    pub applied: AppliedResult,
    /// `None` when nothing changed and no notification was considered.
    pub notified: Option<NotifyOutcome>,
}

impl TickReport {
    pub fn override_profile(&self) -> Option<ProfileName> {
        (self.decision.reason == DecisionReason::Override).then_some(self.decision.target)
    }
}

pub struct Engine<P, S, N> {
    provider: P,
    sampler: S,
    gate: NotificationGate<N>,
    overrides: OverrideStore,
    store: StateStore,
    controller: ApplyController,
    thresholds: ThresholdSet,
}

impl<P, S, N> Engine<P, S, N>
where
    P: ProfileProvider,
    S: SnapshotSource,
    N: Notifier,
{
    pub fn new(config: &EngineConfig, paths: StatePaths, provider: P, sampler: S, notifier: N) -> Self {
        Self {
            provider,
            sampler,
            gate: NotificationGate::new(
                notifier,
                config.notify.enabled,
                std::time::Duration::from_secs(config.notify.cooldown_secs),
            ),
            overrides: OverrideStore::new(paths.override_file()),
            store: StateStore::open(paths),
            controller: ApplyController::new(config.apply.retries, config.apply.retry_delay()),
            thresholds: config.thresholds.clone(),
        }
    }

    /// An override short-circuits all metric evaluation.
    pub fn evaluate(&self, current: ProfileName, snapshot: &MetricSnapshot) -> Decision {
        decide_pinned(self.overrides.resolve(), current, snapshot, &self.thresholds)
    }

    /// Sample, decide, apply, notify and persist, in that order.
    pub fn tick(&mut self, now: i64) -> TickReport {
        let snapshot = self.sampler.snapshot();

        let before = match self.provider.get() {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(error = %e, fallback = %FALLBACK_PROFILE, "Active profile unknown");
                None
            }
        };
        let current = before.unwrap_or(FALLBACK_PROFILE);

        let decision = self.evaluate(current, &snapshot);
        debug!(
            current = %current,
            decided = %decision.target,
            reason = %decision.reason,
            load1 = snapshot.load1,
            "Decided"
        );

        let applied = self
            .controller
            .apply_from(&self.provider, before, decision.target);
        if applied.attempted {
            self.store.record_attempted(decision.target);
        }
        if let Some(actual) = applied.actual {
            self.store.record_verified(actual);
        }

        let notified = match applied.actual {
            Some(actual) if applied.changed => {
                let notification = Notification::profile_changed(actual, decision.reason);
                Some(self.gate.notify(&mut self.store, &notification, now))
            }
            _ => None,
        };

        TickReport {
            snapshot,
            decision,
            applied,
            notified,
        }
    }

    /// Status document for this tick.
    pub fn status(&self, report: &TickReport, now: i64) -> StatusSnapshot {
        let mut status = StatusSnapshot::new(now, report.snapshot.clone());
        status.version = env!("CARGO_PKG_VERSION").to_string();
        status.provider_profile = report.applied.actual;
        status.override_profile = report.override_profile();
        status.state = self.store.state();
        status.last_decision = Some(DecisionRecord {
            target: report.decision.target,
            reason: report.decision.reason,
        });
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::temp_dir;

    struct FixedSnapshot(MetricSnapshot);

    impl SnapshotSource for FixedSnapshot {
        fn snapshot(&mut self) -> MetricSnapshot {
            self.0.clone()
        }
    }

    fn busy() -> MetricSnapshot {
        MetricSnapshot {
            load1: 5.0,
            short_busy_pct: Some(0),
            cpu_count: 8,
            ..MetricSnapshot::default()
        }
    }

    fn calm() -> MetricSnapshot {
        MetricSnapshot {
            load1: 0.1,
            short_busy_pct: Some(1),
            cpu_temp_c: Some(40),
            gpu_util_pct: Some(0),
            gpu_temp_c: Some(35),
            cpu_count: 8,
            ..MetricSnapshot::default()
        }
    }

    fn engine<'a>(
        name: &str,
        config: &EngineConfig,
        provider: &'a FakeProvider,
        snapshot: MetricSnapshot,
        notifier: &'a FakeNotifier,
    ) -> (Engine<&'a FakeProvider, FixedSnapshot, &'a FakeNotifier>, StatePaths) {
        let paths = StatePaths::new(temp_dir(name));
        let engine = Engine::new(
            config,
            paths.clone(),
            provider,
            FixedSnapshot(snapshot),
            notifier,
        );
        (engine, paths)
    }

    #[test]
    fn test_verified_change_notifies_once_per_cooldown() {
        let provider = FakeProvider::new(ProfileName::Balanced);
        let notifier = FakeNotifier::new();
        let (mut engine, _) = engine(
            "engine-notify",
            &EngineConfig::default(),
            &provider,
            busy(),
            &notifier,
        );

        let first = engine.tick(1000);
        assert_eq!(first.decision.target, ProfileName::Performance);
        assert!(first.applied.changed);
        assert_eq!(first.notified, Some(NotifyOutcome::Sent));

        // Someone switches back; the same transition inside the cooldown stays quiet.
        provider.active.set(Some(ProfileName::Balanced));
        let second = engine.tick(1010);
        assert!(second.applied.changed);
        assert_eq!(second.notified, Some(NotifyOutcome::CoolingDown));

        assert_eq!(notifier.count(), 1);
        assert_eq!(
            notifier.sent.borrow()[0].1,
            "Performance mode activated (load)"
        );
    }

    #[test]
    fn test_steady_state_is_quiet() {
        let provider = FakeProvider::new(ProfileName::Performance);
        let notifier = FakeNotifier::new();
        let (mut engine, _) = engine(
            "engine-steady",
            &EngineConfig::default(),
            &provider,
            busy(),
            &notifier,
        );

        for now in 0..5 {
            let report = engine.tick(now * 100);
            assert!(!report.applied.attempted);
            assert!(report.notified.is_none());
        }
        assert_eq!(provider.set_calls.get(), 0);
        assert_eq!(notifier.count(), 0);
    }

    #[test]
    fn test_decision_without_effect_does_not_notify() {
        let provider = FakeProvider::new(ProfileName::Balanced);
        provider.honors_set.set(false);
        let notifier = FakeNotifier::new();
        let (mut engine, paths) = engine(
            "engine-no-effect",
            &EngineConfig::default(),
            &provider,
            busy(),
            &notifier,
        );

        let report = engine.tick(1000);
        assert!(report.applied.attempted);
        assert!(report.notified.is_none());
        assert_eq!(notifier.count(), 0);

        let state = StateStore::read(&paths);
        assert_eq!(state.last_attempted, Some(ProfileName::Performance));
        assert_eq!(state.last_verified, Some(ProfileName::Balanced));
    }

    #[test]
    fn test_override_beats_gpu_trigger() {
        let mut config = EngineConfig::default();
        config.thresholds.gpu_temp.enabled = true;
        config.thresholds.gpu_temp.enter = 37;

        let provider = FakeProvider::new(ProfileName::Balanced);
        let notifier = FakeNotifier::new();
        let snapshot = MetricSnapshot {
            gpu_temp_c: Some(95),
            short_busy_pct: Some(100),
            force_process: true,
            ..busy()
        };
        let (mut engine, paths) = engine("engine-override", &config, &provider, snapshot, &notifier);
        OverrideStore::new(paths.override_file())
            .pin(ProfileName::PowerSaver)
            .unwrap();

        let report = engine.tick(1000);
        assert_eq!(report.decision.target, ProfileName::PowerSaver);
        assert_eq!(report.decision.reason, DecisionReason::Override);
        assert_eq!(report.override_profile(), Some(ProfileName::PowerSaver));
        assert_eq!(provider.active.get(), Some(ProfileName::PowerSaver));
    }

    #[test]
    fn test_garbage_override_falls_through_to_metrics() {
        let provider = FakeProvider::new(ProfileName::Performance);
        let notifier = FakeNotifier::new();
        let (mut engine, paths) = engine(
            "engine-garbage",
            &EngineConfig::default(),
            &provider,
            calm(),
            &notifier,
        );
        std::fs::write(paths.override_file(), "banana\n").unwrap();

        let report = engine.tick(1000);
        assert_eq!(report.decision.reason, DecisionReason::Hysteresis);
        assert_eq!(report.decision.target, ProfileName::PowerSaver);
        assert!(!paths.override_file().exists());
    }

    #[test]
    fn test_unreadable_provider_decides_from_balanced() {
        let provider = FakeProvider::unreadable();
        let notifier = FakeNotifier::new();
        let middling = MetricSnapshot {
            load1: 0.7,
            ..calm()
        };
        let (engine, _) = engine(
            "engine-unknown",
            &EngineConfig::default(),
            &provider,
            middling.clone(),
            &notifier,
        );

        // Between balanced exit and enter: holds the assumed tier
        let decision = engine.evaluate(FALLBACK_PROFILE, &middling);
        assert_eq!(decision.target, ProfileName::Balanced);
    }

    #[test]
    fn test_unreadable_provider_tick_completes() {
        let provider = FakeProvider::unreadable();
        provider.honors_set.set(false);
        let notifier = FakeNotifier::new();
        let (mut engine, _) = engine(
            "engine-unreadable",
            &EngineConfig::default(),
            &provider,
            busy(),
            &notifier,
        );

        let report = engine.tick(1000);
        assert_eq!(report.decision.target, ProfileName::Performance);
        assert!(report.applied.attempted);
        assert!(!report.applied.changed);
        assert_eq!(notifier.count(), 0);
    }

    #[test]
    fn test_status_document() {
        let provider = FakeProvider::new(ProfileName::Balanced);
        let notifier = FakeNotifier::new();
        let (mut engine, _) = engine(
            "engine-status",
            &EngineConfig::default(),
            &provider,
            busy(),
            &notifier,
        );

        let report = engine.tick(2000);
        let status = engine.status(&report, 2000);
        assert!(status.is_supported());
        assert_eq!(status.provider_profile, Some(ProfileName::Performance));
        assert_eq!(status.override_profile, None);
        assert_eq!(status.state.last_verified, Some(ProfileName::Performance));
        assert_eq!(status.state.last_notified, Some(2000));
        assert_eq!(status.metrics.load1, 5.0);
        assert_eq!(
            status.last_decision.map(|d| d.reason),
            Some(DecisionReason::Hysteresis)
        );
    }
}
