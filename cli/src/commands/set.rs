use std::time::Duration;

use color_eyre::eyre::Result;
use powershift_platform::linux::{NotifySend, PowerProfilesCtl};
use powershift_platform::{Notifier, ProfileProvider};
use powershift_protocol::{DecisionReason, ProfileName};

use crate::config::EngineConfig;
use crate::daemon::is_daemon_running;
use crate::engine::{
    AppliedResult, ApplyController, Notification, NotificationGate, OverrideStore, StatePaths,
    StateStore,
};

/// Pins `profile` and applies it right away instead of waiting for a tick.
pub fn pin(profile: ProfileName, config: &EngineConfig) -> Result<()> {
    let paths = StatePaths::default();
    let provider = PowerProfilesCtl::new(config.apply.command_timeout());
    let notifier = NotifySend::new(config.apply.command_timeout());

    let applied = pin_with(profile, config, &paths, &provider, &notifier)?;

    println!("Pinned {} ({}).", profile.label(), profile);
    match applied {
        Some(result) if result.actual == Some(profile) => {
            println!("Active profile: {}", profile);
        }
        Some(result) => {
            println!(
                "Provider reports {}; the daemon keeps retrying.",
                result
                    .actual
                    .map(|p| p.as_str())
                    .unwrap_or("an unknown profile")
            );
        }
        None => {
            println!("powerprofilesctl not found; the profile is applied by the daemon.");
        }
    }
    Ok(())
}

/// Clears the pin. The daemon picks a profile on its next tick.
pub fn auto(config: &EngineConfig) -> Result<()> {
    let paths = StatePaths::default();
    let notifier = NotifySend::new(config.apply.command_timeout());

    clear_with(config, &paths, &notifier)?;

    println!("Automatic switching resumed.");
    if !is_daemon_running() {
        println!("The daemon is not running; start it with `powershift daemon start`.");
    }
    Ok(())
}

fn pin_with<P: ProfileProvider, N: Notifier>(
    profile: ProfileName,
    config: &EngineConfig,
    paths: &StatePaths,
    provider: &P,
    notifier: N,
) -> Result<Option<AppliedResult>> {
    OverrideStore::new(paths.override_file()).pin(profile)?;

    if !provider.is_available() {
        return Ok(None);
    }

    let controller = ApplyController::new(config.apply.retries, config.apply.retry_delay());
    let result = controller.apply(provider, profile);

    let mut store = StateStore::open(paths.clone());
    if result.attempted {
        store.record_attempted(profile);
    }
    if let Some(actual) = result.actual {
        store.record_verified(actual);
        if result.changed {
            manual_gate(config, notifier).notify(
                &mut store,
                &Notification::profile_changed(actual, DecisionReason::Override),
                chrono::Utc::now().timestamp(),
            );
        }
    }
    Ok(Some(result))
}

fn clear_with<N: Notifier>(config: &EngineConfig, paths: &StatePaths, notifier: N) -> Result<()> {
    let overrides = OverrideStore::new(paths.override_file());
    let was_pinned = overrides.peek().is_some();
    overrides.clear()?;

    if was_pinned {
        let mut store = StateStore::open(paths.clone());
        manual_gate(config, notifier).notify(
            &mut store,
            &Notification::override_cleared(),
            chrono::Utc::now().timestamp(),
        );
    }
    Ok(())
}

/// Manual commands answer the user directly, so the cooldown does not apply.
fn manual_gate<N: Notifier>(config: &EngineConfig, notifier: N) -> NotificationGate<N> {
    NotificationGate::new(notifier, config.notify.enabled, Duration::ZERO)
}
