use std::time::Duration;

use color_eyre::eyre::Result;
use powershift_platform::linux::{NotifySend, PowerProfilesCtl, SystemSampler};
use powershift_platform::{Notifier, ProfileProvider, SnapshotSource};

use crate::config::{config_path, EngineConfig};
use crate::daemon::{daemon_pid, lock_path, status_path};
use crate::engine::{decide_pinned, OverrideStore, StatePaths, FALLBACK_PROFILE};
use crate::logging::log_dir;

pub fn run(config: &EngineConfig) -> Result<()> {
    println!("powershift debug information");
    println!("{}", "=".repeat(60));

    println!("\n--- Provider ---");
    let provider = PowerProfilesCtl::new(config.apply.command_timeout());
    println!(
        "{}: {}",
        provider.program(),
        if provider.is_available() { "found" } else { "missing" }
    );
    let current = match provider.get() {
        Ok(profile) => {
            println!("Active profile: {}", profile);
            profile
        }
        Err(e) => {
            println!("Active profile: unknown ({})", e);
            FALLBACK_PROFILE
        }
    };

    let notifier = NotifySend::new(config.apply.command_timeout());
    println!(
        "notify-send: {}",
        if notifier.is_available() { "found" } else { "missing" }
    );

    println!("\n--- Sampler Backends ---");
    let paths = StatePaths::default();
    let mut sampler = SystemSampler::new(config.sampler_settings(paths.gpu_temp_cache()));
    for (signal, backends) in sampler.describe() {
        if backends.is_empty() {
            println!("{}: none", signal);
        } else {
            println!("{}: {}", signal, backends.join(", "));
        }
    }

    println!("\n--- Live Snapshot ---");
    let _ = sampler.snapshot();
    std::thread::sleep(Duration::from_millis(500));
    let snapshot = sampler.snapshot();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    println!(
        "Spike trigger: {}% busy",
        config.thresholds.spike_trigger_pct(snapshot.cpu_count)
    );

    let pinned = OverrideStore::new(paths.override_file()).peek();
    let decision = decide_pinned(pinned, current, &snapshot, &config.thresholds);
    println!(
        "Would choose: {} ({}) from {}",
        decision.target, decision.reason, current
    );

    println!("\n--- Paths ---");
    println!("Config: {}", config_path().display());
    println!("State:  {}", paths.dir().display());
    println!("Lock:   {}", lock_path().display());
    println!("Status: {}", status_path().display());
    println!("Logs:   {}", log_dir().display());
    match daemon_pid() {
        Some(pid) => println!("Daemon: running (pid {})", pid),
        None => println!("Daemon: not running"),
    }

    println!("\n--- Current Config ---");
    println!("{}", toml::to_string_pretty(config)?);

    Ok(())
}
