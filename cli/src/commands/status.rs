use std::time::Duration;

use color_eyre::eyre::Result;
use powershift_platform::linux::{PowerProfilesCtl, SystemSampler};
use powershift_platform::{ProfileProvider, SnapshotSource};
use powershift_protocol::{MetricSnapshot, StatusSnapshot};

use crate::config::EngineConfig;
use crate::daemon::{daemon_pid, read_status, status_path};
use crate::engine::{OverrideStore, StatePaths, StateStore};

/// Time between the two samples taken when no daemon is running, so the short
/// busy window has something to compare against.
const LIVE_SAMPLE_WINDOW: Duration = Duration::from_millis(250);

pub fn run(json: bool, config: &EngineConfig) -> Result<()> {
    let paths = StatePaths::default();
    let now = chrono::Utc::now().timestamp();
    let pid = daemon_pid();

    let daemon_status = if pid.is_some() {
        read_status(&status_path())?
    } else {
        None
    };

    let mut status = match daemon_status {
        Some(status) => status,
        None => StatusSnapshot::new(now, live_snapshot(config, &paths)),
    };
    status.pid = pid.unwrap_or(0);
    if status.version.is_empty() {
        status.version = env!("CARGO_PKG_VERSION").to_string();
    }

    let provider = PowerProfilesCtl::new(config.apply.command_timeout());
    status.provider_profile = provider.get().ok();
    status.override_profile = OverrideStore::new(paths.override_file()).peek();
    status.state = StateStore::read(&paths);

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let silenced = paths.silent_file().exists();
    print!("{}", render(&status, pid.is_some(), silenced, now));
    Ok(())
}

fn live_snapshot(config: &EngineConfig, paths: &StatePaths) -> MetricSnapshot {
    let mut sampler = SystemSampler::new(config.sampler_settings(paths.gpu_temp_cache()));
    let _ = sampler.snapshot();
    std::thread::sleep(LIVE_SAMPLE_WINDOW);
    sampler.snapshot()
}

fn render(status: &StatusSnapshot, running: bool, silenced: bool, now: i64) -> String {
    let mut lines = Vec::new();

    let profile = match status.provider_profile {
        Some(p) => format!("{} ({})", p.label(), p),
        None => "unknown (powerprofilesctl unavailable)".to_string(),
    };
    lines.push(format!("Profile:        {}", profile));

    let mode = match status.override_profile {
        Some(p) => format!("pinned to {}", p),
        None => "auto".to_string(),
    };
    lines.push(format!("Mode:           {}", mode));

    let daemon = if running {
        format!("running (pid {})", status.pid)
    } else {
        "not running".to_string()
    };
    lines.push(format!("Daemon:         {}", daemon));

    if running {
        if let Some(decision) = status.last_decision {
            lines.push(format!(
                "Last decision:  {} ({}), {} ago",
                decision.target.label(),
                decision.reason,
                humantime::format_duration(Duration::from_secs(status.age_secs(now) as u64))
            ));
        }
    }

    lines.push(format!(
        "Notifications:  {}",
        if silenced { "silenced" } else { "on" }
    ));

    let m = &status.metrics;
    lines.push(String::new());
    lines.push("Metrics".to_string());
    lines.push("-".repeat(40));
    lines.push(format!("Load (1m):      {:.2} ({} CPUs)", m.load1, m.cpu_count));
    lines.push(format!("CPU busy:       {}", or_na(m.short_busy_pct, "%")));
    lines.push(format!("CPU temp:       {}", or_na(m.cpu_temp_c, "°C")));
    lines.push(format!("GPU util:       {}", or_na(m.gpu_util_pct, "%")));
    lines.push(format!("GPU temp:       {}", or_na(m.gpu_temp_c, "°C")));
    lines.push(format!(
        "Forced process: {}",
        if m.force_process { "yes" } else { "no" }
    ));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn or_na<T: std::fmt::Display>(value: Option<T>, unit: &str) -> String {
    value
        .map(|v| format!("{}{}", v, unit))
        .unwrap_or_else(|| "n/a".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use powershift_protocol::{DecisionReason, DecisionRecord, ProfileName};

    fn sample_status() -> StatusSnapshot {
        let mut status = StatusSnapshot::new(
            1000,
            MetricSnapshot {
                load1: 2.5,
                short_busy_pct: Some(12),
                cpu_temp_c: Some(61),
                gpu_util_pct: None,
                gpu_temp_c: None,
                force_process: false,
                cpu_count: 8,
            },
        );
        status.pid = 4242;
        status.provider_profile = Some(ProfileName::Balanced);
        status.last_decision = Some(DecisionRecord {
            target: ProfileName::Balanced,
            reason: DecisionReason::Hysteresis,
        });
        status
    }

    #[test]
    fn test_render_running_daemon() {
        let out = render(&sample_status(), true, false, 1003);
        assert!(out.contains("Profile:        Balanced (balanced)"));
        assert!(out.contains("Mode:           auto"));
        assert!(out.contains("running (pid 4242)"));
        assert!(out.contains("Last decision:  Balanced (load), 3s ago"));
        assert!(out.contains("CPU temp:       61°C"));
        assert!(out.contains("GPU util:       n/a"));
        assert!(out.contains("Notifications:  on"));
    }

    #[test]
    fn test_render_pinned_without_daemon() {
        let mut status = sample_status();
        status.override_profile = Some(ProfileName::PowerSaver);
        status.provider_profile = None;

        let out = render(&status, false, true, 1003);
        assert!(out.contains("pinned to power-saver"));
        assert!(out.contains("Daemon:         not running"));
        assert!(out.contains("unknown"));
        assert!(out.contains("Notifications:  silenced"));
        assert!(!out.contains("Last decision"));
    }
}
