use std::fs;
use std::path::Path;

use powershift_platform::linux::{NotifySend, PowerProfilesCtl, SystemSampler};
use powershift_platform::{Notifier, ProfileProvider, SnapshotSource};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, info, warn};

use crate::config::{runtime_dir, ConfigError, EngineConfig, LogLevel};
use crate::daemon::lock::{is_locked, InstanceLock};
use crate::daemon::status::write_status;
use crate::daemon::{lock_path, status_path};
use crate::engine::{Engine, NotifyOutcome, StatePaths};

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Already running")]
    AlreadyRunning,

    #[error("Profile provider not found: {0} is not installed")]
    ProviderMissing(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to daemonize: {0}")]
    Daemonize(String),
}

pub type Result<T> = std::result::Result<T, DaemonError>;

pub fn run_daemon(
    foreground: bool,
    config: &EngineConfig,
    log_level_override: Option<LogLevel>,
) -> Result<()> {
    config.validate()?;

    let provider = PowerProfilesCtl::new(config.apply.command_timeout());
    if !provider.is_available() {
        return Err(DaemonError::ProviderMissing(provider.program().to_string()));
    }

    fs::create_dir_all(runtime_dir())?;
    let lock = lock_path();
    if is_locked(&lock) {
        return Err(DaemonError::AlreadyRunning);
    }

    if !foreground {
        match daemonize::Daemonize::new()
            .working_directory(runtime_dir())
            .start()
        {
            Ok(_) => {}
            Err(e) => return Err(DaemonError::Daemonize(e.to_string())),
        }
        let _guard = crate::logging::init(
            config.log_level,
            crate::logging::LogMode::File,
            log_level_override,
        );
        std::mem::forget(_guard);
    }

    // Taken after the fork so the recorded pid is the daemon's.
    let instance = InstanceLock::acquire(&lock)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = std::process::id(),
        lock = %instance.path().display(),
        poll_interval_secs = config.poll_interval_secs,
        "Daemon starting"
    );

    let paths = StatePaths::default();
    let sampler = SystemSampler::new(config.sampler_settings(paths.gpu_temp_cache()));
    let notifier = NotifySend::new(config.apply.command_timeout());
    if !notifier.is_available() {
        info!("notify-send not found, notifications disabled");
    }
    let mut engine = Engine::new(config, paths, provider, sampler, notifier);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run_loop(&mut engine, config));

    let _ = fs::remove_file(status_path());
    drop(instance);
    info!("Daemon stopped");
    result
}

async fn run_loop<P, S, N>(engine: &mut Engine<P, S, N>, config: &EngineConfig) -> Result<()>
where
    P: ProfileProvider,
    S: SnapshotSource,
    N: Notifier,
{
    let mut tick = tokio::time::interval(config.poll_interval());
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let status_file = status_path();

    loop {
        tokio::select! {
            _ = tick.tick() => {
                run_tick(engine, &status_file);
            }
            _ = interrupt.recv() => {
                info!("Received interrupt, shutting down");
                break;
            }
            _ = terminate.recv() => {
                info!("Received SIGTERM, shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// One synchronous engine tick plus the status document.
fn run_tick<P, S, N>(engine: &mut Engine<P, S, N>, status_file: &Path)
where
    P: ProfileProvider,
    S: SnapshotSource,
    N: Notifier,
{
    let now = chrono::Utc::now().timestamp();
    let report = engine.tick(now);

    if report.applied.changed {
        info!(
            from = ?report.applied.before,
            profile = ?report.applied.actual,
            reason = %report.decision.reason,
            "Switched profile"
        );
    }
    if let Some(outcome) = report.notified {
        if outcome != NotifyOutcome::Sent {
            debug!(?outcome, "Change not announced");
        }
    }

    let status = engine.status(&report, now);
    if let Err(e) = write_status(status_file, &status) {
        warn!(error = %e, "Failed to write status file");
    }
    if report.applied.attempted && report.applied.actual != Some(report.decision.target) {
        warn!(
            wanted = %report.decision.target,
            actual = ?report.applied.actual,
            "Provider did not switch, retrying next tick"
        );
    }
}
