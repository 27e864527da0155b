use std::time::Duration;

use color_eyre::eyre::{eyre, Result};

use crate::cli::DaemonCommands;
use crate::config::{EngineConfig, LogLevel};
use crate::daemon::{
    daemon_pid, is_daemon_running, lock_path, read_status, run_daemon, status_path, DaemonError,
};
use crate::logging::{self, log_dir, LogMode};

pub fn run(
    command: DaemonCommands,
    config: &EngineConfig,
    log_level_override: Option<LogLevel>,
) -> Result<()> {
    match command {
        DaemonCommands::Start { foreground } => {
            if is_daemon_running() {
                println!("Daemon is already running.");
                return Ok(());
            }

            let result = if foreground {
                let _guard = logging::init(config.log_level, LogMode::Both, log_level_override);
                println!("Starting daemon in foreground...");
                println!("Press Ctrl+C to stop.");
                run_daemon(true, config, log_level_override)
            } else {
                println!("Starting daemon...");
                println!("Logs: {}", log_dir().display());
                run_daemon(false, config, log_level_override)
            };

            match result {
                Ok(()) => {}
                Err(DaemonError::AlreadyRunning) => {
                    println!("Daemon is already running.");
                }
                Err(e) => return Err(eyre!("{}", e)),
            }
        }
        DaemonCommands::Stop => {
            let Some(pid) = daemon_pid() else {
                println!("Daemon is not running.");
                return Ok(());
            };

            // SAFETY: `kill` only sends a signal; the pid comes from the held lock file.
            let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
            if rc != 0 {
                return Err(eyre!(
                    "Failed to signal daemon (pid {}): {}",
                    pid,
                    std::io::Error::last_os_error()
                ));
            }

            for _ in 0..20 {
                if !is_daemon_running() {
                    println!("Daemon stopped.");
                    return Ok(());
                }
                std::thread::sleep(Duration::from_millis(100));
            }
            println!("Daemon (pid {}) is still shutting down.", pid);
        }
        DaemonCommands::Status => {
            println!("Daemon Status");
            println!("{}", "-".repeat(40));

            match daemon_pid() {
                Some(pid) => {
                    println!("Running:      yes");
                    println!("PID:          {}", pid);
                }
                None => println!("Running:      no"),
            }
            println!("Lock file:    {}", lock_path().display());
            println!("Status file:  {}", status_path().display());

            if let Some(status) = read_status(&status_path())? {
                let now = chrono::Utc::now().timestamp();
                println!("Version:      {}", status.version);
                println!(
                    "Last tick:    {} ago",
                    humantime::format_duration(Duration::from_secs(status.age_secs(now) as u64))
                );
            }
        }
    }

    Ok(())
}
