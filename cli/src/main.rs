mod cli;
mod commands;
mod config;
mod daemon;
mod engine;
mod logging;

use clap::Parser;
use color_eyre::eyre::Result;

use cli::{Cli, Commands, DaemonCommands};
use config::{EngineConfig, LogLevel};
use logging::LogMode;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let log_level_override = cli.log_level.as_deref().map(LogLevel::from_str);

    if let Commands::Daemon {
        command: command @ DaemonCommands::Start { .. },
    } = cli.command
    {
        // The daemon refuses to run on a broken config.
        let config = EngineConfig::load()?;
        return commands::daemon::run(command, &config, log_level_override);
    }

    let config = EngineConfig::load_or_default();
    let _guard = logging::init(config.log_level, LogMode::Stderr, log_level_override);

    match cli.command {
        Commands::Daemon { command } => {
            commands::daemon::run(command, &config, log_level_override)?;
        }
        Commands::Set { profile } => {
            commands::set::pin(profile.into(), &config)?;
        }
        Commands::Auto => {
            commands::set::auto(&config)?;
        }
        Commands::Status { json } => {
            commands::status::run(json, &config)?;
        }
        Commands::Notify { state } => {
            commands::notify::run(state)?;
        }
        Commands::Debug => {
            commands::debug::run(&config)?;
        }
        Commands::Config { path, reset, edit } => {
            commands::config::run(path, reset, edit)?;
        }
        Commands::Logs { lines, follow } => {
            commands::logs::run(lines, follow)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod testutil {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static COUNTER: AtomicU32 = AtomicU32::new(0);

    pub fn temp_dir(name: &str) -> PathBuf {
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let dir = std::env::temp_dir().join(format!(
            "powershift-{name}-{}-{nanos}-{seq}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
