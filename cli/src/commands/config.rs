use std::fmt::Display;

use color_eyre::eyre::{bail, Result};

use crate::config::{config_path, EngineConfig};
use crate::engine::ThresholdSet;

pub fn run(path: bool, reset: bool, edit: bool) -> Result<()> {
    let config_file = config_path();

    if path {
        println!("{}", config_file.display());
        return Ok(());
    }

    if reset {
        EngineConfig::default().save()?;
        println!("Config reset to defaults at: {}", config_file.display());
        return Ok(());
    }

    if edit {
        if !config_file.exists() {
            EngineConfig::default().save()?;
        }

        let editor = std::env::var("EDITOR").unwrap_or_else(|_| "nano".to_string());
        let status = std::process::Command::new(&editor)
            .arg(&config_file)
            .status()?;
        if !status.success() {
            bail!("{} exited with {}", editor, status);
        }

        match EngineConfig::load() {
            Ok(_) => println!("Config is valid. Restart the daemon to apply it."),
            Err(e) => {
                eprintln!("Warning: {}", e);
                eprintln!("The daemon will refuse to start until this is fixed.");
            }
        }
        return Ok(());
    }

    let config = EngineConfig::load()?;
    println!("Config file: {}", config_file.display());
    if !config_file.exists() {
        println!("(not created yet, showing defaults)");
    }
    println!();
    print!("{}", render_bands(&config.thresholds));
    println!();
    println!("{}", toml::to_string_pretty(&config)?);

    Ok(())
}

/// Enter/exit table for the hysteresis signals.
fn render_bands(t: &ThresholdSet) -> String {
    let mut out = format!(
        "{:<10} {:>15} {:>15}\n",
        "signal", "balanced", "performance"
    );
    let mut row = |name: &str, enabled: bool, balanced: String, performance: String| {
        let suffix = if enabled { "" } else { "  (disabled)" };
        out.push_str(&format!(
            "{:<10} {:>15} {:>15}{}\n",
            name, balanced, performance, suffix
        ));
    };

    row(
        "load",
        true,
        band(t.load.balanced.enter, t.load.balanced.exit),
        band(t.load.performance.enter, t.load.performance.exit),
    );
    row(
        "cpu_temp",
        t.cpu_temp.enabled,
        band(t.cpu_temp.balanced.enter, t.cpu_temp.balanced.exit),
        band(t.cpu_temp.performance.enter, t.cpu_temp.performance.exit),
    );
    row(
        "gpu_util",
        t.gpu_util.enabled,
        band(t.gpu_util.balanced.enter, t.gpu_util.balanced.exit),
        band(t.gpu_util.performance.enter, t.gpu_util.performance.exit),
    );
    row(
        "gpu_temp",
        t.gpu_temp.enabled,
        "-".to_string(),
        format!(">= {}", t.gpu_temp.enter),
    );
    out
}

fn band<T: Display>(enter: T, exit: T) -> String {
    format!("{enter} / {exit}")
}
