use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use color_eyre::eyre::{Result, WrapErr};

use crate::logging::{log_dir, LOG_PREFIX};

pub fn run(lines: usize, follow: bool) -> Result<()> {
    let dir = log_dir();

    let Some(path) = newest_log(&dir) else {
        println!("No log files found in {}", dir.display());
        println!("Log files are written by `powershift daemon start`.");
        return Ok(());
    };

    if follow {
        let err = std::process::Command::new("tail")
            .args(["-F", "-n", &lines.to_string()])
            .arg(&path)
            .exec();
        return Err(err.into());
    }

    let content = std::fs::read_to_string(&path)
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
    for line in last_lines(&content, lines) {
        println!("{line}");
    }
    Ok(())
}

/// Date of a daily log named `<prefix>.YYYY-MM-DD.log`.
fn log_date(name: &str) -> Option<NaiveDate> {
    let date = name
        .strip_prefix(LOG_PREFIX)?
        .strip_prefix('.')?
        .strip_suffix(".log")?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// The current day's log file. Names that are not daily logs are skipped.
fn newest_log(dir: &Path) -> Option<PathBuf> {
    std::fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let date = log_date(&e.file_name().to_string_lossy())?;
            Some((date, e.path()))
        })
        .max_by_key(|(date, _)| *date)
        .map(|(_, path)| path)
}

fn last_lines(content: &str, count: usize) -> Vec<&str> {
    let lines: Vec<&str> = content.lines().collect();
    lines[lines.len().saturating_sub(count)..].to_vec()
}
