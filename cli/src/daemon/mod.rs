mod lock;
mod server;
mod status;

pub use lock::read_pid;
pub use server::{run_daemon, DaemonError};
pub use status::read_status;

use std::path::PathBuf;

use crate::config::runtime_dir;

const LOCK_NAME: &str = "powershift.lock";
const STATUS_NAME: &str = "status.json";

pub fn lock_path() -> PathBuf {
    runtime_dir().join(LOCK_NAME)
}

pub fn status_path() -> PathBuf {
    runtime_dir().join(STATUS_NAME)
}

pub fn is_daemon_running() -> bool {
    lock::is_locked(&lock_path())
}

/// Pid of the running daemon, if any.
pub fn daemon_pid() -> Option<u32> {
    read_pid(&lock_path())
}
