//! Small one-value files shared between the daemon, the CLI and the tray tool.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub use powershift_platform::write_atomic;
use powershift_protocol::{PersistedState, ProfileName};
use tracing::{debug, warn};

const OVERRIDE_FILE: &str = "powerprofile.override";
const STATE_FILE: &str = "powerprofile.state";
const LAST_FILE: &str = "powerprofile.last";
const SILENT_FILE: &str = "powerprofile.silent";
const NOTIFIED_FILE: &str = "powerprofile.notified";
const GPU_TEMP_FILE: &str = "powerprofile.gputemp";

/// Locations of the persisted engine files.
#[derive(Debug, Clone)]
pub struct StatePaths {
    dir: PathBuf,
}

impl StatePaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn override_file(&self) -> PathBuf {
        self.dir.join(OVERRIDE_FILE)
    }

    /// Last profile the provider confirmed.
    pub fn state_file(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    /// Last profile the engine tried to set.
    pub fn last_file(&self) -> PathBuf {
        self.dir.join(LAST_FILE)
    }

    /// Presence suppresses notifications.
    pub fn silent_file(&self) -> PathBuf {
        self.dir.join(SILENT_FILE)
    }

    pub fn notified_file(&self) -> PathBuf {
        self.dir.join(NOTIFIED_FILE)
    }

    pub fn gpu_temp_cache(&self) -> PathBuf {
        self.dir.join(GPU_TEMP_FILE)
    }
}

impl Default for StatePaths {
    fn default() -> Self {
        Self::new(crate::config::state_dir())
    }
}

/// Reads a trimmed value. A missing file is `Ok(None)`.
pub fn read_value(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content.trim().to_string())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Removes `path`, treating an already missing file as success.
pub fn remove_file(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn read_profile(path: &Path) -> Option<ProfileName> {
    match read_value(path) {
        Ok(value) => value.as_deref().and_then(ProfileName::parse_trimmed),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Unreadable state file");
            None
        }
    }
}

/// Engine bookkeeping backed by the state files.
///
/// Values are cached after loading and only written when they change. Write
/// failures are logged and otherwise ignored.
pub struct StateStore {
    paths: StatePaths,
    state: PersistedState,
}

impl StateStore {
    pub fn open(paths: StatePaths) -> Self {
        let state = Self::read(&paths);
        Self { paths, state }
    }

    /// Reads the persisted values without holding them.
    pub fn read(paths: &StatePaths) -> PersistedState {
        PersistedState {
            last_attempted: read_profile(&paths.last_file()),
            last_verified: read_profile(&paths.state_file()),
            last_notified: read_timestamp(&paths.notified_file()),
        }
    }

    pub fn state(&self) -> PersistedState {
        self.state
    }

    pub fn record_attempted(&mut self, target: ProfileName) {
        if self.state.last_attempted == Some(target) {
            return;
        }
        self.state.last_attempted = Some(target);
        persist(&self.paths.last_file(), target.as_str());
    }

    pub fn record_verified(&mut self, actual: ProfileName) {
        if self.state.last_verified == Some(actual) {
            return;
        }
        self.state.last_verified = Some(actual);
        persist(&self.paths.state_file(), actual.as_str());
    }

    /// Latest emission time, including ones recorded by other processes
    /// sharing the state directory.
    pub fn last_notified(&self) -> Option<i64> {
        let on_disk = read_timestamp(&self.paths.notified_file());
        self.state.last_notified.max(on_disk)
    }

    pub fn record_notified(&mut self, timestamp: i64) {
        self.state.last_notified = Some(timestamp);
        persist(&self.paths.notified_file(), &timestamp.to_string());
    }

    pub fn is_silenced(&self) -> bool {
        self.paths.silent_file().exists()
    }
}

fn read_timestamp(path: &Path) -> Option<i64> {
    read_value(path).ok().flatten()?.parse().ok()
}

fn persist(path: &Path, value: &str) {
    if let Err(e) = write_atomic(path, value) {
        warn!(path = %path.display(), error = %e, "Failed to persist state");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::temp_dir;

    #[test]
    fn test_missing_value_is_none() {
        let dir = temp_dir("state-missing");
        assert_eq!(read_value(&dir.join("nothing")).unwrap(), None);
        assert!(remove_file(&dir.join("nothing")).is_ok());
    }

    #[test]
    fn test_store_round_trips_through_files() {
        let dir = temp_dir("state-store");
        let mut store = StateStore::open(StatePaths::new(&dir));
        assert_eq!(store.state(), PersistedState::default());

        store.record_attempted(ProfileName::Performance);
        store.record_verified(ProfileName::Performance);
        store.record_notified(1_700_000_000);

        let reopened = StateStore::open(StatePaths::new(&dir));
        assert_eq!(
            reopened.state(),
            PersistedState {
                last_attempted: Some(ProfileName::Performance),
                last_verified: Some(ProfileName::Performance),
                last_notified: Some(1_700_000_000),
            }
        );
    }

    #[test]
    fn test_unchanged_value_is_not_rewritten() {
        let dir = temp_dir("state-unchanged");
        let paths = StatePaths::new(&dir);
        let mut store = StateStore::open(paths.clone());

        store.record_verified(ProfileName::Balanced);
        // An external edit survives because the cached value did not change.
        fs::write(paths.state_file(), "power-saver\n").unwrap();
        store.record_verified(ProfileName::Balanced);

        assert_eq!(
            read_value(&paths.state_file()).unwrap().as_deref(),
            Some("power-saver")
        );
    }

    #[test]
    fn test_garbage_state_reads_as_unknown() {
        let dir = temp_dir("state-garbage");
        let paths = StatePaths::new(&dir);
        fs::write(paths.state_file(), "turbo\n").unwrap();
        fs::write(paths.notified_file(), "yesterday").unwrap();

        let state = StateStore::read(&paths);
        assert_eq!(state.last_verified, None);
        assert_eq!(state.last_notified, None);
    }

    #[test]
    fn test_last_notified_sees_other_writers() {
        let dir = temp_dir("state-shared-notified");
        let mut daemon = StateStore::open(StatePaths::new(&dir));
        assert_eq!(daemon.last_notified(), None);

        let mut cli = StateStore::open(StatePaths::new(&dir));
        cli.record_notified(1000);
        assert_eq!(daemon.last_notified(), Some(1000));

        // An older value on disk never rewinds the cached one.
        daemon.record_notified(1200);
        cli.record_notified(900);
        assert_eq!(daemon.last_notified(), Some(1200));
    }

    #[test]
    fn test_silence_marker() {
        let paths = StatePaths::new(temp_dir("state-silent"));
        let store = StateStore::open(paths.clone());
        assert!(!store.is_silenced());
        fs::write(paths.silent_file(), "").unwrap();
        assert!(store.is_silenced());
    }
}
