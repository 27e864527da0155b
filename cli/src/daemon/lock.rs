use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::debug;

use super::server::{DaemonError, Result};

/// [`is_locked`] holds a shared lock for a moment, so a start racing a status
/// query retries before reporting contention.
const ACQUIRE_ATTEMPTS: u32 = 5;
const ACQUIRE_RETRY_DELAY: Duration = Duration::from_millis(20);

/// Exclusive advisory lock held for the lifetime of the daemon. The holder's
/// pid is written into the file.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    /// Takes the lock, retrying briefly instead of blocking. Contention is
    /// [`DaemonError::AlreadyRunning`].
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .mode(0o600)
            .open(path)?;

        lock_exclusive(&file)?;

        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        writeln!(file, "{}", std::process::id())?;
        file.sync_all()?;

        debug!(path = %path.display(), "Acquired instance lock");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        // The flock itself goes away with the descriptor.
        let _ = self.file.set_len(0);
    }
}

fn lock_exclusive(file: &File) -> Result<()> {
    let mut attempt = 1;
    loop {
        match flock(file, libc::LOCK_EX | libc::LOCK_NB) {
            Ok(()) => return Ok(()),
            Err(e) if is_contention(&e) && attempt < ACQUIRE_ATTEMPTS => {
                attempt += 1;
                thread::sleep(ACQUIRE_RETRY_DELAY);
            }
            Err(e) if is_contention(&e) => return Err(DaemonError::AlreadyRunning),
            Err(e) => return Err(DaemonError::Io(e)),
        }
    }
}

fn flock(file: &File, operation: libc::c_int) -> io::Result<()> {
    // SAFETY: the descriptor is owned by `file` and stays open for the call.
    let rc = unsafe { libc::flock(file.as_raw_fd(), operation) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

fn is_contention(e: &io::Error) -> bool {
    e.raw_os_error() == Some(libc::EWOULDBLOCK)
}

/// Whether some process currently holds the lock at `path`.
pub fn is_locked(path: &Path) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    match flock(&file, libc::LOCK_SH | libc::LOCK_NB) {
        Ok(()) => {
            let _ = flock(&file, libc::LOCK_UN);
            false
        }
        Err(e) => is_contention(&e),
    }
}

/// Pid recorded by the current holder, if the lock is held.
pub fn read_pid(path: &Path) -> Option<u32> {
    if !is_locked(path) {
        return None;
    }
    let mut content = String::new();
    File::open(path).ok()?.read_to_string(&mut content).ok()?;
    content.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::temp_dir;

    #[test]
    fn test_second_acquire_is_contention() {
        let path = temp_dir("lock-contention").join("powershift.lock");
        let held = InstanceLock::acquire(&path).unwrap();

        assert!(matches!(
            InstanceLock::acquire(&path),
            Err(DaemonError::AlreadyRunning)
        ));
        assert!(is_locked(&path));
        assert_eq!(read_pid(&path), Some(std::process::id()));

        drop(held);
        assert!(!is_locked(&path));
        assert_eq!(read_pid(&path), None);
        assert!(InstanceLock::acquire(&path).is_ok());
    }

    #[test]
    fn test_brief_liveness_check_does_not_block_start() {
        let path = temp_dir("lock-status-race").join("powershift.lock");
        std::fs::write(&path, "").unwrap();

        let reader = File::open(&path).unwrap();
        flock(&reader, libc::LOCK_SH | libc::LOCK_NB).unwrap();
        let release = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            drop(reader);
        });

        let lock = InstanceLock::acquire(&path);
        release.join().unwrap();
        assert!(lock.is_ok());
    }

    #[test]
    fn test_missing_lock_file_is_not_running() {
        let path = temp_dir("lock-missing").join("powershift.lock");
        assert!(!is_locked(&path));
        assert_eq!(read_pid(&path), None);
    }

    #[test]
    fn test_stale_pid_without_lock_is_ignored() {
        let path = temp_dir("lock-stale").join("powershift.lock");
        std::fs::write(&path, "424242\n").unwrap();
        assert_eq!(read_pid(&path), None);

        let lock = InstanceLock::acquire(&path).unwrap();
        assert_eq!(lock.path(), path.as_path());
        assert_eq!(read_pid(&path), Some(std::process::id()));
    }
}
