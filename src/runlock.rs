//! Cross-process run lock
//!
//! At most one update run may touch a repository's working tree and state
//! database at a time. The lock is a file under `.git-doc/` holding the
//! owner's PID; a lock whose owner is gone is treated as stale and replaced.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::state::{DATA_DIR, LOCK_FILE};
use crate::types::{GitDocError, Result};

#[derive(Debug, Serialize, Deserialize)]
struct LockPayload {
    pid: u32,
    created_at: String,
}

/// Held run lock; released on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
    released: bool,
}

impl RunLock {
    /// Take the lock for `repo_root`.
    ///
    /// Fails with [`GitDocError::AlreadyRunning`] while another live process
    /// holds it.
    pub fn acquire(repo_root: &Path) -> Result<Self> {
        let path = lock_path(repo_root);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        if path.exists() {
            match read_pid(&path) {
                Some(pid) if process_alive(pid) => {
                    return Err(GitDocError::AlreadyRunning { pid });
                }
                pid => {
                    warn!(path = %path.display(), ?pid, "Removing stale run lock");
                    match fs::remove_file(&path) {
                        Ok(()) => {}
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }

        let payload = LockPayload {
            pid: std::process::id(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        };
        let body = serde_json::to_vec(&payload)?;

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = match options.open(&path) {
            Ok(file) => file,
            // Lost the race to another process creating the same file.
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(GitDocError::AlreadyRunning {
                    pid: read_pid(&path).unwrap_or_default(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(&body)?;

        debug!(path = %path.display(), pid = payload.pid, "Acquired run lock");
        Ok(Self {
            path,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the lock file now instead of at drop.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        remove_lock(&self.path)
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = remove_lock(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove run lock");
        }
    }
}

pub fn lock_path(repo_root: &Path) -> PathBuf {
    repo_root.join(DATA_DIR).join(LOCK_FILE)
}

fn remove_lock(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// PID from a JSON payload, or from a bare integer written by older versions.
fn read_pid(path: &Path) -> Option<u32> {
    let raw = fs::read_to_string(path).ok()?;
    if let Ok(payload) = serde_json::from_str::<LockPayload>(&raw)
        && payload.pid > 0
    {
        return Some(payload.pid);
    }
    raw.trim().parse().ok().filter(|pid| *pid > 0)
}

#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    Path::new("/proc").join(pid.to_string()).exists()
}

#[cfg(not(target_os = "linux"))]
fn process_alive(pid: u32) -> bool {
    pid > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_release_reacquire() {
        let dir = tempfile::tempdir().unwrap();

        let lock = RunLock::acquire(dir.path()).unwrap();
        assert!(lock.path().exists());

        match RunLock::acquire(dir.path()) {
            Err(GitDocError::AlreadyRunning { pid }) => assert_eq!(pid, std::process::id()),
            other => panic!("expected AlreadyRunning, got {:?}", other),
        }

        lock.release().unwrap();
        assert!(!lock_path(dir.path()).exists());

        let again = RunLock::acquire(dir.path()).unwrap();
        drop(again);
        assert!(!lock_path(dir.path()).exists());
    }

    #[test]
    fn test_payload_is_json() {
        let dir = tempfile::tempdir().unwrap();
        let lock = RunLock::acquire(dir.path()).unwrap();

        let raw = fs::read_to_string(lock.path()).unwrap();
        let payload: LockPayload = serde_json::from_str(&raw).unwrap();
        assert_eq!(payload.pid, std::process::id());
        assert!(payload.created_at.ends_with('Z'));
    }

    #[test]
    fn test_unreadable_lock_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = lock_path(dir.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "garbage").unwrap();

        let lock = RunLock::acquire(dir.path()).unwrap();
        assert_eq!(read_pid(lock.path()), Some(std::process::id()));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_dead_pid_lock_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = lock_path(dir.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        // PIDs are capped well below u32::MAX on Linux.
        fs::write(&path, format!("{}", u32::MAX - 1)).unwrap();

        let lock = RunLock::acquire(dir.path()).unwrap();
        assert_eq!(read_pid(lock.path()), Some(std::process::id()));
    }

    #[test]
    fn test_read_pid_formats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lock");

        fs::write(&path, r#"{"pid":42,"created_at":"2024-01-01T00:00:00Z"}"#).unwrap();
        assert_eq!(read_pid(&path), Some(42));
        fs::write(&path, " 77\n").unwrap();
        assert_eq!(read_pid(&path), Some(77));
        fs::write(&path, "").unwrap();
        assert_eq!(read_pid(&path), None);
        fs::write(&path, r#"{"pid":0,"created_at":""}"#).unwrap();
        assert_eq!(read_pid(&path), None);
    }
}
