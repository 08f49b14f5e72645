// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host-aware single-writer lock for a state document.
//!
//! The lock is `{state_path}.lock` containing `"{pid}\n{hostname}"`. An
//! existing file is examined rather than trusted: a holder on this host
//! whose PID is still alive wins; a dead PID or a foreign hostname marks a
//! stale lock (a containerised redeploy on the same volume sees a foreign
//! hostname even when the PID number happens to be alive locally), which is
//! unlinked and the exclusive create retried. Cross-host exclusion is
//! advisory only.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use nix::sys::signal::kill;
use nix::unistd::Pid;
use tracing::{debug, warn};

use crate::state::suffixed;
use crate::StorageError;

const MAX_ATTEMPTS: u32 = 5;

/// An acquired lock. Releasing is best-effort and also happens on drop.
#[derive(Debug)]
pub struct StateLock {
    lock_path: PathBuf,
    released: bool,
}

impl StateLock {
    /// Acquire the lock guarding `state_path`.
    ///
    /// Fails with [`StorageError::AlreadyRunning`] when a live process on
    /// this host holds it.
    pub fn acquire(state_path: &Path) -> Result<StateLock, StorageError> {
        let lock_path = suffixed(state_path, ".lock");
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        for _ in 0..MAX_ATTEMPTS {
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
            {
                Ok(mut file) => {
                    write!(file, "{}\n{}", std::process::id(), local_hostname())
                        .map_err(|e| StorageError::io(&lock_path, e))?;
                    return Ok(StateLock {
                        lock_path,
                        released: false,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    let contents = fs::read_to_string(&lock_path).unwrap_or_default();
                    if let Some(holder) = LockHolder::parse(&contents) {
                        if holder.hostname == local_hostname() && pid_alive(holder.pid) {
                            return Err(StorageError::AlreadyRunning { pid: holder.pid });
                        }
                    }
                    debug!(path = %lock_path.display(), "reclaiming stale lock");
                    // Stale or malformed holder: unlink and retry the
                    // exclusive create. A racing acquirer may win the
                    // retry, which the next loop iteration detects.
                    if let Err(e) = fs::remove_file(&lock_path) {
                        if e.kind() != ErrorKind::NotFound {
                            return Err(StorageError::io(&lock_path, e));
                        }
                    }
                }
                Err(e) => return Err(StorageError::io(&lock_path, e)),
            }
        }

        Err(StorageError::LockContended { path: lock_path })
    }

    /// Best-effort unlink of the lock file.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = fs::remove_file(&self.lock_path) {
            if e.kind() != ErrorKind::NotFound {
                warn!(path = %self.lock_path.display(), error = %e, "failed to remove lock file");
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        self.release();
    }
}

struct LockHolder {
    pid: i32,
    hostname: String,
}

impl LockHolder {
    fn parse(contents: &str) -> Option<LockHolder> {
        let mut lines = contents.lines();
        let pid = lines.next()?.trim().parse().ok()?;
        let hostname = lines.next()?.trim().to_string();
        Some(LockHolder { pid, hostname })
    }
}

/// Liveness probe that delivers no signal: `kill(pid, 0)`. `EPERM` means
/// the process exists but belongs to someone else, which still counts.
fn pid_alive(pid: i32) -> bool {
    if pid <= 0 {
        return false;
    }
    match kill(Pid::from_raw(pid), None) {
        Ok(()) => true,
        Err(nix::errno::Errno::EPERM) => true,
        Err(_) => false,
    }
}

fn local_hostname() -> String {
    nix::unistd::gethostname()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
