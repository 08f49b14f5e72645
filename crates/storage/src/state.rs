// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-board state document.
//!
//! One JSON file per board holding the worker's signer key(s) and the
//! archive timestamps it is responsible for purging. Loading never fails:
//! a missing file yields the default state, and an unparseable file is set
//! aside as `{path}.corrupt-{epoch-secs}` so the signer key can be
//! recovered by hand before a fresh state takes its place.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::StorageError;

/// A stored signer key, keyed by the board address it signs for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerEntry {
    pub private_key: String,
}

/// When this worker archived a thread, seconds since the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedThread {
    pub archived_timestamp: u64,
}

/// Everything a board worker persists.
///
/// `archived_threads` is insertion-ordered so the purge rule walks entries
/// in a stable order across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoardState {
    pub signers: HashMap<String, SignerEntry>,
    pub archived_threads: IndexMap<String, ArchivedThread>,
}

/// Load the state document, defaulting on absence or corruption.
pub fn load_state(path: &Path) -> BoardState {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            if e.kind() != ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "state unreadable, starting fresh");
            }
            return BoardState::default();
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(state) => state,
        Err(e) => {
            let aside = corrupt_path(path);
            warn!(
                path = %path.display(),
                set_aside = %aside.display(),
                error = %e,
                "state unparseable, setting it aside and starting fresh"
            );
            if let Err(rename_err) = fs::rename(path, &aside) {
                warn!(path = %path.display(), error = %rename_err, "could not set corrupt state aside");
            }
            BoardState::default()
        }
    }
}

/// Atomically persist the state document: write `{path}.tmp`, rename onto
/// `path`. The temp file is removed on any failure.
pub fn save_state(path: &Path, state: &BoardState) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
    }

    let mut bytes = serde_json::to_vec_pretty(state).map_err(|e| StorageError::Serialize {
        path: path.to_path_buf(),
        source: e,
    })?;
    bytes.push(b'\n');

    let tmp = suffixed(path, ".tmp");
    if let Err(e) = fs::write(&tmp, &bytes) {
        let _ = fs::remove_file(&tmp);
        return Err(StorageError::io(&tmp, e));
    }
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(StorageError::io(path, e));
    }
    Ok(())
}

fn corrupt_path(path: &Path) -> PathBuf {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    suffixed(path, &format!(".corrupt-{secs}"))
}

pub(crate) fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(suffix);
    PathBuf::from(os)
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
