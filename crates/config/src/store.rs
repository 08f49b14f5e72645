// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk configuration tree.
//!
//! ```text
//! {config_dir}/
//!   global.json          optional global record
//!   boards/
//!     {address}.json     one file per board, filename = address + ".json"
//!     {address}/         the board's state directory (ignored here)
//! ```
//!
//! All writes go through the tmp + rename pattern so a watcher never
//! observes a half-written file.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ConfigError;
use crate::model::{parse_board, parse_global, BoardConfig, GlobalConfig, MultiBoardConfig};

const GLOBAL_FILE: &str = "global.json";
const BOARDS_DIR: &str = "boards";

pub fn global_path(config_dir: &Path) -> PathBuf {
    config_dir.join(GLOBAL_FILE)
}

pub fn boards_dir(config_dir: &Path) -> PathBuf {
    config_dir.join(BOARDS_DIR)
}

pub fn board_path(config_dir: &Path, address: &str) -> PathBuf {
    boards_dir(config_dir).join(format!("{address}.json"))
}

/// Load and validate the whole configuration tree.
///
/// A missing global file or boards directory is not an error; invalid
/// content anywhere is.
pub fn load_config(config_dir: &Path) -> Result<MultiBoardConfig, ConfigError> {
    let global = match fs::read_to_string(global_path(config_dir)) {
        Ok(raw) => parse_global(&global_path(config_dir), &raw)?,
        Err(e) if e.kind() == ErrorKind::NotFound => GlobalConfig::default(),
        Err(e) => return Err(ConfigError::io(&global_path(config_dir), e)),
    };

    let dir = boards_dir(config_dir);
    let mut files: Vec<PathBuf> = match fs::read_dir(&dir) {
        Ok(entries) => entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
            .collect(),
        Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(ConfigError::io(&dir, e)),
    };
    files.sort();

    let mut boards = Vec::with_capacity(files.len());
    let mut seen: HashSet<String> = HashSet::new();
    for file in files {
        let raw = fs::read_to_string(&file).map_err(|e| ConfigError::io(&file, e))?;
        let board = parse_board(&file, &raw)?;

        let expected = format!("{}.json", board.address);
        if file.file_name().is_none_or(|name| name != expected.as_str()) {
            return Err(ConfigError::validation(
                &file,
                format!("filename does not match \"address\" field (expected {expected})"),
            ));
        }
        if !seen.insert(board.address.clone()) {
            return Err(ConfigError::validation(
                &file,
                format!("duplicate board address \"{}\"", board.address),
            ));
        }
        boards.push(board);
    }

    Ok(MultiBoardConfig { global, boards })
}

pub fn save_global_config(config_dir: &Path, global: &GlobalConfig) -> Result<(), ConfigError> {
    write_json(&global_path(config_dir), global)
}

pub fn save_board_config(config_dir: &Path, board: &BoardConfig) -> Result<(), ConfigError> {
    write_json(&board_path(config_dir, &board.address), board)
}

/// Remove a board's config file. A missing file is a user-facing error.
pub fn delete_board_config(config_dir: &Path, address: &str) -> Result<(), ConfigError> {
    let path = board_path(config_dir, address);
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(ConfigError::BoardNotFound(address.to_string()))
        }
        Err(e) => Err(ConfigError::io(&path, e)),
    }
}

/// Re-home a board config under a new address: load, rewrite the address,
/// save under the new name, delete the old file. Refuses to clobber an
/// existing destination.
pub fn rename_board_config(
    config_dir: &Path,
    old_address: &str,
    new_address: &str,
) -> Result<(), ConfigError> {
    let old_path = board_path(config_dir, old_address);
    let new_path = board_path(config_dir, new_address);
    if new_path.exists() {
        return Err(ConfigError::BoardExists(new_address.to_string()));
    }

    let raw = match fs::read_to_string(&old_path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ConfigError::BoardNotFound(old_address.to_string()));
        }
        Err(e) => return Err(ConfigError::io(&old_path, e)),
    };
    let mut board = parse_board(&old_path, &raw)?;
    board.address = new_address.to_string();

    write_json(&new_path, &board)?;
    fs::remove_file(&old_path).map_err(|e| ConfigError::io(&old_path, e))
}

/// Atomic write: serialize, write `{path}.tmp`, rename over `path`.
/// The temp file is removed on any failure.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
    }

    let mut bytes =
        serde_json::to_vec_pretty(value).map_err(|e| ConfigError::validation(path, e.to_string()))?;
    bytes.push(b'\n');

    let tmp = tmp_path(path);
    fs::write(&tmp, &bytes).map_err(|e| ConfigError::io(&tmp, e))?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(ConfigError::io(path, e));
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    PathBuf::from(os)
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
