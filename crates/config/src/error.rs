// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration errors

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file failed validation. The message names the offending key.
    #[error("invalid config {}: {message}", file.display())]
    Validation { file: PathBuf, message: String },

    #[error("board \"{0}\" not found")]
    BoardNotFound(String),

    #[error("board config for \"{0}\" already exists")]
    BoardExists(String),

    #[error("Cannot set and reset the same field: {0}")]
    SetAndReset(&'static str),

    #[error("unknown field \"{0}\"")]
    UnknownField(String),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub(crate) fn validation(file: &std::path::Path, message: impl Into<String>) -> Self {
        Self::Validation {
            file: file.to_path_buf(),
            message: message.into(),
        }
    }

    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
