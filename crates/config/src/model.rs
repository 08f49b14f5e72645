// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration records and their validation.
//!
//! Validation runs over the raw JSON value so error messages can name the
//! offending key; the typed record is only produced from a value that has
//! already passed every check.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use bm_core::ModerationReasonsConfig;

use crate::error::ConfigError;

/// The global configuration file (`global.json`). Every field optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// Worker tunable defaults shared by every board that does not override them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DefaultsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bump_limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_purge_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderation_reasons: Option<ModerationReasonsConfig>,
}

/// One board's configuration file (`boards/{address}.json`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoardConfig {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bump_limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_purge_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderation_reasons: Option<ModerationReasonsConfig>,
}

impl BoardConfig {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            ..Self::default()
        }
    }
}

/// The loaded configuration tree: global file plus every board file,
/// boards in filename order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultiBoardConfig {
    pub global: GlobalConfig,
    pub boards: Vec<BoardConfig>,
}

impl MultiBoardConfig {
    pub fn board(&self, address: &str) -> Option<&BoardConfig> {
        self.boards.iter().find(|b| b.address == address)
    }
}

/// Tunable keys that must be positive integers wherever they appear.
const TUNABLE_KEYS: [&str; 4] = ["perPage", "pages", "bumpLimit", "archivePurgeSeconds"];

/// Parse and validate the global file.
pub(crate) fn parse_global(file: &Path, raw: &str) -> Result<GlobalConfig, ConfigError> {
    let value = parse_object(file, raw)?;

    for key in ["rpcUrl", "stateDir", "userAgent"] {
        if let Some(v) = value.get(key) {
            if !v.is_string() {
                return Err(ConfigError::validation(
                    file,
                    format!("\"{key}\" must be a string"),
                ));
            }
        }
    }

    if let Some(defaults) = value.get("defaults") {
        if !defaults.is_object() {
            return Err(ConfigError::validation(file, "\"defaults\" must be an object"));
        }
        check_tunables(file, defaults, "defaults.")?;
        check_moderation_reasons(file, defaults, "defaults.")?;
    }

    serde_json::from_value(value).map_err(|e| ConfigError::validation(file, e.to_string()))
}

/// Parse and validate one board file. The filename check against the
/// `address` field lives in the store, which knows the filename.
pub(crate) fn parse_board(file: &Path, raw: &str) -> Result<BoardConfig, ConfigError> {
    let value = parse_object(file, raw)?;

    match value.get("address").and_then(Value::as_str) {
        Some(address) if !address.is_empty() => {}
        _ => {
            return Err(ConfigError::validation(
                file,
                "\"address\" is required and must be a non-empty string",
            ));
        }
    }

    check_tunables(file, &value, "")?;
    check_moderation_reasons(file, &value, "")?;

    serde_json::from_value(value).map_err(|e| ConfigError::validation(file, e.to_string()))
}

fn parse_object(file: &Path, raw: &str) -> Result<Value, ConfigError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| ConfigError::validation(file, format!("invalid JSON: {e}")))?;
    if value.is_array() {
        return Err(ConfigError::validation(
            file,
            "top-level value must be an object, not an array",
        ));
    }
    if !value.is_object() {
        return Err(ConfigError::validation(file, "top-level value must be an object"));
    }
    Ok(value)
}

/// Tunables must be integer-typed and positive; zero and floats are rejected.
fn check_tunables(file: &Path, object: &Value, prefix: &str) -> Result<(), ConfigError> {
    for key in TUNABLE_KEYS {
        if let Some(v) = object.get(key) {
            if v.as_u64().is_none_or(|n| n == 0) {
                return Err(ConfigError::validation(
                    file,
                    format!("\"{prefix}{key}\" must be a positive integer"),
                ));
            }
        }
    }
    Ok(())
}

fn check_moderation_reasons(file: &Path, object: &Value, prefix: &str) -> Result<(), ConfigError> {
    let Some(reasons) = object.get("moderationReasons") else {
        return Ok(());
    };
    let Some(reasons) = reasons.as_object() else {
        return Err(ConfigError::validation(
            file,
            format!("\"{prefix}moderationReasons\" must be an object"),
        ));
    };
    for (key, v) in reasons {
        if !ModerationReasonsConfig::KEYS.contains(&key.as_str()) {
            return Err(ConfigError::validation(
                file,
                format!("\"{prefix}moderationReasons\" has unrecognized key \"{key}\""),
            ));
        }
        if !v.is_string() {
            return Err(ConfigError::validation(
                file,
                format!("\"{prefix}moderationReasons.{key}\" must be a string"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
