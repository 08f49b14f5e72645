// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Moderation actions and the reason strings attached to them.

use serde::{Deserialize, Serialize};

/// The action half of a signed moderation record. Serializes to exactly
/// `{"archived": true, "reason": …}` or `{"purged": true, "reason": …}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModAction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purged: Option<bool>,
    pub reason: String,
}

impl ModAction {
    pub fn archive(reason: impl Into<String>) -> Self {
        Self {
            archived: Some(true),
            purged: None,
            reason: reason.into(),
        }
    }

    pub fn purge(reason: impl Into<String>) -> Self {
        Self {
            archived: None,
            purged: Some(true),
            reason: reason.into(),
        }
    }

    pub fn is_archive(&self) -> bool {
        self.archived == Some(true)
    }

    pub fn is_purge(&self) -> bool {
        self.purged == Some(true)
    }
}

/// Fully resolved reason strings, one per moderation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationReasons {
    pub archive_capacity: String,
    pub archive_bump_limit: String,
    pub purge_archived: String,
    pub purge_deleted: String,
}

impl Default for ModerationReasons {
    fn default() -> Self {
        Self {
            archive_capacity: "Thread limit reached, archiving the oldest thread".to_string(),
            archive_bump_limit: "Bump limit reached".to_string(),
            purge_archived: "Archived thread expired".to_string(),
            purge_deleted: "Comment deleted by its author".to_string(),
        }
    }
}

/// The configurable shape of [`ModerationReasons`]: every key optional,
/// merged board-over-defaults per key, built-ins filling whatever is left.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationReasonsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_capacity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_bump_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purge_archived: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purge_deleted: Option<String>,
}

impl ModerationReasonsConfig {
    /// The four recognized keys, in their on-disk spelling.
    pub const KEYS: [&'static str; 4] = [
        "archiveCapacity",
        "archiveBumpLimit",
        "purgeArchived",
        "purgeDeleted",
    ];

    /// Per-key merge: `self` wins, `fallback` fills the gaps.
    pub fn merged_over(&self, fallback: &ModerationReasonsConfig) -> ModerationReasonsConfig {
        ModerationReasonsConfig {
            archive_capacity: self
                .archive_capacity
                .clone()
                .or_else(|| fallback.archive_capacity.clone()),
            archive_bump_limit: self
                .archive_bump_limit
                .clone()
                .or_else(|| fallback.archive_bump_limit.clone()),
            purge_archived: self
                .purge_archived
                .clone()
                .or_else(|| fallback.purge_archived.clone()),
            purge_deleted: self
                .purge_deleted
                .clone()
                .or_else(|| fallback.purge_deleted.clone()),
        }
    }

    /// Fill unset keys with the built-in reason strings.
    pub fn materialize(&self) -> ModerationReasons {
        let builtin = ModerationReasons::default();
        ModerationReasons {
            archive_capacity: self
                .archive_capacity
                .clone()
                .unwrap_or(builtin.archive_capacity),
            archive_bump_limit: self
                .archive_bump_limit
                .clone()
                .unwrap_or(builtin.archive_bump_limit),
            purge_archived: self.purge_archived.clone().unwrap_or(builtin.purge_archived),
            purge_deleted: self.purge_deleted.clone().unwrap_or(builtin.purge_deleted),
        }
    }
}

#[cfg(test)]
#[path = "moderation_tests.rs"]
mod tests;
