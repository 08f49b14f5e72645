// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Purely functional config edits: apply a patch, then clear reset fields.
//! Setting and resetting the same field in one edit is refused.

use std::str::FromStr;

use bm_core::ModerationReasonsConfig;

use crate::error::ConfigError;
use crate::model::{BoardConfig, DefaultsConfig, GlobalConfig};

/// Fields that can be set or reset on a board (or on the global defaults).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardField {
    PerPage,
    Pages,
    BumpLimit,
    ArchivePurgeSeconds,
    ModerationReasons,
}

impl BoardField {
    pub fn name(self) -> &'static str {
        match self {
            Self::PerPage => "perPage",
            Self::Pages => "pages",
            Self::BumpLimit => "bumpLimit",
            Self::ArchivePurgeSeconds => "archivePurgeSeconds",
            Self::ModerationReasons => "moderationReasons",
        }
    }
}

impl FromStr for BoardField {
    type Err = ConfigError;

    /// Accepts the on-disk camelCase spelling and the CLI's kebab-case flags.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "perPage" | "per-page" => Ok(Self::PerPage),
            "pages" => Ok(Self::Pages),
            "bumpLimit" | "bump-limit" => Ok(Self::BumpLimit),
            "archivePurgeSeconds" | "archive-purge-seconds" => Ok(Self::ArchivePurgeSeconds),
            "moderationReasons" | "moderation-reasons" => Ok(Self::ModerationReasons),
            other => Err(ConfigError::UnknownField(other.to_string())),
        }
    }
}

/// A partial board edit. `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardPatch {
    pub per_page: Option<u64>,
    pub pages: Option<u64>,
    pub bump_limit: Option<u64>,
    pub archive_purge_seconds: Option<u64>,
    pub moderation_reasons: Option<ModerationReasonsConfig>,
}

impl BoardPatch {
    fn set_fields(&self) -> Vec<BoardField> {
        let mut fields = Vec::new();
        if self.per_page.is_some() {
            fields.push(BoardField::PerPage);
        }
        if self.pages.is_some() {
            fields.push(BoardField::Pages);
        }
        if self.bump_limit.is_some() {
            fields.push(BoardField::BumpLimit);
        }
        if self.archive_purge_seconds.is_some() {
            fields.push(BoardField::ArchivePurgeSeconds);
        }
        if self.moderation_reasons.is_some() {
            fields.push(BoardField::ModerationReasons);
        }
        fields
    }
}

/// Merge a patch into a board config, then delete the reset fields.
pub fn update_board_config(
    board: &BoardConfig,
    patch: &BoardPatch,
    resets: &[BoardField],
) -> Result<BoardConfig, ConfigError> {
    check_conflicts(patch, resets)?;

    let mut updated = board.clone();
    apply_patch(
        &mut updated.per_page,
        &mut updated.pages,
        &mut updated.bump_limit,
        &mut updated.archive_purge_seconds,
        &mut updated.moderation_reasons,
        patch,
        resets,
    );
    Ok(updated)
}

/// Same edit semantics for the global `defaults` record.
pub fn update_defaults(
    global: &GlobalConfig,
    patch: &BoardPatch,
    resets: &[BoardField],
) -> Result<GlobalConfig, ConfigError> {
    check_conflicts(patch, resets)?;

    let mut updated = global.clone();
    let mut defaults = updated.defaults.take().unwrap_or_default();
    apply_patch(
        &mut defaults.per_page,
        &mut defaults.pages,
        &mut defaults.bump_limit,
        &mut defaults.archive_purge_seconds,
        &mut defaults.moderation_reasons,
        patch,
        resets,
    );
    if defaults != DefaultsConfig::default() {
        updated.defaults = Some(defaults);
    }
    Ok(updated)
}

fn check_conflicts(patch: &BoardPatch, resets: &[BoardField]) -> Result<(), ConfigError> {
    for field in patch.set_fields() {
        if resets.contains(&field) {
            return Err(ConfigError::SetAndReset(field.name()));
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn apply_patch(
    per_page: &mut Option<u64>,
    pages: &mut Option<u64>,
    bump_limit: &mut Option<u64>,
    archive_purge_seconds: &mut Option<u64>,
    moderation_reasons: &mut Option<ModerationReasonsConfig>,
    patch: &BoardPatch,
    resets: &[BoardField],
) {
    if let Some(v) = patch.per_page {
        *per_page = Some(v);
    }
    if let Some(v) = patch.pages {
        *pages = Some(v);
    }
    if let Some(v) = patch.bump_limit {
        *bump_limit = Some(v);
    }
    if let Some(v) = patch.archive_purge_seconds {
        *archive_purge_seconds = Some(v);
    }
    if let Some(v) = &patch.moderation_reasons {
        *moderation_reasons = Some(v.clone());
    }

    for field in resets {
        match field {
            BoardField::PerPage => *per_page = None,
            BoardField::Pages => *pages = None,
            BoardField::BumpLimit => *bump_limit = None,
            BoardField::ArchivePurgeSeconds => *archive_purge_seconds = None,
            BoardField::ModerationReasons => *moderation_reasons = None,
        }
    }
}

#[cfg(test)]
#[path = "update_tests.rs"]
mod tests;
