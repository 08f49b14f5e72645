// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod board;
pub mod defaults;
pub mod start;

use anyhow::{bail, Result};
use bm_config::{BoardField, BoardPatch};

/// Worker tunables shared by `board add`, `board edit` and `defaults set`.
#[derive(Debug, Default, clap::Args)]
pub struct TunableFlags {
    /// Threads shown per page
    #[arg(long, value_name = "N")]
    pub per_page: Option<u64>,

    /// Pages of threads kept before the overflow is archived
    #[arg(long, value_name = "N")]
    pub pages: Option<u64>,

    /// Reply count at which a thread is archived
    #[arg(long, value_name = "N")]
    pub bump_limit: Option<u64>,

    /// Seconds an archived thread is retained before purging
    #[arg(long, value_name = "N")]
    pub archive_purge_seconds: Option<u64>,
}

impl TunableFlags {
    /// Convert the flags into a config patch, refusing zeros up front so
    /// they never reach a config file that would then fail validation.
    pub fn patch(&self) -> Result<BoardPatch> {
        for (name, value) in [
            ("--per-page", self.per_page),
            ("--pages", self.pages),
            ("--bump-limit", self.bump_limit),
            ("--archive-purge-seconds", self.archive_purge_seconds),
        ] {
            if value == Some(0) {
                bail!("{name} must be a positive integer");
            }
        }
        Ok(BoardPatch {
            per_page: self.per_page,
            pages: self.pages,
            bump_limit: self.bump_limit,
            archive_purge_seconds: self.archive_purge_seconds,
            moderation_reasons: None,
        })
    }
}

/// Parse a `--reset` comma list into config fields.
pub fn parse_resets(resets: &[String]) -> Result<Vec<BoardField>> {
    resets
        .iter()
        .map(|name| {
            name.parse::<BoardField>()
                .map_err(|e| anyhow::anyhow!("--reset: {e}"))
        })
        .collect()
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
