// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker option resolution: per-board overrides over global defaults over
//! environment over built-ins.

use std::path::Path;

use bm_core::{WorkerOptions, DEFAULT_RPC_URL};

use crate::model::{BoardConfig, GlobalConfig};
use crate::store;

/// Environment fallback for the RPC endpoint, consulted between the global
/// config and the built-in default.
pub const RPC_URL_ENV: &str = "PLEBBIT_RPC_WS_URL";

pub fn resolve_options(
    board: &BoardConfig,
    global: &GlobalConfig,
    config_dir: &Path,
) -> WorkerOptions {
    let defaults = global.defaults.clone().unwrap_or_default();

    let reasons = match (&board.moderation_reasons, &defaults.moderation_reasons) {
        (None, None) => None,
        (board_reasons, default_reasons) => Some(
            board_reasons
                .clone()
                .unwrap_or_default()
                .merged_over(&default_reasons.clone().unwrap_or_default()),
        ),
    };

    WorkerOptions {
        address: board.address.clone(),
        rpc_url: global
            .rpc_url
            .clone()
            .or_else(|| std::env::var(RPC_URL_ENV).ok())
            .unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
        user_agent: global.user_agent.clone(),
        board_dir: store::boards_dir(config_dir).join(&board.address),
        per_page: board.per_page.or(defaults.per_page),
        pages: board.pages.or(defaults.pages),
        bump_limit: board.bump_limit.or(defaults.bump_limit),
        archive_purge_seconds: board
            .archive_purge_seconds
            .or(defaults.archive_purge_seconds),
        reasons,
    }
}

#[cfg(test)]
#[path = "options_tests.rs"]
mod tests;
