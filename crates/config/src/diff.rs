// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declared-state diffing for hot reload.

use std::collections::HashMap;

use crate::model::{BoardConfig, GlobalConfig};

/// The difference between two declared board sets.
///
/// `added` and `removed` compare by address; `changed` holds the new config
/// of every board present in both sets with any differing tunable
/// (including per-key `moderationReasons` differences).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardsDiff {
    pub added: Vec<BoardConfig>,
    pub removed: Vec<String>,
    pub changed: Vec<BoardConfig>,
}

impl BoardsDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

pub fn diff_boards(old: &[BoardConfig], new: &[BoardConfig]) -> BoardsDiff {
    let old_by_address: HashMap<&str, &BoardConfig> =
        old.iter().map(|b| (b.address.as_str(), b)).collect();
    let new_by_address: HashMap<&str, &BoardConfig> =
        new.iter().map(|b| (b.address.as_str(), b)).collect();

    let mut diff = BoardsDiff::default();
    for board in new {
        match old_by_address.get(board.address.as_str()) {
            None => diff.added.push(board.clone()),
            Some(previous) if *previous != board => diff.changed.push(board.clone()),
            Some(_) => {}
        }
    }
    for board in old {
        if !new_by_address.contains_key(board.address.as_str()) {
            diff.removed.push(board.address.clone());
        }
    }
    diff
}

/// True when any global field workers depend on differs; the supervisor
/// promotes every surviving board into `changed` when this fires.
pub fn global_changed(old: &GlobalConfig, new: &GlobalConfig) -> bool {
    old.rpc_url != new.rpc_url
        || old.state_dir != new.state_dir
        || old.user_agent != new.user_agent
        || old.defaults != new.defaults
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod tests;
