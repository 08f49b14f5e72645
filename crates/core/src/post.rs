// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Views of the federated post graph as exposed by the RPC.
//!
//! Threads and replies share one shape; a reply is reached through its
//! parent's `replies` pages. Only the fields the moderation rules consume
//! are modelled; everything else in the RPC record is ignored on
//! deserialization.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A top-level post (or, transitively, a reply) as seen through the RPC.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Thread {
    pub cid: String,
    pub pinned: bool,
    pub archived: bool,
    pub deleted: bool,
    pub reply_count: u64,
    pub last_reply_timestamp: u64,
    pub post_number: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replies: Option<Replies>,
}

impl Thread {
    /// Active-order comparison: most recently bumped first, post number as
    /// the tiebreaker (newer post wins).
    pub fn active_order(&self, other: &Thread) -> Ordering {
        other
            .last_reply_timestamp
            .cmp(&self.last_reply_timestamp)
            .then(other.post_number.cmp(&self.post_number))
    }
}

/// An ordered slice of posts plus an optional continuation cid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Page {
    pub comments: Vec<Thread>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cid: Option<String>,
}

/// A comment's reply surface: preloaded first pages by sort key, plus
/// page-cid heads for sorts that were too large to preload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Replies {
    pub pages: HashMap<String, Page>,
    pub page_cids: HashMap<String, String>,
}

/// The board-level post surface. Same shape as [`Replies`] but kept as its
/// own type because the empty-board short-circuit is defined on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostsView {
    pub pages: HashMap<String, Page>,
    pub page_cids: HashMap<String, String>,
}

impl PostsView {
    /// True when the board has an active chain head or any preloaded page.
    /// When false, the board has no posts and an update can be skipped.
    pub fn has_content(&self) -> bool {
        self.page_cids.contains_key("active") || !self.pages.is_empty()
    }
}

#[cfg(test)]
#[path = "post_tests.rs"]
mod tests;
