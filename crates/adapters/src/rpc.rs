// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The RPC capability set.
//!
//! The daemon treats the RPC server as a client library: fetch a board and
//! its pages, publish signed moderation records, self-grant the moderator
//! role on locally hosted boards, and stream update notifications. Calls
//! return when the RPC acknowledges receipt, not when an action has
//! federated.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use bm_core::{Page, PostsView};

use crate::signer::{ModerationRecord, Signer};

/// Errors from RPC adapter operations
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("connect to {url} failed: {message}")]
    Connect { url: String, message: String },

    #[error("timed out waiting for the RPC hosted-boards list")]
    ReadyTimeout,

    #[error("RPC connection closed")]
    ConnectionClosed,

    #[error("RPC error {code}: {message}")]
    Server { code: i64, message: String },

    #[error("unexpected RPC payload: {0}")]
    Payload(String),

    #[error("invalid signer key: {0}")]
    InvalidKey(String),
}

/// A board record as seen through the RPC.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoardView {
    pub address: String,
    pub roles: HashMap<String, Role>,
    pub posts: PostsView,
}

/// A role grant on a board, keyed by signer address in [`BoardView::roles`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub role: String,
}

impl Role {
    pub fn moderator() -> Self {
        Self {
            role: "moderator".to_string(),
        }
    }

    /// Moderator, admin and owner can all publish moderation records.
    pub fn grants_moderation(&self) -> bool {
        matches!(self.role.as_str(), "moderator" | "admin" | "owner")
    }
}

/// One RPC connection. Safe for concurrent calls; one instance per worker.
#[async_trait]
pub trait RpcClient: Send + Sync {
    /// Create an Ed25519 signer, recreating from a stored private key when
    /// one is given.
    async fn create_signer(&self, private_key: Option<&str>) -> Result<Signer, RpcError>;

    async fn get_board(&self, address: &str) -> Result<BoardView, RpcError>;

    /// Fetch one page of a board's posts, or of a comment's replies when
    /// `parent_cid` is given.
    async fn get_page(
        &self,
        address: &str,
        page_cid: &str,
        parent_cid: Option<&str>,
    ) -> Result<Page, RpcError>;

    async fn publish_moderation(&self, record: &ModerationRecord) -> Result<(), RpcError>;

    async fn edit_board_roles(
        &self,
        address: &str,
        roles: HashMap<String, Role>,
    ) -> Result<(), RpcError>;

    /// Addresses of boards this RPC server hosts locally.
    async fn local_boards(&self) -> Result<Vec<String>, RpcError>;

    /// Register for update notifications on a board. Notifications are
    /// delivered with `try_send`, so a bounded channel doubles as the
    /// coalescing buffer.
    fn subscribe(&self, address: &str, updates: mpsc::Sender<()>);

    fn unsubscribe(&self, address: &str);

    /// Begin the board's update stream.
    async fn start_board(&self, address: &str) -> Result<(), RpcError>;

    /// Stop the board's update stream.
    async fn stop_board(&self, address: &str) -> Result<(), RpcError>;

    /// Tear down the connection.
    async fn destroy(&self) -> Result<(), RpcError>;
}

/// Opens RPC connections. Injected so tests can hand workers a fake.
#[async_trait]
pub trait RpcConnector: Send + Sync {
    async fn connect(&self, rpc_url: &str, user_agent: &str)
        -> Result<Arc<dyn RpcClient>, RpcError>;
}

#[cfg(test)]
#[path = "rpc_tests.rs"]
mod tests;
