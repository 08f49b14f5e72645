// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake RPC client for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use bm_core::Page;

use crate::rpc::{BoardView, Role, RpcClient, RpcConnector, RpcError};
use crate::signer::{ModerationRecord, Signer};

/// Recorded call to [`FakeRpcClient`]
#[derive(Debug, Clone, PartialEq)]
pub enum RpcCall {
    GetBoard { address: String },
    GetPage { page_cid: String, parent_cid: Option<String> },
    EditRoles { address: String },
    StartBoard { address: String },
    StopBoard { address: String },
    Destroy,
}

/// Fake RPC client for testing
///
/// Boards and pages are scripted; every publish and lifecycle call is
/// recorded. Clones share state, so a test can keep a handle while the
/// worker under test owns another.
#[derive(Clone, Default)]
pub struct FakeRpcClient {
    inner: Arc<Mutex<FakeRpcState>>,
}

#[derive(Default)]
struct FakeRpcState {
    boards: HashMap<String, BoardView>,
    pages: HashMap<String, Page>,
    hosted: Vec<String>,
    published: Vec<ModerationRecord>,
    calls: Vec<RpcCall>,
    subscribers: HashMap<String, mpsc::Sender<()>>,
    failing_publish_cids: HashSet<String>,
    fail_all_publishes: bool,
    get_board_delay_ms: u64,
    destroyed: bool,
}

impl FakeRpcClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a board record. `get_board` looks boards up by the address
    /// they are stored under, so renames are scripted by re-keying.
    pub fn set_board(&self, key: impl Into<String>, board: BoardView) {
        self.inner.lock().boards.insert(key.into(), board);
    }

    /// Script one fetchable page by cid.
    pub fn set_page(&self, page_cid: impl Into<String>, page: Page) {
        self.inner.lock().pages.insert(page_cid.into(), page);
    }

    pub fn set_hosted(&self, addresses: Vec<String>) {
        self.inner.lock().hosted = addresses;
    }

    /// All successfully published moderation records, in publish order.
    pub fn published(&self) -> Vec<ModerationRecord> {
        self.inner.lock().published.clone()
    }

    pub fn calls(&self) -> Vec<RpcCall> {
        self.inner.lock().calls.clone()
    }

    pub fn get_board_calls(&self, address: &str) -> usize {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| {
                matches!(c, RpcCall::GetBoard { address: a } if a == address)
            })
            .count()
    }

    /// Make publishes for one cid fail.
    pub fn fail_publish_for(&self, cid: impl Into<String>) {
        self.inner.lock().failing_publish_cids.insert(cid.into());
    }

    pub fn clear_publish_failures(&self) {
        let mut inner = self.inner.lock();
        inner.failing_publish_cids.clear();
        inner.fail_all_publishes = false;
    }

    pub fn fail_all_publishes(&self) {
        self.inner.lock().fail_all_publishes = true;
    }

    /// Slow down `get_board` to widen the in-flight window in
    /// coalescing tests.
    pub fn set_get_board_delay_ms(&self, ms: u64) {
        self.inner.lock().get_board_delay_ms = ms;
    }

    pub fn destroyed(&self) -> bool {
        self.inner.lock().destroyed
    }

    /// Deliver an update notification to the board's subscriber, exactly
    /// like the transport does (lossy `try_send`).
    pub fn push_update(&self, address: &str) {
        let subscriber = self.inner.lock().subscribers.get(address).cloned();
        if let Some(tx) = subscriber {
            let _ = tx.try_send(());
        }
    }

    pub fn has_subscriber(&self, address: &str) -> bool {
        self.inner.lock().subscribers.contains_key(address)
    }
}

#[async_trait]
impl RpcClient for FakeRpcClient {
    async fn create_signer(&self, private_key: Option<&str>) -> Result<Signer, RpcError> {
        match private_key {
            Some(key) => Signer::from_private_key(key),
            None => Ok(Signer::generate()),
        }
    }

    async fn get_board(&self, address: &str) -> Result<BoardView, RpcError> {
        let delay = {
            let mut inner = self.inner.lock();
            inner.calls.push(RpcCall::GetBoard {
                address: address.to_string(),
            });
            inner.get_board_delay_ms
        };
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        }
        self.inner
            .lock()
            .boards
            .get(address)
            .cloned()
            .ok_or_else(|| RpcError::Server {
                code: -32000,
                message: format!("subplebbit {address} not found"),
            })
    }

    async fn get_page(
        &self,
        _address: &str,
        page_cid: &str,
        parent_cid: Option<&str>,
    ) -> Result<Page, RpcError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RpcCall::GetPage {
            page_cid: page_cid.to_string(),
            parent_cid: parent_cid.map(str::to_string),
        });
        inner
            .pages
            .get(page_cid)
            .cloned()
            .ok_or_else(|| RpcError::Server {
                code: -32000,
                message: format!("page {page_cid} not found"),
            })
    }

    async fn publish_moderation(&self, record: &ModerationRecord) -> Result<(), RpcError> {
        let mut inner = self.inner.lock();
        if inner.fail_all_publishes || inner.failing_publish_cids.contains(&record.comment_cid) {
            return Err(RpcError::Server {
                code: -32001,
                message: "publish rejected".to_string(),
            });
        }
        inner.published.push(record.clone());
        Ok(())
    }

    async fn edit_board_roles(
        &self,
        address: &str,
        roles: HashMap<String, Role>,
    ) -> Result<(), RpcError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RpcCall::EditRoles {
            address: address.to_string(),
        });
        match inner.boards.get_mut(address) {
            Some(board) => {
                board.roles = roles;
                Ok(())
            }
            None => Err(RpcError::Server {
                code: -32000,
                message: format!("subplebbit {address} not found"),
            }),
        }
    }

    async fn local_boards(&self) -> Result<Vec<String>, RpcError> {
        Ok(self.inner.lock().hosted.clone())
    }

    fn subscribe(&self, address: &str, updates: mpsc::Sender<()>) {
        self.inner
            .lock()
            .subscribers
            .insert(address.to_string(), updates);
    }

    fn unsubscribe(&self, address: &str) {
        self.inner.lock().subscribers.remove(address);
    }

    async fn start_board(&self, address: &str) -> Result<(), RpcError> {
        self.inner.lock().calls.push(RpcCall::StartBoard {
            address: address.to_string(),
        });
        Ok(())
    }

    async fn stop_board(&self, address: &str) -> Result<(), RpcError> {
        self.inner.lock().calls.push(RpcCall::StopBoard {
            address: address.to_string(),
        });
        Ok(())
    }

    async fn destroy(&self) -> Result<(), RpcError> {
        let mut inner = self.inner.lock();
        inner.calls.push(RpcCall::Destroy);
        inner.destroyed = true;
        Ok(())
    }
}

/// Connector handing every worker the same shared fake client.
#[derive(Clone, Default)]
pub struct FakeConnector {
    client: FakeRpcClient,
    fail_connect: Arc<Mutex<bool>>,
    connects: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeConnector {
    pub fn new(client: FakeRpcClient) -> Self {
        Self {
            client,
            fail_connect: Arc::new(Mutex::new(false)),
            connects: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn client(&self) -> &FakeRpcClient {
        &self.client
    }

    pub fn set_fail_connect(&self, fail: bool) {
        *self.fail_connect.lock() = fail;
    }

    /// `(rpc_url, user_agent)` pairs, one per connection attempt.
    pub fn connects(&self) -> Vec<(String, String)> {
        self.connects.lock().clone()
    }
}

#[async_trait]
impl RpcConnector for FakeConnector {
    async fn connect(
        &self,
        rpc_url: &str,
        user_agent: &str,
    ) -> Result<Arc<dyn RpcClient>, RpcError> {
        self.connects
            .lock()
            .push((rpc_url.to_string(), user_agent.to_string()));
        if *self.fail_connect.lock() {
            return Err(RpcError::Connect {
                url: rpc_url.to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(Arc::new(self.client.clone()))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
