// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket RPC client.
//!
//! JSON-RPC 2.0 over one socket per worker. Requests are correlated by id;
//! the server pushes two notification kinds: `subplebbitsChange` (the
//! hosted-boards list, sent once right after the socket opens and again on
//! every change) and `subplebbitUpdate` (a board's view may have changed).
//! `connect` resolves only after the first hosted-boards notification, so a
//! returned client always knows what the server hosts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::USER_AGENT;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use bm_core::Page;

use crate::rpc::{BoardView, Role, RpcClient, RpcConnector, RpcError};
use crate::signer::{ModerationRecord, Signer};

/// How long `connect` waits for the server's initial hosted-boards push.
const READY_TIMEOUT: Duration = Duration::from_secs(30);

/// Opens [`WsRpcClient`] connections.
#[derive(Debug, Clone, Default)]
pub struct WsConnector;

#[async_trait]
impl RpcConnector for WsConnector {
    async fn connect(
        &self,
        rpc_url: &str,
        user_agent: &str,
    ) -> Result<Arc<dyn RpcClient>, RpcError> {
        let client = WsRpcClient::connect(rpc_url, user_agent).await?;
        Ok(Arc::new(client))
    }
}

pub struct WsRpcClient {
    shared: Arc<Shared>,
}

struct Shared {
    out_tx: mpsc::Sender<Message>,
    pending: Mutex<HashMap<u64, oneshot::Sender<Result<Value, RpcError>>>>,
    next_id: AtomicU64,
    hosted: Mutex<Vec<String>>,
    subscribers: Mutex<HashMap<String, mpsc::Sender<()>>>,
    ready_tx: Mutex<Option<oneshot::Sender<()>>>,
    shutdown: CancellationToken,
}

impl WsRpcClient {
    pub async fn connect(rpc_url: &str, user_agent: &str) -> Result<Self, RpcError> {
        let connect_err = |message: String| RpcError::Connect {
            url: rpc_url.to_string(),
            message,
        };

        let mut request = rpc_url
            .into_client_request()
            .map_err(|e| connect_err(e.to_string()))?;
        request.headers_mut().insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent).map_err(|e| connect_err(e.to_string()))?,
        );

        let (stream, _) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| connect_err(e.to_string()))?;
        let (mut write, mut read) = stream.split();

        let (out_tx, mut out_rx) = mpsc::channel::<Message>(64);
        let (ready_tx, ready_rx) = oneshot::channel();
        let shared = Arc::new(Shared {
            out_tx,
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            hosted: Mutex::new(Vec::new()),
            subscribers: Mutex::new(HashMap::new()),
            ready_tx: Mutex::new(Some(ready_tx)),
            shutdown: CancellationToken::new(),
        });

        // Writer task: drains the outbound queue until shutdown.
        let writer_shutdown = shared.shutdown.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = writer_shutdown.cancelled() => {
                        let _ = write.send(Message::Close(None)).await;
                        break;
                    }
                    msg = out_rx.recv() => match msg {
                        Some(msg) => {
                            if write.send(msg).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }
        });

        // Reader task: dispatches responses and notifications.
        let reader_shared = Arc::clone(&shared);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = reader_shared.shutdown.cancelled() => break,
                    msg = read.next() => match msg {
                        Some(Ok(Message::Text(text))) => reader_shared.dispatch(&text),
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Err(e)) => {
                            warn!(error = %e, "rpc socket error");
                            break;
                        }
                        Some(Ok(_)) => {} // Ping/Pong/Binary — ignore
                    }
                }
            }
            reader_shared.fail_pending();
        });

        match tokio::time::timeout(READY_TIMEOUT, ready_rx).await {
            Ok(Ok(())) => Ok(Self { shared }),
            Ok(Err(_)) => Err(RpcError::ConnectionClosed),
            Err(_) => Err(RpcError::ReadyTimeout),
        }
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.shared.pending.lock().insert(id, tx);

        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        if self
            .shared
            .out_tx
            .send(Message::Text(payload.to_string().into()))
            .await
            .is_err()
        {
            self.shared.pending.lock().remove(&id);
            return Err(RpcError::ConnectionClosed);
        }

        match rx.await {
            Ok(result) => result,
            Err(_) => Err(RpcError::ConnectionClosed),
        }
    }
}

impl Shared {
    fn dispatch(&self, text: &str) {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "unparseable rpc message");
                return;
            }
        };

        if let Some(id) = value.get("id").and_then(Value::as_u64) {
            let Some(tx) = self.pending.lock().remove(&id) else {
                debug!(id, "response for unknown request id");
                return;
            };
            let result = if let Some(error) = value.get("error") {
                Err(RpcError::Server {
                    code: error.get("code").and_then(Value::as_i64).unwrap_or(0),
                    message: error
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error")
                        .to_string(),
                })
            } else {
                Ok(value.get("result").cloned().unwrap_or(Value::Null))
            };
            let _ = tx.send(result);
            return;
        }

        match value.get("method").and_then(Value::as_str) {
            Some("subplebbitsChange") => {
                let hosted: Vec<String> = value
                    .pointer("/params/subplebbits")
                    .and_then(|v| serde_json::from_value(v.clone()).ok())
                    .unwrap_or_default();
                *self.hosted.lock() = hosted;
                if let Some(tx) = self.ready_tx.lock().take() {
                    let _ = tx.send(());
                }
            }
            Some("subplebbitUpdate") => {
                let Some(address) = value.pointer("/params/address").and_then(Value::as_str)
                else {
                    return;
                };
                if let Some(tx) = self.subscribers.lock().get(address) {
                    // try_send: a full buffer already guarantees a rerun
                    let _ = tx.try_send(());
                }
            }
            other => debug!(method = ?other, "ignoring rpc notification"),
        }
    }

    /// Dropping the senders resolves every waiter with `ConnectionClosed`.
    fn fail_pending(&self) {
        self.pending.lock().clear();
    }
}

#[async_trait]
impl RpcClient for WsRpcClient {
    async fn create_signer(&self, private_key: Option<&str>) -> Result<Signer, RpcError> {
        // Key material never crosses the socket.
        match private_key {
            Some(key) => Signer::from_private_key(key),
            None => Ok(Signer::generate()),
        }
    }

    async fn get_board(&self, address: &str) -> Result<BoardView, RpcError> {
        let result = self
            .request("getSubplebbit", json!({"address": address}))
            .await?;
        serde_json::from_value(result).map_err(|e| RpcError::Payload(e.to_string()))
    }

    async fn get_page(
        &self,
        address: &str,
        page_cid: &str,
        parent_cid: Option<&str>,
    ) -> Result<Page, RpcError> {
        let mut params = json!({
            "subplebbitAddress": address,
            "pageCid": page_cid,
        });
        if let Some(parent) = parent_cid {
            params["commentCid"] = Value::String(parent.to_string());
        }
        let result = self.request("getPage", params).await?;
        serde_json::from_value(result).map_err(|e| RpcError::Payload(e.to_string()))
    }

    async fn publish_moderation(&self, record: &ModerationRecord) -> Result<(), RpcError> {
        let params =
            serde_json::to_value(record).map_err(|e| RpcError::Payload(e.to_string()))?;
        self.request("publishCommentModeration", params).await?;
        Ok(())
    }

    async fn edit_board_roles(
        &self,
        address: &str,
        roles: HashMap<String, Role>,
    ) -> Result<(), RpcError> {
        let roles = serde_json::to_value(roles).map_err(|e| RpcError::Payload(e.to_string()))?;
        self.request(
            "editSubplebbit",
            json!({"address": address, "roles": roles}),
        )
        .await?;
        Ok(())
    }

    async fn local_boards(&self) -> Result<Vec<String>, RpcError> {
        Ok(self.shared.hosted.lock().clone())
    }

    fn subscribe(&self, address: &str, updates: mpsc::Sender<()>) {
        self.shared
            .subscribers
            .lock()
            .insert(address.to_string(), updates);
    }

    fn unsubscribe(&self, address: &str) {
        self.shared.subscribers.lock().remove(address);
    }

    async fn start_board(&self, address: &str) -> Result<(), RpcError> {
        self.request("startSubplebbitUpdates", json!({"address": address}))
            .await?;
        Ok(())
    }

    async fn stop_board(&self, address: &str) -> Result<(), RpcError> {
        self.request("stopSubplebbitUpdates", json!({"address": address}))
            .await?;
        Ok(())
    }

    async fn destroy(&self) -> Result<(), RpcError> {
        self.shared.shutdown.cancel();
        Ok(())
    }
}

#[cfg(test)]
#[path = "ws_tests.rs"]
mod tests;
