// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bm-adapters: the RPC client seam.
//!
//! Everything the daemon knows about the RPC server is the [`RpcClient`]
//! capability set; the WebSocket implementation and the test fake both live
//! behind it.

pub mod rpc;
pub mod signer;
pub mod ws;

pub use rpc::{BoardView, Role, RpcClient, RpcConnector, RpcError};
pub use signer::{ModerationRecord, RecordSignature, Signer};
pub use ws::{WsConnector, WsRpcClient};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeConnector, FakeRpcClient, RpcCall};
