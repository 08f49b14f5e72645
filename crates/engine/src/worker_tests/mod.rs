// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

mod lifecycle;
mod migration;
mod rules;

use super::*;
use bm_adapters::{FakeConnector, FakeRpcClient};
use bm_core::{FakeClock, Page, PostsView, DEFAULT_RPC_URL};
use std::collections::HashMap;

struct TestHarness {
    fake: FakeRpcClient,
    clock: FakeClock,
    task: WorkerTask<FakeClock>,
    _dir: tempfile::TempDir,
}

fn thread(cid: &str, last_reply: u64, post_number: u64) -> Thread {
    Thread {
        cid: cid.to_string(),
        last_reply_timestamp: last_reply,
        post_number,
        ..Thread::default()
    }
}

/// A board whose posts arrive as one preloaded page.
fn board(address: &str, threads: Vec<Thread>) -> BoardView {
    let mut posts = PostsView::default();
    posts.pages.insert(
        "hot".to_string(),
        Page {
            comments: threads,
            next_cid: None,
        },
    );
    BoardView {
        address: address.to_string(),
        roles: HashMap::new(),
        posts,
    }
}

fn test_options(dir: &std::path::Path, address: &str) -> WorkerOptions {
    WorkerOptions {
        address: address.to_string(),
        rpc_url: DEFAULT_RPC_URL.to_string(),
        user_agent: None,
        board_dir: dir.join("boards").join(address),
        per_page: Some(1),
        pages: Some(2),
        bump_limit: Some(1_000),
        archive_purge_seconds: Some(100),
        reasons: None,
    }
}

/// Build a [`WorkerTask`] around a scripted board, skipping the start
/// handshake so sweeps can be driven directly.
fn harness_with(board_view: BoardView, tweak: impl FnOnce(&mut WorkerOptions)) -> TestHarness {
    let dir = tempfile::tempdir().unwrap();
    let address = board_view.address.clone();
    let mut options = test_options(dir.path(), &address);
    tweak(&mut options);

    let fake = FakeRpcClient::new();
    fake.set_board(address.clone(), board_view);

    let settings = options.settings();
    let state_path = options.board_dir.join(STATE_FILE);
    let lock = StateLock::acquire(&state_path).unwrap();
    let clock = FakeClock::new();
    let (update_tx, _update_rx) = mpsc::channel(1);

    let task = WorkerTask {
        address,
        board_dir: options.board_dir.clone(),
        state_path,
        settings,
        client: Arc::new(fake.clone()),
        clock: clock.clone(),
        state: BoardState::default(),
        lock,
        signer: Signer::generate(),
        purged: HashSet::new(),
        cancel: CancellationToken::new(),
        on_address_change: Arc::new(|_: &str, _: &str| Ok(())),
        update_tx,
    };

    TestHarness {
        fake,
        clock,
        task,
        _dir: dir,
    }
}

fn harness(board_view: BoardView) -> TestHarness {
    harness_with(board_view, |_| {})
}

/// `(cid, is_archive, reason)` per published record, in publish order.
fn published(fake: &FakeRpcClient) -> Vec<(String, bool, String)> {
    fake.published()
        .into_iter()
        .map(|record| {
            (
                record.comment_cid,
                record.comment_moderation.is_archive(),
                record.comment_moderation.reason,
            )
        })
        .collect()
}
