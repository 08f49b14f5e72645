// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bm_adapters::{BoardView, FakeConnector, FakeRpcClient};
use bm_config::{save_board_config, save_global_config, update_board_config, BoardPatch};
use bm_core::{FakeClock, SystemClock};
use std::time::Duration;

fn scripted_board(address: &str) -> BoardView {
    BoardView {
        address: address.to_string(),
        ..BoardView::default()
    }
}

/// A connector hosting the given boards, so workers can self-grant.
fn connector_for(addresses: &[&str]) -> FakeConnector {
    let fake = FakeRpcClient::new();
    for address in addresses {
        fake.set_board(*address, scripted_board(address));
    }
    fake.set_hosted(addresses.iter().map(|a| a.to_string()).collect());
    FakeConnector::new(fake)
}

fn declare_board(config_dir: &Path, address: &str) {
    save_board_config(config_dir, &BoardConfig::new(address)).unwrap();
}

async fn start_supervisor(
    config_dir: &Path,
    connector: &FakeConnector,
) -> Result<Supervisor<FakeClock>, SupervisorError> {
    Supervisor::start(
        config_dir.to_path_buf(),
        Arc::new(connector.clone()),
        FakeClock::new(),
    )
    .await
}

#[tokio::test]
async fn startup_starts_every_declared_board() {
    let dir = tempfile::tempdir().unwrap();
    declare_board(dir.path(), "alpha");
    declare_board(dir.path(), "beta");
    let connector = connector_for(&["alpha", "beta"]);

    let supervisor = start_supervisor(dir.path(), &connector).await.unwrap();

    assert_eq!(supervisor.worker_addresses(), ["alpha", "beta"]);
    assert!(supervisor.start_errors().is_empty());

    supervisor.stop().await;
    assert!(supervisor.worker_addresses().is_empty());
}

#[tokio::test]
async fn partial_startup_failure_is_recorded_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    declare_board(dir.path(), "alpha");
    declare_board(dir.path(), "ghost");
    // "ghost" is not scripted on the RPC, so its worker start fails.
    let connector = connector_for(&["alpha"]);

    let supervisor = start_supervisor(dir.path(), &connector).await.unwrap();

    assert_eq!(supervisor.worker_addresses(), ["alpha"]);
    let failures = supervisor.start_errors();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "ghost");

    supervisor.stop().await;
}

#[tokio::test]
async fn total_startup_failure_raises_aggregate_error() {
    let dir = tempfile::tempdir().unwrap();
    declare_board(dir.path(), "ghost1");
    declare_board(dir.path(), "ghost2");
    let connector = connector_for(&[]);

    match start_supervisor(dir.path(), &connector).await {
        Err(SupervisorError::AllBoardsFailed { failures }) => {
            assert_eq!(failures.len(), 2);
            let addresses: Vec<&str> = failures.iter().map(|(a, _)| a.as_str()).collect();
            assert_eq!(addresses, ["ghost1", "ghost2"]);
        }
        other => panic!("expected AllBoardsFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_config_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("global.json"), "[]").unwrap();
    let connector = connector_for(&[]);

    assert!(matches!(
        start_supervisor(dir.path(), &connector).await,
        Err(SupervisorError::Config(_))
    ));
}

#[tokio::test]
async fn reconcile_starts_added_boards() {
    let dir = tempfile::tempdir().unwrap();
    declare_board(dir.path(), "alpha");
    let connector = connector_for(&["alpha", "beta"]);

    let supervisor = start_supervisor(dir.path(), &connector).await.unwrap();
    assert_eq!(supervisor.worker_addresses(), ["alpha"]);

    declare_board(dir.path(), "beta");
    supervisor.reconcile().await;

    assert_eq!(supervisor.worker_addresses(), ["alpha", "beta"]);
    supervisor.stop().await;
}

#[tokio::test]
async fn reconcile_stops_removed_boards() {
    let dir = tempfile::tempdir().unwrap();
    declare_board(dir.path(), "alpha");
    declare_board(dir.path(), "beta");
    let connector = connector_for(&["alpha", "beta"]);

    let supervisor = start_supervisor(dir.path(), &connector).await.unwrap();

    bm_config::delete_board_config(dir.path(), "beta").unwrap();
    supervisor.reconcile().await;

    assert_eq!(supervisor.worker_addresses(), ["alpha"]);
    assert!(connector
        .client()
        .calls()
        .contains(&bm_adapters::RpcCall::StopBoard {
            address: "beta".to_string()
        }));
    supervisor.stop().await;
}

#[tokio::test]
async fn reconcile_restarts_changed_boards() {
    let dir = tempfile::tempdir().unwrap();
    declare_board(dir.path(), "alpha");
    let connector = connector_for(&["alpha"]);

    let supervisor = start_supervisor(dir.path(), &connector).await.unwrap();
    assert_eq!(connector.connects().len(), 1);

    let board = BoardConfig::new("alpha");
    let patch = BoardPatch {
        per_page: Some(5),
        ..BoardPatch::default()
    };
    save_board_config(dir.path(), &update_board_config(&board, &patch, &[]).unwrap()).unwrap();
    supervisor.reconcile().await;

    assert_eq!(supervisor.worker_addresses(), ["alpha"]);
    // Stop + fresh connection for the restarted worker.
    assert_eq!(connector.connects().len(), 2);
    supervisor.stop().await;
}

#[tokio::test]
async fn global_change_restarts_every_surviving_board() {
    let dir = tempfile::tempdir().unwrap();
    declare_board(dir.path(), "alpha");
    declare_board(dir.path(), "beta");
    let connector = connector_for(&["alpha", "beta"]);

    let supervisor = start_supervisor(dir.path(), &connector).await.unwrap();
    assert_eq!(connector.connects().len(), 2);

    let global = GlobalConfig {
        user_agent: Some("new-agent".to_string()),
        ..GlobalConfig::default()
    };
    save_global_config(dir.path(), &global).unwrap();
    supervisor.reconcile().await;

    assert_eq!(supervisor.worker_addresses(), ["alpha", "beta"]);
    assert_eq!(connector.connects().len(), 4);
    // The re-resolved options carry the new global value.
    assert!(connector
        .connects()
        .iter()
        .skip(2)
        .all(|(_, agent)| agent == "new-agent"));
    supervisor.stop().await;
}

#[tokio::test]
async fn invalid_reload_keeps_the_running_set() {
    let dir = tempfile::tempdir().unwrap();
    declare_board(dir.path(), "alpha");
    let connector = connector_for(&["alpha", "beta"]);

    let supervisor = start_supervisor(dir.path(), &connector).await.unwrap();

    std::fs::write(dir.path().join("global.json"), "{broken").unwrap();
    declare_board(dir.path(), "beta");
    supervisor.reconcile().await;
    // Cycle skipped: beta not started, alpha untouched.
    assert_eq!(supervisor.worker_addresses(), ["alpha"]);
    assert_eq!(connector.connects().len(), 1);

    std::fs::remove_file(dir.path().join("global.json")).unwrap();
    supervisor.reconcile().await;
    assert_eq!(supervisor.worker_addresses(), ["alpha", "beta"]);

    supervisor.stop().await;
}

#[tokio::test]
async fn reconcile_after_stop_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    declare_board(dir.path(), "alpha");
    let connector = connector_for(&["alpha", "beta"]);

    let supervisor = start_supervisor(dir.path(), &connector).await.unwrap();
    supervisor.stop().await;

    declare_board(dir.path(), "beta");
    supervisor.reconcile().await;
    assert!(supervisor.worker_addresses().is_empty());
}

#[tokio::test]
async fn stop_releases_every_board_lock() {
    let dir = tempfile::tempdir().unwrap();
    declare_board(dir.path(), "alpha");
    declare_board(dir.path(), "beta");
    let connector = connector_for(&["alpha", "beta"]);

    let supervisor = start_supervisor(dir.path(), &connector).await.unwrap();
    let alpha_lock = bm_config::boards_dir(dir.path())
        .join("alpha")
        .join("state.json.lock");
    assert!(alpha_lock.exists());

    supervisor.stop().await;
    assert!(!alpha_lock.exists());
    assert!(connector.client().destroyed());
}

#[tokio::test]
async fn rpc_address_rename_rekeys_worker_and_directory() {
    let dir = tempfile::tempdir().unwrap();
    declare_board(dir.path(), "alpha");
    let connector = connector_for(&["alpha"]);

    let supervisor = Supervisor::start(
        dir.path().to_path_buf(),
        Arc::new(connector.clone()),
        SystemClock,
    )
    .await
    .unwrap();

    // The RPC now reports the board under a human-readable name.
    connector
        .client()
        .set_board("alpha", scripted_board("general.eth"));
    connector.client().push_update("alpha");

    // Give the worker a moment to migrate.
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(supervisor.worker_addresses(), ["general.eth"]);
    let boards = bm_config::boards_dir(dir.path());
    assert!(!boards.join("alpha").exists());
    assert!(boards.join("general.eth").join("state.json").exists());

    supervisor.stop().await;
}
