// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker start/stop, signer persistence, moderator bootstrap, coalescing.

use super::*;
use std::time::Duration;

fn noop_hook() -> AddressChangeHook {
    Arc::new(|_: &str, _: &str| Ok(()))
}

/// A connector whose board is hosted by the RPC, so the moderator
/// bootstrap self-grants.
fn hosted_connector(board_view: BoardView) -> FakeConnector {
    let fake = FakeRpcClient::new();
    let address = board_view.address.clone();
    fake.set_board(address.clone(), board_view);
    fake.set_hosted(vec![address]);
    FakeConnector::new(fake)
}

async fn start_worker(
    connector: &FakeConnector,
    options: WorkerOptions,
) -> Result<BoardWorker, WorkerError> {
    BoardWorker::start(options, connector, FakeClock::new(), noop_hook()).await
}

#[tokio::test]
async fn start_creates_and_persists_a_signer() {
    let dir = tempfile::tempdir().unwrap();
    let options = test_options(dir.path(), "boardA");
    let state_path = options.board_dir.join("state.json");
    let connector = hosted_connector(board("boardA", vec![]));

    let worker = start_worker(&connector, options.clone()).await.unwrap();
    worker.stop().await.unwrap();

    let state = load_state(&state_path);
    let first_key = state.signers["boardA"].private_key.clone();
    assert!(!first_key.is_empty());

    // A second start reuses the persisted key.
    let worker = start_worker(&connector, options).await.unwrap();
    worker.stop().await.unwrap();
    assert_eq!(load_state(&state_path).signers["boardA"].private_key, first_key);
}

#[tokio::test]
async fn start_subscribes_and_starts_the_update_stream() {
    let dir = tempfile::tempdir().unwrap();
    let connector = hosted_connector(board("boardA", vec![]));

    let worker = start_worker(&connector, test_options(dir.path(), "boardA"))
        .await
        .unwrap();

    assert!(connector.client().has_subscriber("boardA"));
    assert!(connector
        .client()
        .calls()
        .contains(&bm_adapters::RpcCall::StartBoard {
            address: "boardA".to_string()
        }));

    worker.stop().await.unwrap();
}

#[tokio::test]
async fn stop_persists_state_releases_lock_and_tears_down() {
    let dir = tempfile::tempdir().unwrap();
    let options = test_options(dir.path(), "boardA");
    let state_path = options.board_dir.join("state.json");
    let lock_path = options.board_dir.join("state.json.lock");
    let connector = hosted_connector(board("boardA", vec![]));

    let worker = start_worker(&connector, options).await.unwrap();
    assert!(lock_path.exists());
    worker.stop().await.unwrap();

    assert!(!lock_path.exists());
    assert!(state_path.exists());
    assert!(!connector.client().has_subscriber("boardA"));
    let calls = connector.client().calls();
    assert!(calls.contains(&bm_adapters::RpcCall::StopBoard {
        address: "boardA".to_string()
    }));
    assert!(calls.contains(&bm_adapters::RpcCall::Destroy));
    assert!(connector.client().destroyed());
}

#[tokio::test]
async fn hosted_board_without_role_gets_self_granted_moderator() {
    let dir = tempfile::tempdir().unwrap();
    let connector = hosted_connector(board("boardA", vec![]));

    let worker = start_worker(&connector, test_options(dir.path(), "boardA"))
        .await
        .unwrap();

    assert!(connector
        .client()
        .calls()
        .contains(&bm_adapters::RpcCall::EditRoles {
            address: "boardA".to_string()
        }));
    let roles = connector.client().get_board("boardA").await.unwrap().roles;
    assert!(roles.values().any(Role::grants_moderation));

    worker.stop().await.unwrap();
}

#[tokio::test]
async fn existing_role_skips_the_role_edit() {
    let dir = tempfile::tempdir().unwrap();
    let options = test_options(dir.path(), "boardA");

    // Persist a signer first so the role can name it up front.
    let signer = Signer::generate();
    let mut state = BoardState::default();
    state.signers.insert(
        "boardA".to_string(),
        SignerEntry {
            private_key: signer.private_key().to_string(),
        },
    );
    save_state(&options.board_dir.join("state.json"), &state).unwrap();

    let mut board_view = board("boardA", vec![]);
    board_view
        .roles
        .insert(signer.address().to_string(), Role::moderator());
    // Not hosted locally: an edit attempt would fail loudly.
    let fake = FakeRpcClient::new();
    fake.set_board("boardA", board_view);
    let connector = FakeConnector::new(fake);

    let worker = start_worker(&connector, options).await.unwrap();
    assert!(!connector
        .client()
        .calls()
        .iter()
        .any(|c| matches!(c, bm_adapters::RpcCall::EditRoles { .. })));

    worker.stop().await.unwrap();
}

#[tokio::test]
async fn remote_board_without_role_fails_with_instructions() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeRpcClient::new();
    fake.set_board("boardA", board("boardA", vec![]));
    // hosted list stays empty: the board is remote
    let connector = FakeConnector::new(fake);

    let err = start_worker(&connector, test_options(dir.path(), "boardA"))
        .await
        .unwrap_err();

    match &err {
        WorkerError::MissingModRole { address, signer } => {
            assert_eq!(address, "boardA");
            assert!(err.to_string().contains(signer));
            assert!(err.to_string().contains("grant moderator"));
        }
        other => panic!("expected MissingModRole, got {other:?}"),
    }

    // The failed start released its connection.
    assert!(connector.client().destroyed());
}

#[tokio::test]
async fn second_worker_on_the_same_board_dir_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let options = test_options(dir.path(), "boardA");
    let connector = hosted_connector(board("boardA", vec![]));

    let worker = start_worker(&connector, options.clone()).await.unwrap();
    let err = start_worker(&connector, options).await.unwrap_err();

    let message = err.to_string();
    assert!(message.starts_with("boardA:"), "{message}");
    assert!(message.contains("already running"), "{message}");

    worker.stop().await.unwrap();
}

#[tokio::test]
async fn update_sweeps_run_and_act() {
    let dir = tempfile::tempdir().unwrap();
    let connector = hosted_connector(board(
        "boardA",
        vec![
            thread("t1", 40, 4),
            thread("t2", 30, 3),
            thread("t3", 20, 2),
        ],
    ));

    let worker = start_worker(&connector, test_options(dir.path(), "boardA"))
        .await
        .unwrap();

    connector.client().push_update("boardA");
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(
        published(connector.client())
            .iter()
            .map(|(cid, _, _)| cid.as_str())
            .collect::<Vec<_>>(),
        ["t3"]
    );

    worker.stop().await.unwrap();
}

#[tokio::test]
async fn update_bursts_coalesce_into_one_deferred_rerun() {
    let dir = tempfile::tempdir().unwrap();
    let connector = hosted_connector(board("boardA", vec![thread("t1", 10, 1)]));

    let worker = start_worker(&connector, test_options(dir.path(), "boardA"))
        .await
        .unwrap();
    let start_fetches = connector.client().get_board_calls("boardA");

    // Slow sweeps down so the burst lands while one is in flight.
    connector.client().set_get_board_delay_ms(150);
    connector.client().push_update("boardA");
    tokio::time::sleep(Duration::from_millis(40)).await;
    for _ in 0..5 {
        connector.client().push_update("boardA");
    }
    tokio::time::sleep(Duration::from_millis(700)).await;

    // First sweep plus exactly one coalesced re-run.
    assert_eq!(
        connector.client().get_board_calls("boardA") - start_fetches,
        2
    );

    worker.stop().await.unwrap();
}
