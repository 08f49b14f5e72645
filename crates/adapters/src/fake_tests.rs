// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tokio::sync::mpsc;

#[tokio::test]
async fn scripted_board_is_returned() {
    let fake = FakeRpcClient::new();
    fake.set_board(
        "boardA",
        BoardView {
            address: "boardA".to_string(),
            ..BoardView::default()
        },
    );

    let board = fake.get_board("boardA").await.unwrap();
    assert_eq!(board.address, "boardA");
    assert_eq!(fake.get_board_calls("boardA"), 1);
}

#[tokio::test]
async fn unknown_board_errors() {
    let fake = FakeRpcClient::new();
    assert!(matches!(
        fake.get_board("ghost").await,
        Err(RpcError::Server { .. })
    ));
}

#[tokio::test]
async fn publishes_are_recorded_in_order() {
    let fake = FakeRpcClient::new();
    let signer = Signer::generate();
    let first = ModerationRecord::archive("Qm1", "boardA", "full", &signer).unwrap();
    let second = ModerationRecord::purge("Qm2", "boardA", "expired", &signer).unwrap();

    fake.publish_moderation(&first).await.unwrap();
    fake.publish_moderation(&second).await.unwrap();

    let published = fake.published();
    let cids: Vec<&str> = published.iter().map(|r| r.comment_cid.as_str()).collect();
    assert_eq!(cids, ["Qm1", "Qm2"]);
}

#[tokio::test]
async fn injected_publish_failures_fire_per_cid() {
    let fake = FakeRpcClient::new();
    fake.fail_publish_for("Qm1");
    let signer = Signer::generate();

    let failing = ModerationRecord::archive("Qm1", "boardA", "full", &signer).unwrap();
    let passing = ModerationRecord::archive("Qm2", "boardA", "full", &signer).unwrap();

    assert!(fake.publish_moderation(&failing).await.is_err());
    assert!(fake.publish_moderation(&passing).await.is_ok());
    assert_eq!(fake.published().len(), 1);
}

#[tokio::test]
async fn push_update_is_lossy_like_the_transport() {
    let fake = FakeRpcClient::new();
    let (tx, mut rx) = mpsc::channel(1);
    fake.subscribe("boardA", tx);

    fake.push_update("boardA");
    fake.push_update("boardA");
    fake.push_update("boardA");

    assert!(rx.try_recv().is_ok());
    assert!(rx.try_recv().is_err(), "burst must collapse to one buffered update");
}

#[tokio::test]
async fn edit_roles_mutates_scripted_board() {
    let fake = FakeRpcClient::new();
    fake.set_board(
        "boardA",
        BoardView {
            address: "boardA".to_string(),
            ..BoardView::default()
        },
    );

    let mut roles = std::collections::HashMap::new();
    roles.insert("signer1".to_string(), Role::moderator());
    fake.edit_board_roles("boardA", roles).await.unwrap();

    let board = fake.get_board("boardA").await.unwrap();
    assert!(board.roles["signer1"].grants_moderation());
}

#[tokio::test]
async fn failing_connector_reports_connect_error() {
    let connector = FakeConnector::new(FakeRpcClient::new());
    connector.set_fail_connect(true);

    assert!(connector.connect("ws://x", "agent").await.is_err());
    assert_eq!(
        connector.connects(),
        vec![("ws://x".to_string(), "agent".to_string())]
    );
}
