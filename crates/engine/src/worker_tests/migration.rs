// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Address migration: rename, re-key, rollback.

use super::*;
use parking_lot::Mutex;

struct MigrationHarness {
    h: TestHarness,
    boards_root: PathBuf,
    hook_calls: Arc<Mutex<Vec<(String, String)>>>,
}

/// A harness whose hook performs the real directory rename, like the
/// supervisor's does.
fn migration_harness(board_view: BoardView) -> MigrationHarness {
    let old_address = "boardA".to_string();
    let mut h = harness_with(
        BoardView {
            address: old_address.clone(),
            ..BoardView::default()
        },
        |_| {},
    );
    // The RPC now reports the board under its new identity.
    h.fake.set_board(old_address.clone(), board_view);

    h.task.state.signers.insert(
        old_address,
        SignerEntry {
            private_key: h.task.signer.private_key().to_string(),
        },
    );

    let boards_root = h.task.board_dir.parent().unwrap().to_path_buf();
    let hook_calls: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let hook_root = boards_root.clone();
    let hook_record = Arc::clone(&hook_calls);
    h.task.on_address_change = Arc::new(move |from: &str, to: &str| {
        hook_record.lock().push((from.to_string(), to.to_string()));
        std::fs::rename(hook_root.join(from), hook_root.join(to))
    });

    MigrationHarness {
        h,
        boards_root,
        hook_calls,
    }
}

#[tokio::test]
async fn address_rename_migrates_worker_and_directory() {
    let mut m = migration_harness(BoardView {
        address: "boardB".to_string(),
        ..BoardView::default()
    });

    // The update sweep notices the drift; an empty board publishes nothing.
    m.h.task.run_update().await.unwrap();

    assert_eq!(m.h.task.address, "boardB");
    assert_eq!(
        m.hook_calls.lock().clone(),
        vec![("boardA".to_string(), "boardB".to_string())]
    );

    assert!(!m.boards_root.join("boardA").exists());
    assert!(m.boards_root.join("boardB").exists());

    // Signer map re-keyed to exactly one active entry.
    assert_eq!(m.h.task.state.signers.len(), 1);
    assert!(m.h.task.state.signers.contains_key("boardB"));

    // The lock moved with the state document.
    let new_state_path = m.boards_root.join("boardB").join("state.json");
    assert_eq!(m.h.task.state_path, new_state_path);
    assert!(bm_storage::load_state(&new_state_path)
        .signers
        .contains_key("boardB"));
    assert!(m.boards_root.join("boardB").join("state.json.lock").exists());
    assert!(!m.boards_root.join("boardA").join("state.json.lock").exists());

    // The worker listens under its new name.
    assert!(m.h.fake.has_subscriber("boardB"));
    assert!(!m.h.fake.has_subscriber("boardA"));

    // No moderation actions on the transition alone.
    assert!(published(&m.h.fake).is_empty());
}

#[tokio::test]
async fn migrated_worker_keeps_enforcing_under_new_address() {
    let mut m = migration_harness(board(
        "boardB",
        vec![
            thread("t1", 40, 4),
            thread("t2", 30, 3),
            thread("t3", 20, 2),
        ],
    ));

    m.h.task.run_update().await.unwrap();

    let records = m.h.fake.published();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].comment_cid, "t3");
    assert_eq!(records[0].subplebbit_address, "boardB");
}

#[tokio::test]
async fn failed_new_lock_rolls_the_migration_back() {
    let mut m = migration_harness(BoardView {
        address: "boardB".to_string(),
        ..BoardView::default()
    });

    // Record-only hook: the directory stays put, so the pre-seeded live
    // lock below is what the worker finds at the new state path.
    let hook_record = Arc::clone(&m.hook_calls);
    m.h.task.on_address_change = Arc::new(move |from: &str, to: &str| {
        hook_record.lock().push((from.to_string(), to.to_string()));
        Ok(())
    });

    // A live holder already owns the new state path.
    let blocked_state = m.boards_root.join("boardB").join("state.json");
    let _blocker = StateLock::acquire(&blocked_state).unwrap();

    let err = m.h.task.run_update().await.unwrap_err();
    assert!(matches!(err, WorkerError::Migration { .. }), "{err}");

    // Rename requested, then inverted.
    assert_eq!(
        m.hook_calls.lock().clone(),
        vec![
            ("boardA".to_string(), "boardB".to_string()),
            ("boardB".to_string(), "boardA".to_string()),
        ]
    );

    // Everything back under the old identity.
    assert_eq!(m.h.task.address, "boardA");
    assert_eq!(
        m.h.task.state_path,
        m.boards_root.join("boardA").join("state.json")
    );
    assert_eq!(m.h.task.state.signers.len(), 1);
    assert!(m.h.task.state.signers.contains_key("boardA"));
    assert!(m.boards_root.join("boardA").join("state.json.lock").exists());
    assert!(bm_storage::load_state(&m.h.task.state_path)
        .signers
        .contains_key("boardA"));
}
