// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

fn sample_state() -> BoardState {
    let mut state = BoardState::default();
    state.signers.insert(
        "boardA".to_string(),
        SignerEntry {
            private_key: "c2VjcmV0".to_string(),
        },
    );
    state.archived_threads.insert(
        "QmThread1".to_string(),
        ArchivedThread {
            archived_timestamp: 1_000,
        },
    );
    state.archived_threads.insert(
        "QmThread2".to_string(),
        ArchivedThread {
            archived_timestamp: 2_000,
        },
    );
    state
}

#[test]
fn missing_file_loads_default() {
    let dir = tempdir().unwrap();
    let state = load_state(&dir.path().join("state.json"));
    assert_eq!(state, BoardState::default());
}

#[test]
fn save_creates_parent_directories() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("boards").join("boardA").join("state.json");
    save_state(&path, &sample_state()).unwrap();
    assert!(path.exists());
    assert!(!suffixed(&path, ".tmp").exists());
}

#[test]
fn save_then_load_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    let state = sample_state();
    save_state(&path, &state).unwrap();
    assert_eq!(load_state(&path), state);
}

#[test]
fn archived_threads_keep_insertion_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    save_state(&path, &sample_state()).unwrap();

    let loaded = load_state(&path);
    let cids: Vec<&str> = loaded.archived_threads.keys().map(String::as_str).collect();
    assert_eq!(cids, ["QmThread1", "QmThread2"]);
}

#[test]
fn state_uses_camel_case_document_keys() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    save_state(&path, &sample_state()).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"signers\""), "{raw}");
    assert!(raw.contains("\"archivedThreads\""), "{raw}");
    assert!(raw.contains("\"privateKey\""), "{raw}");
    assert!(raw.contains("\"archivedTimestamp\""), "{raw}");
}

#[test]
fn corrupt_file_is_set_aside_and_defaulted() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    std::fs::write(&path, "{not json").unwrap();

    let state = load_state(&path);
    assert_eq!(state, BoardState::default());
    assert!(!path.exists(), "corrupt file should have been moved aside");

    let set_aside: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| {
            e.file_name()
                .to_string_lossy()
                .starts_with("state.json.corrupt-")
        })
        .collect();
    assert_eq!(set_aside.len(), 1, "expected exactly one set-aside file");
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn arb_state() -> impl Strategy<Value = BoardState> {
        (
            proptest::collection::hash_map("[a-z]{1,8}", "[A-Za-z0-9+/=]{4,16}", 0..3),
            proptest::collection::vec(("[A-Za-z0-9]{4,12}", 0u64..u64::MAX), 0..5),
        )
            .prop_map(|(signers, archived)| BoardState {
                signers: signers
                    .into_iter()
                    .map(|(address, private_key)| (address, SignerEntry { private_key }))
                    .collect(),
                archived_threads: archived
                    .into_iter()
                    .map(|(cid, archived_timestamp)| (cid, ArchivedThread { archived_timestamp }))
                    .collect(),
            })
    }

    proptest! {
        #[test]
        fn round_trip_persistence(state in arb_state()) {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("state.json");
            save_state(&path, &state).unwrap();
            prop_assert_eq!(load_state(&path), state);
        }
    }
}
