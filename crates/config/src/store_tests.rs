// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::tempdir;

fn write_board_file(config_dir: &Path, name: &str, contents: &str) {
    let dir = boards_dir(config_dir);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn load_missing_tree_is_empty() {
    let dir = tempdir().unwrap();
    let config = load_config(dir.path()).unwrap();
    assert_eq!(config.global, GlobalConfig::default());
    assert!(config.boards.is_empty());
}

#[test]
fn load_reads_boards_in_filename_order() {
    let dir = tempdir().unwrap();
    write_board_file(dir.path(), "zeta.json", r#"{"address": "zeta"}"#);
    write_board_file(dir.path(), "alpha.json", r#"{"address": "alpha"}"#);

    let config = load_config(dir.path()).unwrap();
    let addresses: Vec<&str> = config.boards.iter().map(|b| b.address.as_str()).collect();
    assert_eq!(addresses, ["alpha", "zeta"]);
}

#[test]
fn load_rejects_filename_address_mismatch() {
    let dir = tempdir().unwrap();
    write_board_file(dir.path(), "alpha.json", r#"{"address": "beta"}"#);

    let err = load_config(dir.path()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("filename does not match"), "{message}");
    assert!(message.contains("alpha.json"), "{message}");
}

#[test]
fn load_ignores_state_directories_and_other_files() {
    let dir = tempdir().unwrap();
    write_board_file(dir.path(), "alpha.json", r#"{"address": "alpha"}"#);
    // A board's own state directory lives next to the config files.
    fs::create_dir_all(boards_dir(dir.path()).join("alpha")).unwrap();
    fs::write(
        boards_dir(dir.path()).join("alpha").join("state.json"),
        "{}",
    )
    .unwrap();
    fs::write(boards_dir(dir.path()).join("notes.txt"), "hi").unwrap();

    let config = load_config(dir.path()).unwrap();
    assert_eq!(config.boards.len(), 1);
}

#[test]
fn save_and_reload_board_round_trips() {
    let dir = tempdir().unwrap();
    let mut board = BoardConfig::new("alpha");
    board.per_page = Some(5);

    save_board_config(dir.path(), &board).unwrap();
    let config = load_config(dir.path()).unwrap();
    assert_eq!(config.boards, vec![board]);

    // No stray temp file after a successful write
    assert!(!board_path(dir.path(), "alpha")
        .with_extension("json.tmp")
        .exists());
}

#[test]
fn save_global_round_trips() {
    let dir = tempdir().unwrap();
    let global = GlobalConfig {
        rpc_url: Some("ws://rpc:9138".to_string()),
        ..GlobalConfig::default()
    };
    save_global_config(dir.path(), &global).unwrap();
    assert_eq!(load_config(dir.path()).unwrap().global, global);
}

#[test]
fn delete_missing_board_is_not_found() {
    let dir = tempdir().unwrap();
    match delete_board_config(dir.path(), "ghost") {
        Err(ConfigError::BoardNotFound(address)) => assert_eq!(address, "ghost"),
        other => panic!("expected BoardNotFound, got {other:?}"),
    }
}

#[test]
fn delete_removes_board_file() {
    let dir = tempdir().unwrap();
    save_board_config(dir.path(), &BoardConfig::new("alpha")).unwrap();
    delete_board_config(dir.path(), "alpha").unwrap();
    assert!(!board_path(dir.path(), "alpha").exists());
}

#[test]
fn rename_rewrites_address_and_moves_file() {
    let dir = tempdir().unwrap();
    let mut board = BoardConfig::new("alpha");
    board.bump_limit = Some(42);
    save_board_config(dir.path(), &board).unwrap();

    rename_board_config(dir.path(), "alpha", "beta").unwrap();

    assert!(!board_path(dir.path(), "alpha").exists());
    let config = load_config(dir.path()).unwrap();
    assert_eq!(config.boards.len(), 1);
    assert_eq!(config.boards[0].address, "beta");
    assert_eq!(config.boards[0].bump_limit, Some(42));
}

#[test]
fn rename_refuses_existing_destination() {
    let dir = tempdir().unwrap();
    save_board_config(dir.path(), &BoardConfig::new("alpha")).unwrap();
    save_board_config(dir.path(), &BoardConfig::new("beta")).unwrap();

    match rename_board_config(dir.path(), "alpha", "beta") {
        Err(ConfigError::BoardExists(address)) => assert_eq!(address, "beta"),
        other => panic!("expected BoardExists, got {other:?}"),
    }
    // Source untouched
    assert!(board_path(dir.path(), "alpha").exists());
}

#[test]
fn second_file_claiming_same_address_is_fatal() {
    let dir = tempdir().unwrap();
    write_board_file(dir.path(), "alpha.json", r#"{"address": "alpha"}"#);
    write_board_file(dir.path(), "beta.json", r#"{"address": "alpha"}"#);

    // The impostor trips the filename check; either way the load is fatal.
    let err = load_config(dir.path()).unwrap_err();
    assert!(err.to_string().contains("beta.json"), "{err}");
}
