// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    archive = { ModAction::archive("over capacity"), r#"{"archived":true,"reason":"over capacity"}"# },
    purge   = { ModAction::purge("over capacity"), r#"{"purged":true,"reason":"over capacity"}"# },
)]
fn action_wire_shape(action: ModAction, expected: &str) {
    let json = serde_json::to_string(&action).unwrap();
    assert_eq!(json, expected);
    assert_ne!(action.is_archive(), action.is_purge());
}

#[test]
fn action_round_trips() {
    let action = ModAction::purge("expired");
    let json = serde_json::to_string(&action).unwrap();
    let parsed: ModAction = serde_json::from_str(&json).unwrap();
    assert_eq!(action, parsed);
}

#[test]
fn reasons_config_merges_per_key() {
    let board = ModerationReasonsConfig {
        archive_capacity: Some("board says".to_string()),
        ..ModerationReasonsConfig::default()
    };
    let defaults = ModerationReasonsConfig {
        archive_capacity: Some("defaults say".to_string()),
        purge_deleted: Some("defaults purge".to_string()),
        ..ModerationReasonsConfig::default()
    };

    let merged = board.merged_over(&defaults);
    assert_eq!(merged.archive_capacity.as_deref(), Some("board says"));
    assert_eq!(merged.purge_deleted.as_deref(), Some("defaults purge"));
    assert!(merged.archive_bump_limit.is_none());
}

#[test]
fn materialize_fills_builtins() {
    let partial = ModerationReasonsConfig {
        purge_archived: Some("custom".to_string()),
        ..ModerationReasonsConfig::default()
    };
    let reasons = partial.materialize();
    assert_eq!(reasons.purge_archived, "custom");
    assert_eq!(
        reasons.archive_bump_limit,
        ModerationReasons::default().archive_bump_limit
    );
}

#[test]
fn reasons_config_uses_camel_case_keys() {
    let config = ModerationReasonsConfig {
        archive_capacity: Some("x".to_string()),
        archive_bump_limit: Some("y".to_string()),
        purge_archived: Some("z".to_string()),
        purge_deleted: Some("w".to_string()),
    };
    let json = serde_json::to_value(&config).unwrap();
    let object = json.as_object().unwrap();
    for key in ModerationReasonsConfig::KEYS {
        assert!(object.contains_key(key), "missing key {key}");
    }
}
