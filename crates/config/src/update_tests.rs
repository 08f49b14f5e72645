// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn patch_sets_fields() {
    let board = BoardConfig::new("alpha");
    let patch = BoardPatch {
        per_page: Some(7),
        bump_limit: Some(100),
        ..BoardPatch::default()
    };

    let updated = update_board_config(&board, &patch, &[]).unwrap();
    assert_eq!(updated.per_page, Some(7));
    assert_eq!(updated.bump_limit, Some(100));
    assert_eq!(updated.pages, None);
    assert_eq!(updated.address, "alpha");
}

#[test]
fn reset_clears_fields() {
    let mut board = BoardConfig::new("alpha");
    board.per_page = Some(7);
    board.pages = Some(2);

    let updated =
        update_board_config(&board, &BoardPatch::default(), &[BoardField::PerPage]).unwrap();
    assert_eq!(updated.per_page, None);
    assert_eq!(updated.pages, Some(2));
}

#[test]
fn set_and_reset_same_field_is_refused() {
    let board = BoardConfig::new("alpha");
    let patch = BoardPatch {
        pages: Some(3),
        ..BoardPatch::default()
    };

    let err = update_board_config(&board, &patch, &[BoardField::Pages]).unwrap_err();
    assert!(
        err.to_string()
            .contains("Cannot set and reset the same field"),
        "{err}"
    );
}

#[test]
fn set_one_reset_another_is_fine() {
    let mut board = BoardConfig::new("alpha");
    board.bump_limit = Some(10);
    let patch = BoardPatch {
        pages: Some(3),
        ..BoardPatch::default()
    };

    let updated = update_board_config(&board, &patch, &[BoardField::BumpLimit]).unwrap();
    assert_eq!(updated.pages, Some(3));
    assert_eq!(updated.bump_limit, None);
}

#[test]
fn original_board_is_untouched() {
    let board = BoardConfig::new("alpha");
    let patch = BoardPatch {
        per_page: Some(9),
        ..BoardPatch::default()
    };
    let _ = update_board_config(&board, &patch, &[]).unwrap();
    assert_eq!(board.per_page, None);
}

#[test]
fn defaults_update_creates_and_prunes_record() {
    let global = GlobalConfig::default();
    let patch = BoardPatch {
        per_page: Some(20),
        ..BoardPatch::default()
    };

    let updated = update_defaults(&global, &patch, &[]).unwrap();
    assert_eq!(updated.defaults.as_ref().unwrap().per_page, Some(20));

    // Resetting the only field removes the defaults record entirely
    let cleared = update_defaults(&updated, &BoardPatch::default(), &[BoardField::PerPage]).unwrap();
    assert_eq!(cleared.defaults, None);
}

#[yare::parameterized(
    camel_per_page = { "perPage", BoardField::PerPage },
    kebab_per_page = { "per-page", BoardField::PerPage },
    pages          = { "pages", BoardField::Pages },
    camel_bump     = { "bumpLimit", BoardField::BumpLimit },
    kebab_purge    = { "archive-purge-seconds", BoardField::ArchivePurgeSeconds },
    reasons        = { "moderationReasons", BoardField::ModerationReasons },
)]
fn field_parses(input: &str, expected: BoardField) {
    assert_eq!(input.parse::<BoardField>().unwrap(), expected);
}

#[test]
fn unknown_field_is_an_error() {
    let err = "frobnicate".parse::<BoardField>().unwrap_err();
    assert!(err.to_string().contains("frobnicate"));
}
