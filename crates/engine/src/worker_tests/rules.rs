// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sweep-rule behavior: the four moderation rules and their boundaries.

use super::*;
use bm_core::{ModerationReasons, Replies};

fn capacity_reason() -> String {
    ModerationReasons::default().archive_capacity
}

fn bump_reason() -> String {
    ModerationReasons::default().archive_bump_limit
}

fn purge_archived_reason() -> String {
    ModerationReasons::default().purge_archived
}

fn purge_deleted_reason() -> String {
    ModerationReasons::default().purge_deleted
}

#[tokio::test]
async fn capacity_overflow_is_archived_oldest_first() {
    // perPage=1, pages=2: threads beyond the two newest are archived.
    let mut h = harness(board(
        "boardA",
        vec![
            thread("t1", 40, 4),
            thread("t2", 30, 3),
            thread("t3", 20, 2),
            thread("t4", 10, 1),
        ],
    ));

    h.task.run_update().await.unwrap();

    assert_eq!(
        published(&h.fake),
        vec![
            ("t3".to_string(), true, capacity_reason()),
            ("t4".to_string(), true, capacity_reason()),
        ]
    );
    let now = h.clock.epoch_secs();
    assert_eq!(
        h.task.state.archived_threads.get("t3").map(|a| a.archived_timestamp),
        Some(now)
    );
    assert!(h.task.state.archived_threads.contains_key("t4"));
}

#[tokio::test]
async fn pinned_threads_are_exempt_from_capacity() {
    let mut pinned = thread("t1", 50, 5);
    pinned.pinned = true;
    let mut h = harness(board(
        "boardA",
        vec![
            pinned,
            thread("t2", 40, 4),
            thread("t3", 30, 3),
            thread("t4", 20, 2),
            thread("t5", 10, 1),
        ],
    ));

    h.task.run_update().await.unwrap();

    // The pinned thread neither counts toward capacity nor gets archived.
    assert_eq!(
        published(&h.fake),
        vec![
            ("t4".to_string(), true, capacity_reason()),
            ("t5".to_string(), true, capacity_reason()),
        ]
    );
}

#[tokio::test]
async fn already_archived_overflow_occupies_slots_without_republishing() {
    let mut already = thread("t3", 20, 2);
    already.archived = true;
    let mut h = harness(board(
        "boardA",
        vec![
            thread("t1", 40, 4),
            thread("t2", 30, 3),
            already,
            thread("t4", 10, 1),
        ],
    ));

    h.task.run_update().await.unwrap();

    assert_eq!(
        published(&h.fake),
        vec![("t4".to_string(), true, capacity_reason())]
    );
    assert!(!h.task.state.archived_threads.contains_key("t3"));
}

#[tokio::test]
async fn bump_limit_boundary() {
    // replyCount == bumpLimit archives; one below does not.
    for (reply_count, expect_archive) in [(2u64, false), (3, true), (4, true)] {
        let mut bumped = thread("t1", 10, 1);
        bumped.reply_count = reply_count;
        let mut h = harness_with(board("boardA", vec![bumped]), |options| {
            options.per_page = Some(15);
            options.pages = Some(10);
            options.bump_limit = Some(3);
        });

        h.task.run_update().await.unwrap();

        if expect_archive {
            assert_eq!(
                published(&h.fake),
                vec![("t1".to_string(), true, bump_reason())],
                "replyCount={reply_count}"
            );
        } else {
            assert!(published(&h.fake).is_empty(), "replyCount={reply_count}");
        }
    }
}

#[tokio::test]
async fn pinned_threads_are_exempt_from_bump_limit() {
    let mut pinned = thread("t1", 10, 1);
    pinned.pinned = true;
    pinned.reply_count = 500;
    let mut h = harness_with(board("boardA", vec![pinned]), |options| {
        options.bump_limit = Some(3);
    });

    h.task.run_update().await.unwrap();
    assert!(published(&h.fake).is_empty());
}

#[tokio::test]
async fn thread_qualifying_for_both_archives_gets_capacity_reason() {
    // Capacity 1 and a bump-qualifying overflow thread: the capacity pass
    // records it first, so the bump pass skips it via the state entry.
    let mut bumped = thread("t2", 10, 1);
    bumped.reply_count = 100;
    let mut h = harness_with(board("boardA", vec![thread("t1", 20, 2), bumped]), |options| {
        options.per_page = Some(1);
        options.pages = Some(1);
        options.bump_limit = Some(100);
    });

    h.task.run_update().await.unwrap();

    assert_eq!(
        published(&h.fake),
        vec![("t2".to_string(), true, capacity_reason())]
    );
}

#[tokio::test]
async fn archive_purge_boundary_is_strict() {
    // Archived at 1000 with a 5 second window: still present at 1005,
    // purged at 1006.
    for (now, expect_purge) in [(1_005u64, false), (1_006, true)] {
        let mut h = harness_with(board("boardA", vec![thread("t9", 10, 1)]), |options| {
            options.archive_purge_seconds = Some(5);
        });
        h.task.state.archived_threads.insert(
            "t1".to_string(),
            ArchivedThread {
                archived_timestamp: 1_000,
            },
        );
        h.clock.set_epoch_secs(now);

        h.task.run_update().await.unwrap();

        if expect_purge {
            assert_eq!(
                published(&h.fake),
                vec![("t1".to_string(), false, purge_archived_reason())],
                "now={now}"
            );
            assert!(h.task.state.archived_threads.is_empty());
        } else {
            assert!(published(&h.fake).is_empty(), "now={now}");
            assert!(h.task.state.archived_threads.contains_key("t1"));
        }
    }
}

#[tokio::test]
async fn deleted_thread_is_purged_and_dropped_from_archive_state() {
    let mut deleted = thread("t1", 10, 1);
    deleted.deleted = true;
    let mut h = harness(board("boardA", vec![deleted]));
    h.task.state.archived_threads.insert(
        "t1".to_string(),
        ArchivedThread {
            archived_timestamp: 1,
        },
    );

    h.task.run_update().await.unwrap();

    assert_eq!(
        published(&h.fake),
        vec![("t1".to_string(), false, purge_deleted_reason())]
    );
    assert!(h.task.state.archived_threads.is_empty());
}

#[tokio::test]
async fn deleted_pinned_thread_is_still_purged() {
    let mut deleted = thread("t1", 10, 1);
    deleted.pinned = true;
    deleted.deleted = true;
    let mut h = harness(board("boardA", vec![deleted]));

    h.task.run_update().await.unwrap();

    assert_eq!(
        published(&h.fake),
        vec![("t1".to_string(), false, purge_deleted_reason())]
    );
}

#[tokio::test]
async fn deleted_reply_is_purged_without_touching_the_thread() {
    let mut top = thread("t1", 10, 1);
    let mut gone = thread("r1", 5, 2);
    gone.deleted = true;
    let mut replies = Replies::default();
    replies.pages.insert(
        "best".to_string(),
        Page {
            comments: vec![gone, thread("r2", 6, 3)],
            next_cid: None,
        },
    );
    top.replies = Some(replies);

    let mut h = harness(board("boardA", vec![top]));
    h.task.run_update().await.unwrap();

    assert_eq!(
        published(&h.fake),
        vec![("r1".to_string(), false, purge_deleted_reason())]
    );
    assert!(h.task.state.archived_threads.is_empty());
}

#[tokio::test]
async fn second_sweep_of_unchanged_view_publishes_nothing() {
    let mut deleted = thread("t5", 5, 5);
    deleted.deleted = true;
    let mut h = harness(board(
        "boardA",
        vec![
            thread("t1", 40, 4),
            thread("t2", 30, 3),
            thread("t3", 20, 2),
            deleted,
        ],
    ));

    h.task.run_update().await.unwrap();
    let after_first = published(&h.fake);
    assert!(!after_first.is_empty());
    let state_after_first = h.task.state.clone();

    h.task.run_update().await.unwrap();
    assert_eq!(published(&h.fake), after_first);
    assert_eq!(h.task.state, state_after_first);
}

#[tokio::test]
async fn failed_publish_is_retried_on_the_next_sweep() {
    let mut h = harness(board(
        "boardA",
        vec![
            thread("t1", 40, 4),
            thread("t2", 30, 3),
            thread("t3", 20, 2),
        ],
    ));
    h.fake.fail_publish_for("t3");

    h.task.run_update().await.unwrap();
    assert!(published(&h.fake).is_empty());
    assert!(!h.task.state.archived_threads.contains_key("t3"));

    h.fake.clear_publish_failures();
    h.task.run_update().await.unwrap();
    assert_eq!(
        published(&h.fake),
        vec![("t3".to_string(), true, capacity_reason())]
    );
    assert!(h.task.state.archived_threads.contains_key("t3"));
}

#[tokio::test]
async fn one_publish_failure_does_not_stop_the_sweep() {
    let mut h = harness(board(
        "boardA",
        vec![
            thread("t1", 40, 4),
            thread("t2", 30, 3),
            thread("t3", 20, 2),
            thread("t4", 10, 1),
        ],
    ));
    h.fake.fail_publish_for("t3");

    h.task.run_update().await.unwrap();

    // t3 failed but t4 was still handled.
    assert_eq!(
        published(&h.fake),
        vec![("t4".to_string(), true, capacity_reason())]
    );
}

#[tokio::test]
async fn empty_board_short_circuits_every_rule() {
    // No active chain and no preloaded page: even an expired archive entry
    // is left for a later sweep.
    let empty = BoardView {
        address: "boardA".to_string(),
        ..BoardView::default()
    };
    let mut h = harness_with(empty, |options| {
        options.archive_purge_seconds = Some(1);
    });
    h.task.state.archived_threads.insert(
        "t1".to_string(),
        ArchivedThread {
            archived_timestamp: 1,
        },
    );
    h.clock.set_epoch_secs(1_000_000);

    h.task.run_update().await.unwrap();

    assert!(published(&h.fake).is_empty());
    assert!(h.task.state.archived_threads.contains_key("t1"));
}

#[tokio::test]
async fn custom_reasons_are_attached_to_publishes() {
    let mut h = harness_with(
        board(
            "boardA",
            vec![
                thread("t1", 40, 4),
                thread("t2", 30, 3),
                thread("t3", 20, 2),
            ],
        ),
        |options| {
            options.reasons = Some(bm_core::ModerationReasonsConfig {
                archive_capacity: Some("board is full".to_string()),
                ..bm_core::ModerationReasonsConfig::default()
            });
        },
    );

    h.task.run_update().await.unwrap();
    assert_eq!(
        published(&h.fake),
        vec![("t3".to_string(), true, "board is full".to_string())]
    );
}

#[tokio::test]
async fn sweep_state_survives_reload_from_disk() {
    let mut h = harness(board(
        "boardA",
        vec![
            thread("t1", 40, 4),
            thread("t2", 30, 3),
            thread("t3", 20, 2),
        ],
    ));

    h.task.run_update().await.unwrap();
    let reloaded = load_state(&h.task.state_path);
    assert_eq!(reloaded, h.task.state);
}
