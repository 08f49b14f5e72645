// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    moderator = { "moderator", true },
    admin     = { "admin", true },
    owner     = { "owner", true },
    janitor   = { "janitor", false },
    empty     = { "", false },
)]
fn role_moderation_grants(role: &str, expected: bool) {
    let role = Role {
        role: role.to_string(),
    };
    assert_eq!(role.grants_moderation(), expected);
}

#[test]
fn board_view_deserializes_rpc_record() {
    let raw = r#"{
        "address": "boardA",
        "roles": {"abc123": {"role": "moderator"}},
        "posts": {
            "pageCids": {"active": "QmActive"},
            "pages": {"hot": {"comments": [{"cid": "Qm1"}]}}
        },
        "title": "ignored extra field"
    }"#;

    let board: BoardView = serde_json::from_str(raw).unwrap();
    assert_eq!(board.address, "boardA");
    assert!(board.roles["abc123"].grants_moderation());
    assert_eq!(
        board.posts.page_cids.get("active").map(String::as_str),
        Some("QmActive")
    );
    assert_eq!(board.posts.pages["hot"].comments[0].cid, "Qm1");
}

#[test]
fn board_view_defaults_absent_surfaces() {
    let board: BoardView = serde_json::from_str(r#"{"address": "boardA"}"#).unwrap();
    assert!(board.roles.is_empty());
    assert!(!board.posts.has_content());
}
