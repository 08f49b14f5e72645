// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn generated_signers_are_distinct() {
    let a = Signer::generate();
    let b = Signer::generate();
    assert_ne!(a.address(), b.address());
}

#[test]
fn private_key_round_trips() {
    let original = Signer::generate();
    let restored = Signer::from_private_key(original.private_key()).unwrap();
    assert_eq!(original.address(), restored.address());
}

#[yare::parameterized(
    not_base64  = { "%%%" },
    wrong_size  = { "c2hvcnQ=" },
)]
fn bad_private_keys_are_rejected(key: &str) {
    assert!(matches!(
        Signer::from_private_key(key),
        Err(RpcError::InvalidKey(_))
    ));
}

#[test]
fn address_is_hex_of_verifying_key() {
    let signer = Signer::generate();
    assert_eq!(signer.address().len(), 64);
    assert!(signer.address().chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn archive_record_signs_and_verifies() {
    let signer = Signer::generate();
    let record = ModerationRecord::archive("QmThread", "boardA", "full", &signer).unwrap();
    assert!(record.comment_moderation.is_archive());
    assert_eq!(record.signature.public_key, signer.address());
    assert!(record.verify());
}

#[test]
fn purge_record_signs_and_verifies() {
    let signer = Signer::generate();
    let record = ModerationRecord::purge("QmThread", "boardA", "expired", &signer).unwrap();
    assert!(record.comment_moderation.is_purge());
    assert!(record.verify());
}

#[test]
fn tampered_record_fails_verification() {
    let signer = Signer::generate();
    let mut record = ModerationRecord::purge("QmThread", "boardA", "expired", &signer).unwrap();
    record.comment_cid = "QmOther".to_string();
    assert!(!record.verify());
}

#[test]
fn record_wire_shape_is_camel_case() {
    let signer = Signer::generate();
    let record = ModerationRecord::archive("QmThread", "boardA", "full", &signer).unwrap();
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["commentCid"], "QmThread");
    assert_eq!(json["subplebbitAddress"], "boardA");
    assert_eq!(json["commentModeration"]["archived"], true);
    assert!(json["signature"]["publicKey"].is_string());
}

#[test]
fn debug_output_hides_private_key() {
    let signer = Signer::generate();
    let debug = format!("{signer:?}");
    assert!(!debug.contains(signer.private_key()));
}
