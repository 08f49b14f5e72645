// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-board Ed25519 identity and signed moderation records.
//!
//! The signer's address is the hex of its verifying key; the private key
//! round-trips through base64 for the state document.

use base64::Engine;
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use bm_core::ModAction;

use crate::rpc::RpcError;

const KEY_LEN: usize = 32;

/// An Ed25519 key pair identifying one board worker.
#[derive(Clone)]
pub struct Signer {
    address: String,
    private_key: String,
    signing_key: SigningKey,
}

impl Signer {
    /// Generate a fresh key pair.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    /// Recreate a signer from a stored base64 private key.
    pub fn from_private_key(private_key: &str) -> Result<Self, RpcError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(private_key)
            .map_err(|e| RpcError::InvalidKey(e.to_string()))?;
        let bytes: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| RpcError::InvalidKey(format!("expected {KEY_LEN} key bytes")))?;
        Ok(Self::from_signing_key(SigningKey::from_bytes(&bytes)))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let address = hex::encode(signing_key.verifying_key().as_bytes());
        let private_key =
            base64::engine::general_purpose::STANDARD.encode(signing_key.to_bytes());
        Self {
            address,
            private_key,
            signing_key,
        }
    }

    /// The signer's public address (hex of the verifying key).
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The base64 private key, as persisted in the state document.
    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    fn sign(&self, message: &[u8]) -> String {
        hex::encode(self.signing_key.sign(message).to_bytes())
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Signature attached to a moderation record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSignature {
    pub public_key: String,
    pub signature: String,
}

/// A signed moderation action against one comment on one board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationRecord {
    pub comment_cid: String,
    pub subplebbit_address: String,
    pub comment_moderation: ModAction,
    pub signature: RecordSignature,
}

impl ModerationRecord {
    pub fn new(
        comment_cid: impl Into<String>,
        subplebbit_address: impl Into<String>,
        action: ModAction,
        signer: &Signer,
    ) -> Result<Self, RpcError> {
        let comment_cid = comment_cid.into();
        let subplebbit_address = subplebbit_address.into();
        let message = signable_bytes(&comment_cid, &subplebbit_address, &action)?;
        let signature = RecordSignature {
            public_key: signer.address.clone(),
            signature: signer.sign(&message),
        };
        Ok(Self {
            comment_cid,
            subplebbit_address,
            comment_moderation: action,
            signature,
        })
    }

    pub fn archive(
        comment_cid: impl Into<String>,
        subplebbit_address: impl Into<String>,
        reason: impl Into<String>,
        signer: &Signer,
    ) -> Result<Self, RpcError> {
        Self::new(
            comment_cid,
            subplebbit_address,
            ModAction::archive(reason),
            signer,
        )
    }

    pub fn purge(
        comment_cid: impl Into<String>,
        subplebbit_address: impl Into<String>,
        reason: impl Into<String>,
        signer: &Signer,
    ) -> Result<Self, RpcError> {
        Self::new(
            comment_cid,
            subplebbit_address,
            ModAction::purge(reason),
            signer,
        )
    }

    /// Verify the signature against the record's own public key.
    pub fn verify(&self) -> bool {
        let Ok(message) = signable_bytes(
            &self.comment_cid,
            &self.subplebbit_address,
            &self.comment_moderation,
        ) else {
            return false;
        };
        let Some(key) = decode_verifying_key(&self.signature.public_key) else {
            return false;
        };
        let Some(signature) = decode_signature(&self.signature.signature) else {
            return false;
        };
        key.verify(&message, &signature).is_ok()
    }
}

/// Canonical byte encoding of the signed fields (JSON array, fixed order).
fn signable_bytes(
    comment_cid: &str,
    subplebbit_address: &str,
    action: &ModAction,
) -> Result<Vec<u8>, RpcError> {
    serde_json::to_vec(&(comment_cid, subplebbit_address, action))
        .map_err(|e| RpcError::Payload(e.to_string()))
}

fn decode_verifying_key(public_key: &str) -> Option<VerifyingKey> {
    let bytes: [u8; KEY_LEN] = hex::decode(public_key).ok()?.try_into().ok()?;
    VerifyingKey::from_bytes(&bytes).ok()
}

fn decode_signature(signature: &str) -> Option<Signature> {
    let bytes: [u8; 64] = hex::decode(signature).ok()?.try_into().ok()?;
    Some(Signature::from_bytes(&bytes))
}

#[cfg(test)]
#[path = "signer_tests.rs"]
mod tests;
