// SPDX-FileCopyrightText: 2026 Cardkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the hashing, cipher, cache, and record layers.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::ZeroizeOnDrop;

use crate::error::{CardkeepError, Result};

/// Length of a derived symmetric key in bytes (AES-256).
pub const KEY_LENGTH: usize = 32;

/// Length of the per-user key-derivation salt in bytes.
pub const KEY_SALT_LENGTH: usize = 16;

/// Length of an AES-GCM nonce in bytes (96 bits).
pub const NONCE_LENGTH: usize = 12;

/// Length of an AES-GCM authentication tag in bytes.
pub const TAG_LENGTH: usize = 16;

/// Opaque identifier of an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Create a fresh random identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Raw bytes of the identifier, used as AEAD associated data.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for UserId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// A user's stored password verifier.
///
/// `password_hash` is the self-describing encoded Argon2id string. Debug
/// output omits it.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub user_id: UserId,
    pub password_hash: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("user_id", &self.user_id)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// Per-user random salt feeding key derivation. Immutable once created.
#[derive(Clone, PartialEq, Eq)]
pub struct UserKeySalt {
    pub user_id: UserId,
    salt: [u8; KEY_SALT_LENGTH],
}

impl UserKeySalt {
    pub fn new(user_id: UserId, salt: [u8; KEY_SALT_LENGTH]) -> Self {
        Self { user_id, salt }
    }

    /// Build from bytes loaded from storage, rejecting a wrong length.
    pub fn from_slice(user_id: UserId, salt: &[u8]) -> Result<Self> {
        let salt: [u8; KEY_SALT_LENGTH] = salt.try_into().map_err(|_| {
            CardkeepError::InvalidInput(format!(
                "key salt must be {KEY_SALT_LENGTH} bytes, got {}",
                salt.len()
            ))
        })?;
        Ok(Self { user_id, salt })
    }

    pub fn salt(&self) -> &[u8; KEY_SALT_LENGTH] {
        &self.salt
    }
}

impl fmt::Debug for UserKeySalt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserKeySalt")
            .field("user_id", &self.user_id)
            .field("salt", &"[REDACTED]")
            .finish()
    }
}

/// A symmetric key derived from a user's password.
///
/// Zeroized on drop; never serialized.
#[derive(Clone, PartialEq, Eq, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_LENGTH],
}

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self { key: bytes }
    }

    /// Raw key bytes. Use only for immediate cipher operations.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// One protected plaintext value: ciphertext, nonce, and tag kept apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedField {
    pub ciphertext: Vec<u8>,
    pub nonce: [u8; NONCE_LENGTH],
    pub tag: [u8; TAG_LENGTH],
}

impl EncryptedField {
    /// Text form for persistence: three standard base64 strings.
    pub fn encode(&self) -> EncodedField {
        EncodedField {
            ciphertext: STANDARD.encode(&self.ciphertext),
            nonce: STANDARD.encode(self.nonce),
            tag: STANDARD.encode(self.tag),
        }
    }
}

/// Persistence representation of an [`EncryptedField`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedField {
    pub ciphertext: String,
    pub nonce: String,
    pub tag: String,
}

impl EncodedField {
    /// Decode the stored triple.
    ///
    /// Any malformed component yields [`CardkeepError::DecryptionFailed`], the
    /// same error a tag mismatch produces.
    pub fn decode(&self) -> Result<EncryptedField> {
        let ciphertext = STANDARD
            .decode(&self.ciphertext)
            .map_err(|_| CardkeepError::DecryptionFailed)?;
        let nonce = decode_fixed::<NONCE_LENGTH>(&self.nonce)?;
        let tag = decode_fixed::<TAG_LENGTH>(&self.tag)?;
        Ok(EncryptedField {
            ciphertext,
            nonce,
            tag,
        })
    }
}

fn decode_fixed<const N: usize>(encoded: &str) -> Result<[u8; N]> {
    STANDARD
        .decode(encoded)
        .map_err(|_| CardkeepError::DecryptionFailed)?
        .try_into()
        .map_err(|_| CardkeepError::DecryptionFailed)
}
