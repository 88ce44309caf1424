// SPDX-FileCopyrightText: 2026 Cardkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the cardkeep protection subsystem.

use thiserror::Error;

use crate::types::UserId;

/// Result alias used across the cardkeep crates.
pub type Result<T> = std::result::Result<T, CardkeepError>;

/// The primary error type returned by every fallible cardkeep operation.
///
/// `Locked` and `DecryptionFailed` carry no payload on purpose: their text is
/// fixed so callers cannot tell a wrong key from tampered data.
#[derive(Debug, Error)]
pub enum CardkeepError {
    /// Empty or malformed arguments, rejected before any cryptographic work.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A credential or key salt record is missing for the user.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation needs an unlocked session and none is cached.
    #[error("session is locked")]
    Locked,

    /// Authentication tag mismatch or malformed ciphertext triple.
    #[error("decryption failed")]
    DecryptionFailed,

    /// Unknown user or wrong password during login.
    #[error("invalid user or password")]
    AuthenticationFailed,

    /// A credential already exists for this user.
    #[error("user {0} is already registered")]
    AlreadyRegistered(UserId),

    /// Failure inside a cryptographic primitive (RNG, parameter setup).
    #[error("crypto error: {0}")]
    Crypto(String),

    /// Persistence boundary errors reported by a `CredentialStore`.
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration errors.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors (e.g. a panicked blocking task).
    #[error("internal error: {0}")]
    Internal(String),
}

impl CardkeepError {
    /// Wrap any error raised by a persistence backend.
    pub fn storage<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(source),
        }
    }
}
