// SPDX-FileCopyrightText: 2026 Cardkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for cardkeep.
//!
//! This crate provides the error taxonomy, the domain types exchanged between
//! the hashing, cipher, cache, and record layers, and the persistence trait
//! the record service consumes.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{CardkeepError, Result};
pub use traits::CredentialStore;
pub use types::{
    Credential, DerivedKey, EncodedField, EncryptedField, KEY_LENGTH, KEY_SALT_LENGTH,
    NONCE_LENGTH, TAG_LENGTH, UserId, UserKeySalt,
};
