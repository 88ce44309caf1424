// SPDX-FileCopyrightText: 2026 Cardkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence boundary for credentials and key-derivation salts.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Credential, UserId, UserKeySalt};

/// Store keyed by [`UserId`] holding one [`Credential`] and one
/// [`UserKeySalt`] per user.
///
/// The protection subsystem never issues queries itself; it only reads and
/// writes these two records through this trait. Backends report their own
/// failures as [`CardkeepError::Storage`](crate::CardkeepError::Storage).
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the credential for a user, if registered.
    async fn load_credential(&self, user_id: &UserId) -> Result<Option<Credential>>;

    /// Persist a credential, replacing any existing one for the same user.
    async fn save_credential(&self, credential: Credential) -> Result<()>;

    /// Load the key-derivation salt for a user, if present.
    async fn load_key_salt(&self, user_id: &UserId) -> Result<Option<UserKeySalt>>;

    /// Persist the key-derivation salt, replacing any existing one.
    async fn save_key_salt(&self, salt: UserKeySalt) -> Result<()>;

    /// Insert a new user's credential and salt as one atomic step.
    ///
    /// Returns `Ok(false)` and writes nothing when a credential already
    /// exists for `credential.user_id`. Registration relies on this to
    /// guarantee a single winner under concurrent attempts.
    async fn create_user(&self, credential: Credential, salt: UserKeySalt) -> Result<bool>;
}
