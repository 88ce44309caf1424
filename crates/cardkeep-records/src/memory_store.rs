// SPDX-FileCopyrightText: 2026 Cardkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory [`CredentialStore`] for tests, tooling, and single-process use.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use cardkeep_core::{Credential, CredentialStore, Result, UserId, UserKeySalt};
use tokio::sync::RwLock;

/// Credential and salt records held in two maps.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    credentials: Arc<RwLock<HashMap<UserId, Credential>>>,
    salts: Arc<RwLock<HashMap<UserId, UserKeySalt>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered credentials.
    pub async fn credential_count(&self) -> usize {
        self.credentials.read().await.len()
    }

    /// Drop a user's salt, simulating a damaged backing store.
    pub async fn delete_key_salt(&self, user_id: &UserId) -> bool {
        self.salts.write().await.remove(user_id).is_some()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn load_credential(&self, user_id: &UserId) -> Result<Option<Credential>> {
        Ok(self.credentials.read().await.get(user_id).cloned())
    }

    async fn save_credential(&self, credential: Credential) -> Result<()> {
        self.credentials
            .write()
            .await
            .insert(credential.user_id, credential);
        Ok(())
    }

    async fn load_key_salt(&self, user_id: &UserId) -> Result<Option<UserKeySalt>> {
        Ok(self.salts.read().await.get(user_id).cloned())
    }

    async fn save_key_salt(&self, salt: UserKeySalt) -> Result<()> {
        self.salts.write().await.insert(salt.user_id, salt);
        Ok(())
    }

    async fn create_user(&self, credential: Credential, salt: UserKeySalt) -> Result<bool> {
        // Lock order is credentials, then salts.
        let mut credentials = self.credentials.write().await;
        if credentials.contains_key(&credential.user_id) {
            return Ok(false);
        }
        let mut salts = self.salts.write().await;
        salts.insert(salt.user_id, salt);
        credentials.insert(credential.user_id, credential);
        Ok(true)
    }
}
