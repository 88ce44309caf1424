// SPDX-FileCopyrightText: 2026 Cardkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Orchestration of hashing, key derivation, caching, and field encryption.
//!
//! Per-user session state is implicit in the [`KeyCache`]:
//!
//! ```text
//! Locked --unlock ok--> Unlocked --ttl elapsed | lock--> Locked
//! ```
//!
//! Every successful protect or reveal refreshes the TTL. A failed unlock or
//! login leaves the state unchanged.

use std::sync::Arc;

use cardkeep_config::CardkeepConfig;
use cardkeep_core::{
    CardkeepError, Credential, CredentialStore, DerivedKey, EncryptedField, Result, UserId,
};
use cardkeep_crypto::{
    FieldCipher, HashParams, KeyDeriver, PasswordHasher, PasswordPolicy, generate_key_salt,
};
use cardkeep_keycache::{KeyCache, spawn_sweeper};
use secrecy::{ExposeSecret, SecretString};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::cards::{CardSecrets, ProtectedCard, RevealedCard};

/// Entry point for everything that touches a user's secrets.
pub struct ProtectedRecordService {
    store: Arc<dyn CredentialStore>,
    cache: Arc<KeyCache>,
    hasher: PasswordHasher,
    deriver: KeyDeriver,
    policy: PasswordPolicy,
}

impl ProtectedRecordService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        cache: Arc<KeyCache>,
        hasher: PasswordHasher,
        deriver: KeyDeriver,
        policy: PasswordPolicy,
    ) -> Self {
        Self {
            store,
            cache,
            hasher,
            deriver,
            policy,
        }
    }

    /// Build from validated configuration with a fresh key cache.
    pub fn from_config(config: &CardkeepConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let hasher = PasswordHasher::new(HashParams::from(&config.hashing))
            .map_err(|e| CardkeepError::Config(e.to_string()))?;
        let deriver = KeyDeriver::try_from(&config.key_derivation)
            .map_err(|e| CardkeepError::Config(e.to_string()))?;
        let cache = Arc::new(KeyCache::new(config.key_cache.ttl()));
        Ok(Self::new(
            store,
            cache,
            hasher,
            deriver,
            PasswordPolicy::from(&config.password_policy),
        ))
    }

    /// The shared key cache, e.g. for spawning a sweeper or clearing on shutdown.
    pub fn cache(&self) -> &Arc<KeyCache> {
        &self.cache
    }

    /// Start the background sweep if `config` enables one.
    ///
    /// Returns `None` when `key_cache.sweep_interval_secs` is 0.
    pub fn spawn_cache_sweeper(
        &self,
        config: &CardkeepConfig,
        cancel: CancellationToken,
    ) -> Option<JoinHandle<()>> {
        config
            .key_cache
            .sweep_interval()
            .map(|interval| spawn_sweeper(self.cache.clone(), interval, cancel))
    }

    /// Create a credential and key salt for a new user.
    ///
    /// The user starts out locked.
    pub async fn register(&self, user_id: UserId, password: &SecretString) -> Result<()> {
        self.policy.validate(password.expose_secret())?;

        // Early exit only; `create_user` is the authoritative check.
        if self.store.load_credential(&user_id).await?.is_some() {
            return Err(CardkeepError::AlreadyRegistered(user_id));
        }

        let hasher = self.hasher.clone();
        let owned = Zeroizing::new(password.expose_secret().to_owned());
        let password_hash = run_blocking("password hashing", move || hasher.hash(&owned)).await?;
        let key_salt = generate_key_salt(user_id)?;

        let credential = Credential {
            user_id,
            password_hash,
        };
        if !self.store.create_user(credential, key_salt).await? {
            return Err(CardkeepError::AlreadyRegistered(user_id));
        }

        info!(user_id = %user_id, "user registered");
        Ok(())
    }

    /// Verify the password and, on success, unlock the user's key.
    ///
    /// Unknown users and wrong passwords are indistinguishable. A stored hash
    /// with outdated cost parameters is replaced after a successful check.
    pub async fn login(&self, user_id: UserId, password: &SecretString) -> Result<()> {
        let Some(credential) = self.store.load_credential(&user_id).await? else {
            warn!(user_id = %user_id, "login failed");
            return Err(CardkeepError::AuthenticationFailed);
        };

        let hasher = self.hasher.clone();
        let owned = Zeroizing::new(password.expose_secret().to_owned());
        let stored = credential.password_hash.clone();
        let (verified, rehashed) = run_blocking("password verification", move || {
            if !hasher.verify(&owned, &stored) {
                return Ok((false, None));
            }
            let rehashed = if hasher.needs_rehash(&stored) {
                Some(hasher.hash(&owned)?)
            } else {
                None
            };
            Ok((true, rehashed))
        })
        .await?;

        if !verified {
            warn!(user_id = %user_id, "login failed");
            return Err(CardkeepError::AuthenticationFailed);
        }

        if let Some(password_hash) = rehashed {
            self.store
                .save_credential(Credential {
                    user_id,
                    password_hash,
                })
                .await?;
            info!(user_id = %user_id, "password hash upgraded to current parameters");
        }

        self.unlock(user_id, password).await
    }

    /// Derive the user's key from `password` and cache it.
    ///
    /// The password is not checked against the stored hash here: a wrong
    /// password caches a wrong key, and the first reveal fails with
    /// [`CardkeepError::DecryptionFailed`]. Use [`Self::login`] to verify first.
    pub async fn unlock(&self, user_id: UserId, password: &SecretString) -> Result<()> {
        if password.expose_secret().trim().is_empty() {
            return Err(CardkeepError::InvalidInput(
                "password cannot be empty".to_string(),
            ));
        }

        let key_salt = self.store.load_key_salt(&user_id).await?.ok_or_else(|| {
            warn!(user_id = %user_id, "no key salt on record");
            CardkeepError::NotFound(format!("key salt for user {user_id}"))
        })?;

        let deriver = self.deriver;
        let owned = Zeroizing::new(password.expose_secret().to_owned());
        let key = run_blocking("key derivation", move || {
            deriver.derive(&owned, key_salt.salt())
        })
        .await?;

        self.cache.store_default(user_id, key);
        info!(user_id = %user_id, "session unlocked");
        Ok(())
    }

    /// Forget the user's cached key. Locking a locked user is a no-op.
    pub fn lock(&self, user_id: &UserId) {
        if self.cache.remove(user_id) {
            info!(user_id = %user_id, "session locked");
        }
    }

    /// Whether a live key is cached, without refreshing it.
    pub fn is_unlocked(&self, user_id: &UserId) -> bool {
        self.cache.contains(user_id)
    }

    /// Encrypt one value under the user's cached key.
    ///
    /// The ciphertext is bound to `user_id`: it will not decrypt for anyone
    /// else even under the same key.
    pub fn protect_field(&self, user_id: &UserId, plaintext: &str) -> Result<EncryptedField> {
        let key = self.session_key(user_id)?;
        FieldCipher::encrypt_with_aad(plaintext, key.as_bytes(), user_id.as_bytes())
    }

    /// Like [`Self::protect_field`], producing nothing for an absent value.
    ///
    /// An absent value needs no key, so this succeeds while locked.
    pub fn protect_optional_field(
        &self,
        user_id: &UserId,
        plaintext: Option<&str>,
    ) -> Result<Option<EncryptedField>> {
        plaintext
            .map(|value| self.protect_field(user_id, value))
            .transpose()
    }

    /// Decrypt one value with the user's cached key.
    pub fn reveal_field(&self, user_id: &UserId, field: &EncryptedField) -> Result<String> {
        let key = self.session_key(user_id)?;
        reveal_with(&key, user_id, field)
    }

    /// Encrypt a card's number and optional PIN with one cache lookup.
    pub fn protect_card(&self, user_id: &UserId, secrets: &CardSecrets) -> Result<ProtectedCard> {
        let key = self.session_key(user_id)?;
        let aad = user_id.as_bytes();

        let card_number =
            FieldCipher::encrypt_with_aad(secrets.card_number.expose_secret(), key.as_bytes(), aad)?;
        let pin = secrets
            .pin
            .as_ref()
            .map(|pin| FieldCipher::encrypt_with_aad(pin.expose_secret(), key.as_bytes(), aad))
            .transpose()?;

        debug!(user_id = %user_id, has_pin = pin.is_some(), "card protected");
        Ok(ProtectedCard { card_number, pin })
    }

    /// Decrypt a card's number and optional PIN with one cache lookup.
    pub fn reveal_card(&self, user_id: &UserId, card: &ProtectedCard) -> Result<RevealedCard> {
        let key = self.session_key(user_id)?;

        let card_number = SecretString::from(reveal_with(&key, user_id, &card.card_number)?);
        let pin = card
            .pin
            .as_ref()
            .map(|field| reveal_with(&key, user_id, field).map(SecretString::from))
            .transpose()?;

        Ok(RevealedCard { card_number, pin })
    }

    /// Fetch and refresh the cached key, or report the session locked.
    fn session_key(&self, user_id: &UserId) -> Result<DerivedKey> {
        self.cache.try_get(user_id).ok_or_else(|| {
            debug!(user_id = %user_id, "no cached key");
            CardkeepError::Locked
        })
    }
}

fn reveal_with(key: &DerivedKey, user_id: &UserId, field: &EncryptedField) -> Result<String> {
    FieldCipher::decrypt_with_aad(field, key.as_bytes(), user_id.as_bytes()).inspect_err(|_| {
        warn!(user_id = %user_id, "field decryption failed");
    })
}

/// Run CPU-bound crypto off the async executor. Never cancelled midway.
async fn run_blocking<T, F>(what: &'static str, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CardkeepError::Internal(format!("{what} task panicked: {e}")))?
}
