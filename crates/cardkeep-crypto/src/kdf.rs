// SPDX-FileCopyrightText: 2026 Cardkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Password-based derivation of the per-user field key.
//!
//! PBKDF2-HMAC-SHA256 over the password and the user's [`UserKeySalt`]. The
//! key salt is independent of the salt embedded in the password hash, so the
//! stored verifier reveals nothing about the field key.

use std::num::NonZeroU32;

use cardkeep_config::model::KeyDerivationConfig;
use cardkeep_core::{
    CardkeepError, DerivedKey, KEY_LENGTH, KEY_SALT_LENGTH, Result, UserId, UserKeySalt,
};
use ring::pbkdf2;
use zeroize::Zeroizing;

use crate::random::random_array;

/// Deterministic password-to-key derivation.
#[derive(Debug, Clone, Copy)]
pub struct KeyDeriver {
    iterations: NonZeroU32,
}

impl TryFrom<&KeyDerivationConfig> for KeyDeriver {
    type Error = CardkeepError;

    fn try_from(config: &KeyDerivationConfig) -> Result<Self> {
        Self::new(config.iterations)
    }
}

impl KeyDeriver {
    pub fn new(iterations: u32) -> Result<Self> {
        let iterations = NonZeroU32::new(iterations).ok_or_else(|| {
            CardkeepError::InvalidInput("key derivation iterations must be non-zero".to_string())
        })?;
        Ok(Self { iterations })
    }

    pub fn iterations(&self) -> u32 {
        self.iterations.get()
    }

    /// Derive a 32-byte key. The same `(password, salt)` always yields the
    /// same key.
    pub fn derive(&self, password: &str, salt: &[u8]) -> Result<DerivedKey> {
        if password.trim().is_empty() {
            return Err(CardkeepError::InvalidInput(
                "password cannot be empty".to_string(),
            ));
        }
        if salt.len() != KEY_SALT_LENGTH {
            return Err(CardkeepError::InvalidInput(format!(
                "key salt must be {KEY_SALT_LENGTH} bytes, got {}",
                salt.len()
            )));
        }

        let mut output = Zeroizing::new([0u8; KEY_LENGTH]);
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            self.iterations,
            salt,
            password.as_bytes(),
            output.as_mut(),
        );
        Ok(DerivedKey::from_bytes(*output))
    }
}

/// Create a fresh random key salt for a newly registered user.
pub fn generate_key_salt(user_id: UserId) -> Result<UserKeySalt> {
    Ok(UserKeySalt::new(user_id, random_array("key salt")?))
}
