// SPDX-FileCopyrightText: 2026 Cardkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM encryption of individual string fields.
//!
//! Every call to [`FieldCipher::encrypt`] draws a fresh random 96-bit nonce
//! from the system CSPRNG. Ciphertext, nonce, and tag come back as separate
//! byte sequences so they can be stored as distinct columns.

use cardkeep_core::{CardkeepError, EncryptedField, KEY_LENGTH, Result, TAG_LENGTH};
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, Nonce, UnboundKey};
use zeroize::Zeroizing;

use crate::random::random_array;

/// Authenticated field encryption.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldCipher;

impl FieldCipher {
    /// Encrypt with no associated data.
    pub fn encrypt(plaintext: &str, key: &[u8; KEY_LENGTH]) -> Result<EncryptedField> {
        Self::encrypt_with_aad(plaintext, key, &[])
    }

    /// Decrypt a field produced by [`FieldCipher::encrypt`].
    pub fn decrypt(field: &EncryptedField, key: &[u8; KEY_LENGTH]) -> Result<String> {
        Self::decrypt_with_aad(field, key, &[])
    }

    /// Encrypt, authenticating `aad` alongside the ciphertext.
    ///
    /// The same `aad` must be supplied to decrypt.
    pub fn encrypt_with_aad(
        plaintext: &str,
        key: &[u8; KEY_LENGTH],
        aad: &[u8],
    ) -> Result<EncryptedField> {
        let sealing_key = aead_key(key)
            .map_err(|_| CardkeepError::Crypto("failed to create AES-256-GCM key".to_string()))?;

        let nonce_bytes = random_array("nonce")?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        let mut ciphertext = plaintext.as_bytes().to_vec();
        let tag = sealing_key
            .seal_in_place_separate_tag(nonce, Aad::from(aad), &mut ciphertext)
            .map_err(|_| CardkeepError::Crypto("AES-256-GCM encryption failed".to_string()))?;
        let tag: [u8; TAG_LENGTH] = tag
            .as_ref()
            .try_into()
            .map_err(|_| CardkeepError::Crypto("unexpected AES-256-GCM tag length".to_string()))?;

        Ok(EncryptedField {
            ciphertext,
            nonce: nonce_bytes,
            tag,
        })
    }

    /// Decrypt and authenticate.
    ///
    /// Wrong key, wrong `aad`, a flipped bit anywhere, or plaintext that is not
    /// UTF-8 all produce the same [`CardkeepError::DecryptionFailed`].
    pub fn decrypt_with_aad(
        field: &EncryptedField,
        key: &[u8; KEY_LENGTH],
        aad: &[u8],
    ) -> Result<String> {
        let opening_key = aead_key(key).map_err(|_| CardkeepError::DecryptionFailed)?;
        let nonce = Nonce::assume_unique_for_key(field.nonce);

        let mut in_out = Zeroizing::new(Vec::with_capacity(field.ciphertext.len() + TAG_LENGTH));
        in_out.extend_from_slice(&field.ciphertext);
        in_out.extend_from_slice(&field.tag);

        let plaintext = opening_key
            .open_in_place(nonce, Aad::from(aad), &mut in_out)
            .map_err(|_| CardkeepError::DecryptionFailed)?;

        std::str::from_utf8(plaintext)
            .map(str::to_owned)
            .map_err(|_| CardkeepError::DecryptionFailed)
    }
}

fn aead_key(key: &[u8; KEY_LENGTH]) -> std::result::Result<LessSafeKey, ring::error::Unspecified> {
    Ok(LessSafeKey::new(UnboundKey::new(&AES_256_GCM, key)?))
}
