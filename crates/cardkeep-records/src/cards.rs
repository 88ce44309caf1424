// SPDX-FileCopyrightText: 2026 Cardkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sensitive parts of a stored loyalty card.

use std::fmt;

use cardkeep_core::{EncodedField, EncryptedField, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Plaintext card secrets as supplied by the owner.
pub struct CardSecrets {
    pub card_number: SecretString,
    /// Optional PIN. `None` means the card has no PIN, which is different
    /// from an empty PIN.
    pub pin: Option<SecretString>,
}

impl CardSecrets {
    pub fn new(card_number: impl Into<String>, pin: Option<String>) -> Self {
        Self {
            card_number: SecretString::from(card_number.into()),
            pin: pin.map(SecretString::from),
        }
    }
}

impl fmt::Debug for CardSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardSecrets")
            .field("card_number", &"[REDACTED]")
            .field("pin", &self.pin.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Encrypted card secrets, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedCard {
    pub card_number: EncryptedField,
    pub pin: Option<EncryptedField>,
}

impl ProtectedCard {
    /// Text form of every present field.
    pub fn encode(&self) -> EncodedCard {
        EncodedCard {
            card_number: self.card_number.encode(),
            pin: self.pin.as_ref().map(EncryptedField::encode),
        }
    }
}

/// Persistence representation of a [`ProtectedCard`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedCard {
    pub card_number: EncodedField,
    pub pin: Option<EncodedField>,
}

impl EncodedCard {
    pub fn decode(&self) -> Result<ProtectedCard> {
        Ok(ProtectedCard {
            card_number: self.card_number.decode()?,
            pin: self.pin.as_ref().map(EncodedField::decode).transpose()?,
        })
    }
}

/// Decrypted card secrets returned to the owner. Same shape as the input.
pub type RevealedCard = CardSecrets;
