// SPDX-FileCopyrightText: 2026 Cardkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Protected record service for cardkeep.
//!
//! Ties together the password hasher, key derivation, the key cache, and the
//! field cipher. Callers register a user, log in to unlock the user's derived
//! key, then protect and reveal individual fields (or whole cards) while the
//! session stays unlocked.

pub mod cards;
pub mod memory_store;
pub mod service;

pub use cards::{CardSecrets, EncodedCard, ProtectedCard, RevealedCard};
pub use memory_store::MemoryStore;
pub use service::ProtectedRecordService;
