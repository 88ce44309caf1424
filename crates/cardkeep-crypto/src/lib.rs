// SPDX-FileCopyrightText: 2026 Cardkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cryptographic building blocks for cardkeep.
//!
//! - [`PasswordHasher`]: Argon2id hashing into a self-describing
//!   `$argon2id$v=19$m=..,t=..,p=..$salt$hash` string, with constant-time
//!   verification.
//! - [`KeyDeriver`]: PBKDF2-HMAC-SHA256 turning a password and per-user salt
//!   into a 256-bit [`DerivedKey`](cardkeep_core::DerivedKey).
//! - [`FieldCipher`]: AES-256-GCM over single string fields with a fresh
//!   random nonce per call.
//! - [`PasswordPolicy`]: complexity rules checked at registration.
//!
//! Every operation here is CPU-bound and synchronous. Async callers should
//! run hashing and derivation on a blocking thread.

pub mod cipher;
pub mod kdf;
pub mod password;
pub mod policy;
mod random;

pub use cipher::FieldCipher;
pub use kdf::{KeyDeriver, generate_key_salt};
pub use password::{HashParams, PasswordHasher, verify_password};
pub use policy::PasswordPolicy;
