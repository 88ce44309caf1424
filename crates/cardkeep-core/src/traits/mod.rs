// SPDX-FileCopyrightText: 2026 Cardkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Boundary traits implemented outside the protection subsystem.
//!
//! Traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod store;

pub use store::CredentialStore;
