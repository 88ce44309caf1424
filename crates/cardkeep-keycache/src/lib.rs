// SPDX-FileCopyrightText: 2026 Cardkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory cache of unlocked user keys.
//!
//! A user's derived key is cached after a successful unlock and stays
//! available while the user keeps using it. Each successful
//! [`KeyCache::try_get`] pushes the deadline out by the entry's TTL. An idle
//! entry expires on its own and is evicted lazily on the next access or by
//! the optional [`spawn_sweeper`] task.

pub mod cache;
pub mod clock;
pub mod sweep;

pub use cache::{KeyCache, MAX_TTL};
pub use clock::{Clock, ManualClock, SystemClock};
pub use sweep::spawn_sweeper;
