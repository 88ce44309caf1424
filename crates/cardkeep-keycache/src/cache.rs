// SPDX-FileCopyrightText: 2026 Cardkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user derived key cache with sliding-window expiry.
//!
//! Entries live in a sharded [`DashMap`], so unrelated users never contend on
//! the same lock. Every read goes through the entry API: the expiry check and
//! the extend-or-evict decision happen under the shard's write lock, so a
//! concurrent reader can never observe a half-expired entry.
//!
//! Keys are held only in process memory. [`DerivedKey`] zeroizes itself when
//! an entry is replaced, evicted, or cleared.

use std::sync::Arc;
use std::time::{Duration, Instant};

use cardkeep_core::{DerivedKey, UserId};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};

/// Upper bound applied to any requested TTL, keeping deadlines representable.
pub const MAX_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

struct CacheEntry {
    key: DerivedKey,
    ttl: Duration,
    expires_at: Instant,
}

impl CacheEntry {
    /// An entry is live up to and including its deadline.
    fn is_live(&self, now: Instant) -> bool {
        now <= self.expires_at
    }
}

/// Process-wide store of unlocked user keys.
///
/// Construct one per process and share it behind an `Arc`.
pub struct KeyCache {
    entries: DashMap<UserId, CacheEntry>,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for KeyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyCache")
            .field("entries", &self.entries.len())
            .field("default_ttl", &self.default_ttl)
            .field("clock", &self.clock)
            .finish()
    }
}

impl KeyCache {
    /// Cache backed by the system clock.
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, Arc::new(SystemClock))
    }

    /// Cache backed by an injected clock.
    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl: default_ttl.min(MAX_TTL),
            clock,
        }
    }

    /// TTL used by [`KeyCache::store_default`].
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Insert or replace the key for `user_id`, expiring `ttl` from now.
    pub fn store(&self, user_id: UserId, key: DerivedKey, ttl: Duration) {
        let ttl = ttl.min(MAX_TTL);
        let now = self.clock.now();
        let replaced = self
            .entries
            .insert(
                user_id,
                CacheEntry {
                    key,
                    ttl,
                    expires_at: now + ttl,
                },
            )
            .is_some();
        debug!(user_id = %user_id, ttl_secs = ttl.as_secs(), replaced, "key cached");
    }

    /// Insert or replace with the cache's default TTL.
    pub fn store_default(&self, user_id: UserId, key: DerivedKey) {
        self.store(user_id, key, self.default_ttl);
    }

    /// Return the key if still live, pushing its deadline to `now + ttl`.
    ///
    /// An expired entry is evicted and `None` returned.
    pub fn try_get(&self, user_id: &UserId) -> Option<DerivedKey> {
        let now = self.clock.now();
        match self.entries.entry(*user_id) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().is_live(now) {
                    let entry = occupied.get_mut();
                    entry.expires_at = now + entry.ttl;
                    Some(entry.key.clone())
                } else {
                    occupied.remove();
                    info!(user_id = %user_id, "cached key expired");
                    None
                }
            }
            Entry::Vacant(_) => None,
        }
    }

    /// Whether a live key is cached, without extending it.
    pub fn contains(&self, user_id: &UserId) -> bool {
        let now = self.clock.now();
        self.entries
            .get(user_id)
            .is_some_and(|entry| entry.is_live(now))
    }

    /// Drop the key for `user_id`. Removing an absent key is a no-op.
    ///
    /// Returns whether an entry was present.
    pub fn remove(&self, user_id: &UserId) -> bool {
        let removed = self.entries.remove(user_id).is_some();
        if removed {
            debug!(user_id = %user_id, "cached key removed");
        }
        removed
    }

    /// Evict every expired entry. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut evicted = 0;
        self.entries.retain(|_, entry| {
            let live = entry.is_live(now);
            if !live {
                evicted += 1;
            }
            live
        });
        evicted
    }

    /// Drop every cached key.
    pub fn clear(&self) {
        let count = self.entries.len();
        self.entries.clear();
        info!(count, "key cache cleared");
    }

    /// Entries currently held, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
