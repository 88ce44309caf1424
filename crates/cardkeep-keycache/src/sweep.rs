// SPDX-FileCopyrightText: 2026 Cardkeep Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background reclamation of idle cache entries.
//!
//! Lazy expiry on access already keeps the cache correct. The sweeper only
//! frees memory held by users who never come back.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cache::KeyCache;

/// Shortest accepted sweep period.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(10);

/// Spawn a task that calls [`KeyCache::sweep`] every `interval` until `cancel`
/// fires.
///
/// Must be called from within a tokio runtime.
pub fn spawn_sweeper(
    cache: Arc<KeyCache>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let period = interval.max(MIN_SWEEP_INTERVAL);
    info!(interval_secs = period.as_secs(), "key cache sweeper started");

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // Skip the first immediate tick.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = cache.sweep();
                    if evicted > 0 {
                        info!(evicted, remaining = cache.len(), "swept expired keys");
                    } else {
                        debug!("key cache sweep found nothing to evict");
                    }
                }
                _ = cancel.cancelled() => {
                    info!("key cache sweeper shutting down");
                    break;
                }
            }
        }
    })
}
