//! Temporary per-client deny state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Client identities temporarily denied service.
///
/// Each entry records the instant its block lapses. An entry whose time
/// has passed is treated as absent: `is_blocked` removes it lazily when
/// it sees one, and `cleanup` evicts them in bulk.
#[derive(Debug, Default)]
pub struct BlockList {
    entries: RwLock<HashMap<String, Instant>>,
    total_blocks: AtomicU64,
}

impl BlockList {
    /// Create an empty block list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a block for `client` lasting `duration` from
    /// `now`.
    ///
    /// Re-blocking an already-blocked client replaces the entry, so the
    /// expiry extends to `now + duration`. The reason is recorded in the
    /// audit log only; it does not affect expiry.
    pub fn block(&self, client: &str, duration: Duration, reason: &str, now: Instant) {
        let until = now + duration;

        {
            let mut entries = self.entries.write().unwrap();
            entries.insert(client.to_string(), until);
        }

        self.total_blocks.fetch_add(1, Ordering::Relaxed);
        warn!(
            client,
            reason,
            duration_secs = duration.as_secs(),
            "client blocked"
        );
    }

    /// Check whether `client` is blocked at `now`.
    ///
    /// An entry that has expired is removed as a side effect and reported
    /// absent.
    pub fn is_blocked(&self, client: &str, now: Instant) -> bool {
        {
            let entries = self.entries.read().unwrap();
            match entries.get(client) {
                None => return false,
                Some(until) if now < *until => return true,
                Some(_) => {},
            }
        }

        // Entry looked expired; re-check under the write lock in case
        // another thread re-blocked the client meanwhile.
        let mut entries = self.entries.write().unwrap();
        match entries.get(client) {
            Some(until) if now < *until => true,
            Some(_) => {
                entries.remove(client);
                debug!(client, "expired block removed");
                false
            },
            None => false,
        }
    }

    /// Evict every expired entry. Returns the number removed.
    pub fn cleanup(&self, now: Instant) -> usize {
        let mut entries = self.entries.write().unwrap();
        let before = entries.len();
        entries.retain(|_, until| now < *until);
        before - entries.len()
    }

    /// Number of clients currently blocked (expired entries excluded).
    #[must_use]
    pub fn active_blocks(&self, now: Instant) -> usize {
        self.entries
            .read()
            .unwrap()
            .values()
            .filter(|until| now < **until)
            .count()
    }

    /// Total blocks applied since construction, including overwrites.
    #[must_use]
    pub fn total_blocks(&self) -> u64 {
        self.total_blocks.load(Ordering::Relaxed)
    }
}
