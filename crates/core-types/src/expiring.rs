use std::hash::Hash;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// Key/value store whose entries stop counting once their expiry passes.
///
/// Correctness only relies on `insert_if_absent` treating expired entries as absent; physical
/// removal through `sweep_expired` may lag arbitrarily.
pub trait ExpiringStore<K>: Send + Sync {
    /// Atomically records `key` unless a live entry already holds it. Returns `true` on insert.
    fn insert_if_absent(&self, key: K, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool;

    fn contains_live(&self, key: &K, now: DateTime<Utc>) -> bool;

    /// Drops entries whose expiry is at or before `now`, returning how many were removed.
    fn sweep_expired(&self, now: DateTime<Utc>) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
pub struct MemoryExpiringStore<K>
where
    K: Eq + Hash,
{
    entries: DashMap<K, DateTime<Utc>>,
}

impl<K> MemoryExpiringStore<K>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<K> Default for MemoryExpiringStore<K>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> ExpiringStore<K> for MemoryExpiringStore<K>
where
    K: Eq + Hash + Send + Sync,
{
    fn insert_if_absent(&self, key: K, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self.entries.entry(key) {
            Entry::Occupied(mut occ) => {
                if *occ.get() > now {
                    false
                } else {
                    occ.insert(expires_at);
                    true
                }
            }
            Entry::Vacant(vac) => {
                vac.insert(expires_at);
                true
            }
        }
    }

    fn contains_live(&self, key: &K, now: DateTime<Utc>) -> bool {
        self.entries
            .get(key)
            .map(|expires_at| *expires_at > now)
            .unwrap_or(false)
    }

    fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, expires_at| *expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
