use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use payguard_core_types::saturating_sub;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RateKey {
    pub provider_id: String,
    pub caller: String,
}

impl RateKey {
    pub fn new(provider_id: impl Into<String>, caller: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            caller: caller.into(),
        }
    }
}

/// Sliding window of request instants per (provider, caller).
pub trait RateWindowStore: Send + Sync {
    /// Inserts `now` in order, drops instants older than `window` before the newest one, and
    /// returns the remaining count. Instants may arrive out of order.
    fn record(&self, key: &RateKey, now: DateTime<Utc>, window: Duration) -> usize;

    /// Removes keys whose newest instant is older than `window`.
    fn prune_idle(&self, now: DateTime<Utc>, window: Duration) -> usize;
}

#[derive(Debug, Default)]
pub struct MemoryRateWindowStore {
    windows: DashMap<RateKey, VecDeque<DateTime<Utc>>>,
}

impl MemoryRateWindowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

impl RateWindowStore for MemoryRateWindowStore {
    fn record(&self, key: &RateKey, now: DateTime<Utc>, window: Duration) -> usize {
        let mut entry = self.windows.entry(key.clone()).or_default();
        let position = entry.partition_point(|at| *at <= now);
        entry.insert(position, now);
        let newest = entry.back().copied().unwrap_or(now);
        let cutoff = saturating_sub(newest, window);
        while entry.front().map(|at| *at <= cutoff).unwrap_or(false) {
            entry.pop_front();
        }
        entry.len()
    }

    fn prune_idle(&self, now: DateTime<Utc>, window: Duration) -> usize {
        let cutoff = saturating_sub(now, window);
        let before = self.windows.len();
        self.windows
            .retain(|_, instants| instants.back().map(|at| *at > cutoff).unwrap_or(false));
        before.saturating_sub(self.windows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(seconds: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    #[test]
    fn counts_only_the_trailing_window() {
        let store = MemoryRateWindowStore::new();
        let key = RateKey::new("p1", "0xa");
        let window = Duration::seconds(60);
        assert_eq!(store.record(&key, t(0), window), 1);
        assert_eq!(store.record(&key, t(30), window), 2);
        assert_eq!(store.record(&key, t(60), window), 2);
        assert_eq!(store.record(&key, t(91), window), 2);
    }

    #[test]
    fn late_instants_are_ordered_and_expire() {
        let store = MemoryRateWindowStore::new();
        let key = RateKey::new("p1", "0xa");
        let window = Duration::seconds(60);
        assert_eq!(store.record(&key, t(100), window), 1);
        assert_eq!(store.record(&key, t(90), window), 2);
        // Older than the window relative to the newest instant: counted out immediately.
        assert_eq!(store.record(&key, t(10), window), 2);
        assert_eq!(store.record(&key, t(155), window), 2);
        assert_eq!(store.record(&key, t(200), window), 2);
    }

    #[test]
    fn huge_windows_do_not_overflow() {
        let store = MemoryRateWindowStore::new();
        let key = RateKey::new("p1", "0xa");
        let window = Duration::days(100_000_000);
        assert_eq!(store.record(&key, t(0), window), 1);
        assert_eq!(store.record(&key, t(1), window), 2);
        assert_eq!(store.prune_idle(t(2), window), 0);
    }

    #[test]
    fn keys_are_independent() {
        let store = MemoryRateWindowStore::new();
        let window = Duration::seconds(60);
        store.record(&RateKey::new("p1", "0xa"), t(0), window);
        assert_eq!(store.record(&RateKey::new("p2", "0xa"), t(0), window), 1);
        assert_eq!(store.record(&RateKey::new("p1", "0xb"), t(0), window), 1);
    }

    #[test]
    fn idle_windows_are_pruned() {
        let store = MemoryRateWindowStore::new();
        let window = Duration::seconds(60);
        store.record(&RateKey::new("p1", "0xa"), t(0), window);
        store.record(&RateKey::new("p1", "0xb"), t(100), window);
        assert_eq!(store.prune_idle(t(120), window), 1);
        assert_eq!(store.len(), 1);
    }
}
