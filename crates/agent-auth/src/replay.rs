use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use payguard_core_types::{saturating_add, AgentId, ExpiringStore, MemoryExpiringStore};
use tracing::debug;

use crate::errors::AuthError;

pub const DEFAULT_SWEEP_EVERY: u64 = 64;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReplayKey {
    pub agent_id: AgentId,
    pub nonce: String,
}

/// Remembers (agent, nonce) pairs until their expiry so a signed request is accepted once.
#[derive(Clone)]
pub struct ReplayCache {
    store: Arc<dyn ExpiringStore<ReplayKey>>,
    ttl: Duration,
    sweep_every: u64,
    inserts: Arc<AtomicU64>,
}

impl ReplayCache {
    pub fn new(store: Arc<dyn ExpiringStore<ReplayKey>>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            sweep_every: DEFAULT_SWEEP_EVERY,
            inserts: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn in_memory(ttl: Duration) -> Self {
        Self::new(Arc::new(MemoryExpiringStore::new()), ttl)
    }

    /// Zero disables opportunistic sweeping.
    pub fn with_sweep_every(mut self, every: u64) -> Self {
        self.sweep_every = every;
        self
    }

    /// Raises the TTL to at least `floor`. The TTL must cover the whole timestamp window.
    pub fn with_ttl_at_least(mut self, floor: Duration) -> Self {
        self.ttl = self.ttl.max(floor);
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Claims the pair or fails with `replay_detected`. The claim is atomic per pair.
    ///
    /// The entry lives until one second past `max(now, signed_at) + ttl`, so it outlasts every
    /// instant at which `signed_at` still passes a skew check of at most `ttl` seconds.
    pub fn claim(
        &self,
        agent_id: &AgentId,
        nonce: &str,
        signed_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let key = ReplayKey {
            agent_id: agent_id.clone(),
            nonce: nonce.to_string(),
        };
        let expires_at = saturating_add(now.max(signed_at), self.ttl + Duration::seconds(1));
        if !self.store.insert_if_absent(key, expires_at, now) {
            return Err(AuthError::ReplayDetected {
                agent_id: agent_id.0.clone(),
            });
        }
        self.maybe_sweep(now);
        Ok(())
    }

    pub fn is_live(&self, agent_id: &AgentId, nonce: &str, now: DateTime<Utc>) -> bool {
        let key = ReplayKey {
            agent_id: agent_id.clone(),
            nonce: nonce.to_string(),
        };
        self.store.contains_live(&key, now)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    fn maybe_sweep(&self, now: DateTime<Utc>) {
        if self.sweep_every == 0 {
            return;
        }
        let count = self.inserts.fetch_add(1, Ordering::Relaxed) + 1;
        if count % self.sweep_every == 0 {
            let removed = self.store.sweep_expired(now);
            if removed > 0 {
                debug!(removed, remaining = self.store.len(), "swept expired replay entries");
            }
        }
    }
}
