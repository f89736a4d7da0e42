use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use payguard_core_types::{AgentId, KeyId, RequestId};
use payguard_execution_firewall::{FirewallDecision, TransactionContext};
use serde::Serialize;
use tracing::info;

pub const AUDIT_TARGET: &str = "payguard::audit";

/// One firewall outcome, as persisted for later review.
#[derive(Clone, Debug, Serialize)]
pub struct AuditRecord {
    pub request_id: RequestId,
    pub agent_id: Option<AgentId>,
    pub key_id: Option<KeyId>,
    pub tx: TransactionContext,
    pub provider_id: Option<String>,
    pub decision: FirewallDecision,
    pub recorded_at: DateTime<Utc>,
}

pub trait AuditSink: Send + Sync {
    fn record(&self, record: &AuditRecord);
}

/// Emits each record as a structured event on the `payguard::audit` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: &AuditRecord) {
        let reasons = record.decision.reasons.join("; ");
        info!(
            target: AUDIT_TARGET,
            request_id = %record.request_id,
            agent_id = record.agent_id.as_ref().map(AgentId::as_str).unwrap_or("-"),
            chain_id = record.tx.chain_id,
            from = %record.tx.from,
            to = %record.tx.to,
            value = %record.tx.value,
            provider_id = record.provider_id.as_deref().unwrap_or("-"),
            decision = record.decision.decision.as_str(),
            risk_level = record.decision.risk_level.as_u8(),
            reasons = %reasons,
            "transfer decision"
        );
    }
}

/// Keeps records in memory, mostly for tests.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: &AuditRecord) {
        self.records.lock().push(record.clone());
    }
}
