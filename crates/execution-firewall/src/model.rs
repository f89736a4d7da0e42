use chrono::{DateTime, Utc};
use payguard_core_types::{normalize_address, Amount};
use serde::{Deserialize, Serialize};

/// The transfer under evaluation. Never modified by the firewall.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionContext {
    #[serde(alias = "chainId")]
    pub chain_id: u64,
    pub from: String,
    pub to: String,
    pub value: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl TransactionContext {
    /// Budget and rate windows are keyed by the paying address.
    pub fn caller(&self) -> String {
        normalize_address(&self.from)
    }
}

/// Evidence about the counterparty, supplied by an external trust service.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderContext {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// 0 to 100; larger values above 100 are treated as 100.
    #[serde(alias = "trustScore")]
    pub trust_score: u8,
    #[serde(default, alias = "expectedRecipient", skip_serializing_if = "Option::is_none")]
    pub expected_recipient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
}

impl ProviderContext {
    pub fn trust(&self) -> u8 {
        self.trust_score.min(100)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FirewallRequest {
    pub tx: TransactionContext,
    #[serde(default)]
    pub provider: Option<ProviderContext>,
    /// Evaluation instant; the injected clock is used when absent.
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
    /// Authenticated identity that budget and rate windows are charged to. Falls back to `tx.from`.
    #[serde(default, alias = "agentId", skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

impl FirewallRequest {
    pub fn new(tx: TransactionContext) -> Self {
        Self {
            tx,
            provider: None,
            now: None,
            agent_id: None,
        }
    }

    pub fn with_provider(mut self, provider: ProviderContext) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn for_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    /// Key for budget and rate windows: `agent:<id>` when authenticated, else the payer address.
    pub fn caller_key(&self) -> String {
        match &self.agent_id {
            Some(agent_id) => format!("agent:{agent_id}"),
            None => self.tx.caller(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Approved,
    Warning,
    Rejected,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Approved => "APPROVED",
            Decision::Warning => "WARNING",
            Decision::Rejected => "REJECTED",
        }
    }
}

/// Ordered risk lattice: Low < Elevated < High. Serialized as 1, 2, 3.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
    Low = 1,
    Elevated = 2,
    High = 3,
}

impl RiskLevel {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl Serialize for RiskLevel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_u8())
    }
}

impl<'de> Deserialize<'de> for RiskLevel {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            1 => Ok(RiskLevel::Low),
            2 => Ok(RiskLevel::Elevated),
            3 => Ok(RiskLevel::High),
            other => Err(serde::de::Error::custom(format!(
                "risk level must be 1, 2 or 3, got {other}"
            ))),
        }
    }
}

/// Result of one evaluation. Callers persist it; the firewall never touches it again.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FirewallDecision {
    pub decision: Decision,
    pub risk_level: RiskLevel,
    pub reasons: Vec<String>,
    pub warnings: Vec<String>,
    pub matched_policy_ids: Vec<String>,
    pub remaining_daily_budget: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trust_score: Option<u8>,
    pub rate_window_count: usize,
}

impl FirewallDecision {
    pub fn is_rejected(&self) -> bool {
        self.decision == Decision::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_accepts_camel_case_and_string_amounts() {
        let raw = r#"{
            "tx": {"chainId": 8453, "from": "0xA", "to": "0xB", "value": "20000000"},
            "provider": {"id": "p1", "name": "Acme", "trustScore": 90, "expectedRecipient": "0xB"}
        }"#;
        let req: FirewallRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(req.tx.value, Amount::new(20_000_000));
        assert_eq!(req.tx.caller(), "0xa");
        let provider = req.provider.as_ref().unwrap();
        assert_eq!(provider.trust(), 90);
        assert_eq!(provider.expected_recipient.as_deref(), Some("0xB"));
        assert!(req.now.is_none());
        assert_eq!(req.caller_key(), "0xa");
        assert_eq!(req.for_agent("agent-1").caller_key(), "agent:agent-1");
    }

    #[test]
    fn decision_wire_shape() {
        let decision = FirewallDecision {
            decision: Decision::Warning,
            risk_level: RiskLevel::Elevated,
            reasons: vec!["x".into()],
            warnings: vec!["x".into()],
            matched_policy_ids: vec![],
            remaining_daily_budget: Amount::new(5),
            trust_score: None,
            rate_window_count: 1,
        };
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["decision"], "WARNING");
        assert_eq!(json["risk_level"], 2);
        assert_eq!(json["remaining_daily_budget"], "5");
        assert!(json.get("trust_score").is_none());
    }

    #[test]
    fn risk_levels_are_ordered() {
        assert!(RiskLevel::Low < RiskLevel::Elevated);
        assert!(RiskLevel::Elevated < RiskLevel::High);
        assert!(serde_json::from_str::<RiskLevel>("4").is_err());
    }
}
