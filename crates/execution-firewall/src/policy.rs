use std::collections::HashSet;
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use payguard_core_types::{normalize_address, Amount};
use serde::{Deserialize, Serialize};

use crate::errors::PolicyStoreError;

/// Operator-defined rule served by a [`PolicyStore`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Policy {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub config: PolicyConfig,
}

fn default_enabled() -> bool {
    true
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicyConfig {
    SpendingLimit {
        limit: Amount,
        #[serde(default)]
        period: SpendingPeriod,
    },
    ProtocolAllowlist {
        #[serde(default, alias = "allowedAddresses")]
        allowed_addresses: Vec<String>,
        #[serde(default, alias = "allowUnknown")]
        allow_unknown: bool,
    },
    /// Any other policy type. Accepted from the store and skipped during evaluation.
    #[serde(other)]
    Unsupported,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpendingPeriod {
    #[default]
    #[serde(alias = "per-transaction", alias = "perTransaction")]
    PerTransaction,
    Daily,
    Weekly,
    Monthly,
    #[serde(other)]
    Other,
}

impl PolicyConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            PolicyConfig::SpendingLimit { .. } => "spending_limit",
            PolicyConfig::ProtocolAllowlist { .. } => "protocol_allowlist",
            PolicyConfig::Unsupported => "unsupported",
        }
    }
}

/// Outcome of checking one policy against a transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PolicyVerdict {
    Pass,
    Violated(String),
    NotApplicable,
}

impl Policy {
    pub fn check(&self, to: &str, value: Amount) -> PolicyVerdict {
        match &self.config {
            PolicyConfig::SpendingLimit {
                limit,
                period: SpendingPeriod::PerTransaction,
            } => {
                if value > *limit {
                    PolicyVerdict::Violated(format!(
                        "spending_limit: policy {} caps a single transfer at {limit}, got {value}",
                        self.label()
                    ))
                } else {
                    PolicyVerdict::Pass
                }
            }
            PolicyConfig::SpendingLimit { .. } => PolicyVerdict::NotApplicable,
            PolicyConfig::ProtocolAllowlist {
                allowed_addresses,
                allow_unknown,
            } => {
                let to = normalize_address(to);
                let listed = allowed_addresses
                    .iter()
                    .any(|address| normalize_address(address) == to);
                if listed || *allow_unknown {
                    PolicyVerdict::Pass
                } else {
                    PolicyVerdict::Violated(format!(
                        "protocol_allowlist: destination {to} is not allowed by policy {}",
                        self.label()
                    ))
                }
            }
            PolicyConfig::Unsupported => PolicyVerdict::NotApplicable,
        }
    }

    fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn list_enabled_policies(&self) -> Result<Vec<Policy>, PolicyStoreError>;
}

/// Policies fixed at startup, typically from the gateway configuration file.
#[derive(Clone, Debug, Default)]
pub struct StaticPolicyStore {
    policies: Vec<Policy>,
}

impl StaticPolicyStore {
    pub fn new(policies: Vec<Policy>) -> Result<Self, PolicyStoreError> {
        let mut seen = HashSet::new();
        for policy in &policies {
            if !seen.insert(policy.id.as_str()) {
                return Err(PolicyStoreError::Invalid(format!(
                    "duplicate policy id {}",
                    policy.id
                )));
            }
        }
        Ok(Self { policies })
    }

    /// Reads a YAML (or JSON) list of policies.
    pub fn from_file(path: &Path) -> Result<Self, PolicyStoreError> {
        let raw = fs::read_to_string(path)
            .map_err(|err| PolicyStoreError::Io(format!("{}: {err}", path.display())))?;
        let policies: Vec<Policy> = serde_yaml::from_str(&raw)
            .map_err(|err| PolicyStoreError::Invalid(format!("{}: {err}", path.display())))?;
        Self::new(policies)
    }

    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

#[async_trait]
impl PolicyStore for StaticPolicyStore {
    async fn list_enabled_policies(&self) -> Result<Vec<Policy>, PolicyStoreError> {
        Ok(self
            .policies
            .iter()
            .filter(|policy| policy.enabled)
            .cloned()
            .collect())
    }
}
