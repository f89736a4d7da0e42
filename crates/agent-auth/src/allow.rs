use std::collections::HashSet;

use payguard_core_types::AgentId;
use serde::{Deserialize, Serialize};

/// Grants one agent access to one exact (method, path) operation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllowRule {
    #[serde(alias = "agentId")]
    pub agent_id: AgentId,
    pub method: String,
    pub path: String,
}

#[derive(Clone, Debug, Default)]
pub struct AllowList {
    rules: HashSet<(String, String, String)>,
}

impl AllowList {
    pub fn new(rules: &[AllowRule]) -> Self {
        let rules = rules
            .iter()
            .map(|rule| {
                (
                    rule.agent_id.0.clone(),
                    rule.method.to_ascii_uppercase(),
                    rule.path.clone(),
                )
            })
            .collect();
        Self { rules }
    }

    /// Exact match only; the path never includes the query string. Methods compare uppercase.
    pub fn permits(&self, agent_id: &AgentId, method: &str, path: &str) -> bool {
        self.rules.contains(&(
            agent_id.0.clone(),
            method.to_ascii_uppercase(),
            path.to_string(),
        ))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
