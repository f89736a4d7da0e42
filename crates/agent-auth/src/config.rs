use payguard_core_types::MAX_WINDOW_SECONDS;
use serde::{Deserialize, Serialize};

use crate::allow::AllowRule;
use crate::registry::AgentKeyRecord;

pub const DEFAULT_TIMESTAMP_WINDOW_SECONDS: u64 = 300;

/// Authentication gate settings. `enabled` has no default: turning the gate off must be written
/// down by the operator.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthenticatorConfig {
    pub enabled: bool,
    #[serde(
        default = "default_window",
        alias = "timestampWindowSeconds"
    )]
    pub timestamp_window_seconds: u64,
    #[serde(default, alias = "replayTtlSeconds")]
    pub replay_ttl_seconds: Option<u64>,
    #[serde(default)]
    pub keys: Vec<AgentKeyRecord>,
    #[serde(default, alias = "allowRules")]
    pub allow_rules: Vec<AllowRule>,
}

fn default_window() -> u64 {
    DEFAULT_TIMESTAMP_WINDOW_SECONDS
}

impl AuthenticatorConfig {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            timestamp_window_seconds: DEFAULT_TIMESTAMP_WINDOW_SECONDS,
            replay_ttl_seconds: None,
            keys: Vec::new(),
            allow_rules: Vec::new(),
        }
    }

    /// Replay entries must outlive every timestamp the window still accepts.
    pub fn effective_replay_ttl_seconds(&self) -> u64 {
        self.replay_ttl_seconds
            .unwrap_or(self.timestamp_window_seconds)
            .max(self.timestamp_window_seconds)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.timestamp_window_seconds == 0 {
            return Err("timestamp_window_seconds must be positive".into());
        }
        if self.timestamp_window_seconds > MAX_WINDOW_SECONDS {
            return Err(format!(
                "timestamp_window_seconds must be at most {MAX_WINDOW_SECONDS}"
            ));
        }
        if self.replay_ttl_seconds.is_some_and(|ttl| ttl > MAX_WINDOW_SECONDS) {
            return Err(format!("replay_ttl_seconds must be at most {MAX_WINDOW_SECONDS}"));
        }
        Ok(())
    }
}
