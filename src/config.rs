//! Gateway configuration: one YAML or JSON file plus `PAYGUARD_*` environment overrides.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use payguard_agent_auth::AuthenticatorConfig;
use payguard_core_types::Amount;
use payguard_execution_firewall::{FirewallConfig, Policy};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub const ENV_PREFIX: &str = "PAYGUARD_";
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid value {value:?} for {key}")]
    InvalidOverride { key: String, value: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub max_body_bytes: usize,
    /// Answers CORS preflights from any origin.
    pub cors_permissive: bool,
    /// Interval for pruning idle rate windows and past budget days. Zero disables it.
    pub prune_interval_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            cors_permissive: false,
            prune_interval_seconds: 300,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    /// Required section; `auth.enabled` must be spelled out.
    pub auth: AuthenticatorConfig,
    #[serde(default)]
    pub firewall: FirewallConfig,
    #[serde(default)]
    pub policies: Vec<Policy>,
    /// Optional extra policy list, resolved relative to the config file.
    #[serde(default)]
    pub policy_file: Option<PathBuf>,
}

impl GatewayConfig {
    /// Reads, applies environment overrides and validates.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        info!(path = %path.display(), "loaded gateway configuration");
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_str_for(path, &raw)?;
        if let Some(policy_file) = config.policy_file.as_mut() {
            if policy_file.is_relative() {
                if let Some(parent) = path.parent() {
                    *policy_file = parent.join(&*policy_file);
                }
            }
        }
        Ok(config)
    }

    fn from_str_for(path: &Path, raw: &str) -> Result<Self, ConfigError> {
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let parsed = if is_json {
            serde_json::from_str(raw).map_err(|err| err.to_string())
        } else {
            serde_yaml::from_str(raw).map_err(|err| err.to_string())
        };
        parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Applies `PAYGUARD_*` scalar overrides. `lookup` maps a full variable name to its value.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |suffix: &str| {
            let key = format!("{ENV_PREFIX}{suffix}");
            lookup(&key).map(|value| (key, value.trim().to_string()))
        };

        if let Some((_, value)) = get("BIND") {
            self.server.bind = value;
        }
        if let Some((key, value)) = get("AUTH_ENABLED") {
            self.auth.enabled = parse_bool(&key, &value)?;
        }
        if let Some((key, value)) = get("AUTH_TIMESTAMP_WINDOW_SECONDS") {
            self.auth.timestamp_window_seconds = parse_num(&key, &value)?;
        }
        if let Some((key, value)) = get("AUTH_REPLAY_TTL_SECONDS") {
            self.auth.replay_ttl_seconds = Some(parse_num(&key, &value)?);
        }
        if let Some((key, value)) = get("FIREWALL_DAILY_BUDGET") {
            self.firewall.daily_budget = parse_amount(&key, &value)?;
        }
        if let Some((key, value)) = get("FIREWALL_HIGH_SPEND_THRESHOLD") {
            self.firewall.high_spend_threshold = parse_amount(&key, &value)?;
        }
        if let Some((key, value)) = get("FIREWALL_LOW_BALANCE_THRESHOLD") {
            self.firewall.low_balance_threshold = parse_amount(&key, &value)?;
        }
        if let Some((key, value)) = get("FIREWALL_RATE_WINDOW_SECONDS") {
            self.firewall.rate_window_seconds = parse_num(&key, &value)?;
        }
        if let Some((key, value)) = get("FIREWALL_RATE_CEILING") {
            self.firewall.rate_ceiling = parse_num(&key, &value)?;
        }
        if let Some((key, value)) = get("FIREWALL_POLICY_TIMEOUT_MS") {
            self.firewall.policy_timeout_ms = parse_num(&key, &value)?;
        }
        if let Some((key, value)) = get("FIREWALL_BOOK_SPEND_ON_REJECT") {
            self.firewall.book_spend_on_reject = parse_bool(&key, &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind.trim().is_empty() {
            return Err(ConfigError::Invalid("server.bind must not be empty".into()));
        }
        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be positive".into(),
            ));
        }
        self.auth
            .validate()
            .map_err(|reason| ConfigError::Invalid(format!("auth: {reason}")))?;
        if self.auth.enabled && self.auth.keys.is_empty() {
            return Err(ConfigError::Invalid(
                "auth is enabled but no keys are configured".into(),
            ));
        }
        self.firewall
            .validate()
            .map_err(|reason| ConfigError::Invalid(format!("firewall: {reason}")))?;
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse::<T>().map_err(|_| invalid(key, value))
}

fn parse_amount(key: &str, value: &str) -> Result<Amount, ConfigError> {
    value.parse::<Amount>().map_err(|_| invalid(key, value))
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidOverride {
        key: key.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const MINIMAL: &str = "auth:\n  enabled: false\n";

    fn parse(raw: &str) -> GatewayConfig {
        GatewayConfig::from_str_for(Path::new("gateway.yaml"), raw).unwrap()
    }

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = parse(MINIMAL);
        assert_eq!(cfg.server.bind, DEFAULT_BIND);
        assert_eq!(cfg.firewall, FirewallConfig::default());
        assert!(cfg.policies.is_empty());
        cfg.validate().unwrap();
    }

    #[test]
    fn auth_section_is_required() {
        let err = GatewayConfig::from_str_for(Path::new("gateway.yaml"), "server:\n  bind: x\n");
        assert!(matches!(err, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn overrides_replace_scalars() {
        let mut cfg = parse(MINIMAL);
        let vars: HashMap<&str, &str> = [
            ("PAYGUARD_BIND", "0.0.0.0:9000"),
            ("PAYGUARD_FIREWALL_RATE_CEILING", "3"),
            ("PAYGUARD_FIREWALL_DAILY_BUDGET", "5_000_000"),
            ("PAYGUARD_FIREWALL_BOOK_SPEND_ON_REJECT", "off"),
        ]
        .into_iter()
        .collect();
        cfg.apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(cfg.server.bind, "0.0.0.0:9000");
        assert_eq!(cfg.firewall.rate_ceiling, 3);
        assert_eq!(cfg.firewall.daily_budget, Amount::new(5_000_000));
        assert!(!cfg.firewall.book_spend_on_reject);
    }

    #[test]
    fn malformed_override_is_reported() {
        let mut cfg = parse(MINIMAL);
        let err = cfg
            .apply_overrides(|key| (key == "PAYGUARD_AUTH_ENABLED").then(|| "maybe".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOverride { .. }));
    }

    #[test]
    fn enabled_auth_without_keys_is_invalid() {
        let cfg = parse("auth:\n  enabled: true\n");
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn oversized_windows_are_invalid() {
        for raw in [
            "auth:\n  enabled: false\n  timestamp_window_seconds: 18446744073709551615\n",
            "auth:\n  enabled: false\n  replay_ttl_seconds: 18446744073709551615\n",
            "auth:\n  enabled: false\nfirewall:\n  rate_window_seconds: 18446744073709551615\n",
        ] {
            let cfg = parse(raw);
            assert!(
                matches!(cfg.validate(), Err(ConfigError::Invalid(_))),
                "accepted: {raw}"
            );
        }
    }
}
