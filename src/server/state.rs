use std::sync::Arc;

use payguard_agent_auth::RequestAuthenticator;
use payguard_core_types::SharedClock;
use payguard_execution_firewall::{ExecutionFirewall, StaticPolicyStore};
use tracing::info;

use crate::audit::AuditSink;
use crate::config::{ConfigError, GatewayConfig};

/// Everything a handler needs. Cloned per request; the stores behind it are shared.
#[derive(Clone)]
pub struct GatewayState {
    pub authenticator: Arc<RequestAuthenticator>,
    pub firewall: Arc<ExecutionFirewall>,
    pub audit: Arc<dyn AuditSink>,
    pub clock: SharedClock,
    pub max_body_bytes: usize,
}

impl GatewayState {
    pub fn from_config(
        config: &GatewayConfig,
        clock: SharedClock,
        audit: Arc<dyn AuditSink>,
    ) -> Result<Self, ConfigError> {
        let authenticator = RequestAuthenticator::from_config(&config.auth, clock.clone())
            .map_err(|err| ConfigError::Invalid(format!("auth.keys: {err}")))?;
        let firewall = build_firewall(config, clock.clone())?;
        info!(
            auth_enabled = authenticator.is_enabled(),
            keys = config.auth.keys.len(),
            window_seconds = authenticator.window_seconds(),
            "gateway state ready"
        );
        Ok(Self {
            authenticator: Arc::new(authenticator),
            firewall: Arc::new(firewall),
            audit,
            clock,
            max_body_bytes: config.server.max_body_bytes,
        })
    }
}

/// Inline policies followed by the ones from `policy_file`. Ids must be unique across both.
pub fn build_policy_store(config: &GatewayConfig) -> Result<StaticPolicyStore, ConfigError> {
    let mut policies = config.policies.clone();
    if let Some(path) = config.policy_file.as_deref() {
        let from_file = StaticPolicyStore::from_file(path)
            .map_err(|err| ConfigError::Invalid(format!("policy_file: {err}")))?;
        policies.extend(from_file.policies().iter().cloned());
    }
    StaticPolicyStore::new(policies).map_err(|err| ConfigError::Invalid(format!("policies: {err}")))
}

pub fn build_firewall(
    config: &GatewayConfig,
    clock: SharedClock,
) -> Result<ExecutionFirewall, ConfigError> {
    let store = build_policy_store(config)?;
    info!(policies = store.len(), "policy store loaded");
    Ok(ExecutionFirewall::new(config.firewall.clone(), clock).with_policy_store(Arc::new(store)))
}
