use std::env;
use std::fs;
use std::sync::Arc;

use payguard::audit::MemoryAuditSink;
use payguard::config::{ConfigError, GatewayConfig};
use payguard::server::{build_policy_store, GatewayState};
use payguard_agent_auth::generate_keypair;
use payguard_core_types::{Amount, SystemClock};
use serial_test::serial;
use tempfile::tempdir;

fn gateway_yaml(public_key: &str) -> String {
    format!(
        r#"server:
  bind: "127.0.0.1:0"
auth:
  enabled: true
  timestamp_window_seconds: 120
  keys:
    - key_id: kid-1
      agent_id: agent-1
      public_key: "{public_key}"
  allow_rules:
    - agent_id: agent-1
      method: POST
      path: /v1/transfers
firewall:
  daily_budget: "50_000_000"
  rate_ceiling: 5
policies:
  - id: cap
    name: Per-transfer cap
    config:
      type: spending_limit
      limit: "5000000"
      period: per_transaction
policy_file: extra-policies.yaml
"#
    )
}

const EXTRA_POLICIES: &str = r#"- id: allowlist
  name: Known merchants
  config:
    type: protocol_allowlist
    allowed_addresses: ["0xMerchant"]
    allow_unknown: false
"#;

#[test]
#[serial]
fn yaml_config_loads_with_relative_policy_file() {
    let dir = tempdir().unwrap();
    let pair = generate_keypair();
    let path = dir.path().join("gateway.yaml");
    fs::write(&path, gateway_yaml(&pair.public_key)).unwrap();
    fs::write(dir.path().join("extra-policies.yaml"), EXTRA_POLICIES).unwrap();

    let config = GatewayConfig::load(&path).unwrap();
    assert!(config.auth.enabled);
    assert_eq!(config.auth.timestamp_window_seconds, 120);
    assert_eq!(config.firewall.daily_budget, Amount::new(50_000_000));
    assert_eq!(config.firewall.rate_ceiling, 5);
    assert_eq!(
        config.policy_file.as_deref(),
        Some(dir.path().join("extra-policies.yaml").as_path())
    );

    let store = build_policy_store(&config).unwrap();
    assert_eq!(store.len(), 2);

    let state = GatewayState::from_config(
        &config,
        Arc::new(SystemClock),
        Arc::new(MemoryAuditSink::new()),
    )
    .unwrap();
    assert!(state.authenticator.is_enabled());
}

#[test]
#[serial]
fn json_config_is_accepted() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gateway.json");
    fs::write(
        &path,
        r#"{"auth": {"enabled": false}, "server": {"max_body_bytes": 1024}}"#,
    )
    .unwrap();
    let config = GatewayConfig::load(&path).unwrap();
    assert!(!config.auth.enabled);
    assert_eq!(config.server.max_body_bytes, 1024);
}

#[test]
#[serial]
fn duplicate_policy_ids_across_sources_fail() {
    let dir = tempdir().unwrap();
    let pair = generate_keypair();
    let path = dir.path().join("gateway.yaml");
    fs::write(&path, gateway_yaml(&pair.public_key)).unwrap();
    fs::write(
        dir.path().join("extra-policies.yaml"),
        EXTRA_POLICIES.replace("id: allowlist", "id: cap"),
    )
    .unwrap();

    let config = GatewayConfig::load(&path).unwrap();
    assert!(matches!(
        build_policy_store(&config),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
#[serial]
fn malformed_public_key_fails_state_construction() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gateway.yaml");
    fs::write(&path, gateway_yaml("definitely-not-a-key")).unwrap();
    fs::write(dir.path().join("extra-policies.yaml"), EXTRA_POLICIES).unwrap();

    let config = GatewayConfig::load(&path).unwrap();
    let result = GatewayState::from_config(
        &config,
        Arc::new(SystemClock),
        Arc::new(MemoryAuditSink::new()),
    );
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
#[serial]
fn environment_overrides_win_over_the_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gateway.yaml");
    fs::write(&path, "auth:\n  enabled: false\n").unwrap();

    env::set_var("PAYGUARD_BIND", "0.0.0.0:9443");
    env::set_var("PAYGUARD_FIREWALL_RATE_CEILING", "2");
    let loaded = GatewayConfig::load(&path);
    env::remove_var("PAYGUARD_BIND");
    env::remove_var("PAYGUARD_FIREWALL_RATE_CEILING");

    let config = loaded.unwrap();
    assert_eq!(config.server.bind, "0.0.0.0:9443");
    assert_eq!(config.firewall.rate_ceiling, 2);
}

#[test]
#[serial]
fn missing_file_reports_io_error() {
    let dir = tempdir().unwrap();
    let err = GatewayConfig::load(&dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}
