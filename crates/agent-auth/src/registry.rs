use std::collections::HashMap;

use ed25519_dalek::{SigningKey, VerifyingKey};
use payguard_core_types::{AgentId, KeyId};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

use crate::encoding;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStatus {
    Active,
    Disabled,
}

/// Configured signing key of one agent, as it appears in the gateway configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentKeyRecord {
    #[serde(alias = "keyId")]
    pub key_id: KeyId,
    #[serde(alias = "agentId")]
    pub agent_id: AgentId,
    /// Base64 of the 32-byte Ed25519 verifying key.
    #[serde(alias = "publicKey")]
    pub public_key: String,
    #[serde(default = "default_status")]
    pub status: KeyStatus,
}

fn default_status() -> KeyStatus {
    KeyStatus::Active
}

#[derive(Clone, Debug)]
pub struct VerifyKeyMaterial {
    pub key_id: KeyId,
    pub agent_id: AgentId,
    pub verifying_key: VerifyingKey,
    pub status: KeyStatus,
}

impl VerifyKeyMaterial {
    pub fn is_active(&self) -> bool {
        self.status == KeyStatus::Active
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyRegistryError {
    #[error("duplicate key id {0}")]
    DuplicateKeyId(String),
    #[error("key {key_id}: {reason}")]
    InvalidPublicKey { key_id: String, reason: String },
    #[error("invalid secret key: {0}")]
    InvalidSecretKey(String),
}

/// Read-only lookup from key id to agent identity and verification key.
pub trait KeyRegistry: Send + Sync {
    fn resolve(&self, key_id: &str) -> Option<VerifyKeyMaterial>;
}

#[derive(Clone, Debug, Default)]
pub struct StaticKeyRegistry {
    keys: HashMap<String, VerifyKeyMaterial>,
}

impl StaticKeyRegistry {
    /// Decodes every record up front so malformed keys fail at startup, not per request.
    pub fn from_records(records: &[AgentKeyRecord]) -> Result<Self, KeyRegistryError> {
        let mut keys = HashMap::with_capacity(records.len());
        for record in records {
            let verifying_key = decode_verifying_key(&record.public_key).map_err(|reason| {
                KeyRegistryError::InvalidPublicKey {
                    key_id: record.key_id.0.clone(),
                    reason,
                }
            })?;
            let material = VerifyKeyMaterial {
                key_id: record.key_id.clone(),
                agent_id: record.agent_id.clone(),
                verifying_key,
                status: record.status,
            };
            if keys.insert(record.key_id.0.clone(), material).is_some() {
                return Err(KeyRegistryError::DuplicateKeyId(record.key_id.0.clone()));
            }
        }
        Ok(Self { keys })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn active_count(&self) -> usize {
        self.keys.values().filter(|key| key.is_active()).count()
    }
}

impl KeyRegistry for StaticKeyRegistry {
    fn resolve(&self, key_id: &str) -> Option<VerifyKeyMaterial> {
        self.keys.get(key_id).cloned()
    }
}

pub fn decode_verifying_key(encoded: &str) -> Result<VerifyingKey, String> {
    let bytes = encoding::decode(encoded).map_err(|err| format!("not base64: {err}"))?;
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|_| "expected 32-byte ed25519 public key".to_string())?;
    VerifyingKey::from_bytes(&arr).map_err(|err| format!("not an ed25519 point: {err}"))
}

pub fn decode_signing_key(encoded: &str) -> Result<SigningKey, KeyRegistryError> {
    let bytes = Zeroizing::new(
        encoding::decode(encoded)
            .map_err(|err| KeyRegistryError::InvalidSecretKey(format!("not base64: {err}")))?,
    );
    let arr: Zeroizing<[u8; 32]> = Zeroizing::new(bytes.as_slice().try_into().map_err(|_| {
        KeyRegistryError::InvalidSecretKey("expected 32-byte ed25519 secret".into())
    })?);
    Ok(SigningKey::from_bytes(&arr))
}

/// Freshly generated key pair, both halves base64 encoded.
pub struct GeneratedKeyPair {
    pub secret_key: Zeroizing<String>,
    pub public_key: String,
}

pub fn generate_keypair() -> GeneratedKeyPair {
    let signing = SigningKey::generate(&mut OsRng);
    let secret = Zeroizing::new(signing.to_bytes());
    GeneratedKeyPair {
        secret_key: Zeroizing::new(encoding::encode(secret.as_slice())),
        public_key: encoding::encode(signing.verifying_key().as_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kid: &str, agent: &str, public_key: String, status: KeyStatus) -> AgentKeyRecord {
        AgentKeyRecord {
            key_id: KeyId::new(kid),
            agent_id: AgentId::new(agent),
            public_key,
            status,
        }
    }

    #[test]
    fn generated_pairs_round_trip_through_registry() {
        let pair = generate_keypair();
        let signing = decode_signing_key(&pair.secret_key).unwrap();
        let registry = StaticKeyRegistry::from_records(&[record(
            "kid-1",
            "agent-1",
            pair.public_key.clone(),
            KeyStatus::Active,
        )])
        .unwrap();
        let resolved = registry.resolve("kid-1").unwrap();
        assert_eq!(resolved.verifying_key, signing.verifying_key());
        assert_eq!(resolved.agent_id, AgentId::new("agent-1"));
        assert!(registry.resolve("kid-2").is_none());
    }

    #[test]
    fn duplicate_key_ids_are_rejected() {
        let pair = generate_keypair();
        let err = StaticKeyRegistry::from_records(&[
            record("kid-1", "agent-1", pair.public_key.clone(), KeyStatus::Active),
            record("kid-1", "agent-2", pair.public_key, KeyStatus::Disabled),
        ])
        .unwrap_err();
        assert_eq!(err, KeyRegistryError::DuplicateKeyId("kid-1".into()));
    }

    #[test]
    fn malformed_public_keys_fail_fast() {
        let err = StaticKeyRegistry::from_records(&[record(
            "kid-1",
            "agent-1",
            encoding::encode(&[1, 2, 3]),
            KeyStatus::Active,
        )])
        .unwrap_err();
        assert!(matches!(err, KeyRegistryError::InvalidPublicKey { .. }));
    }

    #[test]
    fn disabled_keys_still_resolve_but_are_inactive() {
        let pair = generate_keypair();
        let registry = StaticKeyRegistry::from_records(&[record(
            "kid-off",
            "agent-1",
            pair.public_key,
            KeyStatus::Disabled,
        )])
        .unwrap();
        assert!(!registry.resolve("kid-off").unwrap().is_active());
        assert_eq!(registry.active_count(), 0);
    }
}
