pub use crate::{
    allow::{AllowList, AllowRule},
    authenticator::{AuthOutcome, AuthenticatedAgent, RequestAuthenticator},
    config::AuthenticatorConfig,
    digest::content_digest,
    envelope::SignedRequestEnvelope,
    errors::AuthError,
    headers::{
        AGENT_ID_HEADER, CONTENT_DIGEST_HEADER, NONCE_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER,
    },
    registry::{
        decode_signing_key, generate_keypair, AgentKeyRecord, GeneratedKeyPair, KeyRegistry,
        KeyStatus, StaticKeyRegistry,
    },
    replay::ReplayCache,
    signer::RequestSigner,
};
