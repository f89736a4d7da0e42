//! Authentication gate for agent-originated requests.
//!
//! Every state-changing call carries an Ed25519 signature over a canonical string built from the
//! request line, transport host and a set of declared headers. The [`RequestAuthenticator`] checks
//! headers, key ownership, clock skew, nonce freshness, body digest, signature and the allow list,
//! in that order, and reports the first failure as a stable [`AuthError`] code.

pub mod allow;
pub mod authenticator;
pub mod canonical;
pub mod config;
pub mod digest;
pub mod encoding;
pub mod envelope;
pub mod errors;
pub mod headers;
pub mod prelude;
pub mod registry;
pub mod replay;
pub mod signer;

pub use allow::{AllowList, AllowRule};
pub use authenticator::{AuthOutcome, AuthenticatedAgent, RequestAuthenticator};
pub use config::AuthenticatorConfig;
pub use envelope::SignedRequestEnvelope;
pub use errors::AuthError;
pub use registry::{
    decode_signing_key, generate_keypair, AgentKeyRecord, KeyRegistry, KeyRegistryError, KeyStatus,
    StaticKeyRegistry,
    VerifyKeyMaterial,
};
pub use replay::{ReplayCache, ReplayKey};
pub use signer::RequestSigner;
