//! PayGuard: an authorization gateway that lets autonomous agents execute transfers only after a
//! signed-request check and an execution-firewall decision.
//!
//! The gates live in their own crates; this crate wires them into configuration, an axum server,
//! an audit trail and the `payguard` CLI.

pub mod audit;
pub mod cli;
pub mod config;
pub mod errors;
pub mod server;

pub use audit::{AuditRecord, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use config::{ConfigError, GatewayConfig, ServerConfig};
pub use errors::GatewayError;
pub use server::{build_router, GatewayState};
