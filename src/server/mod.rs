//! HTTP surface: request ids, the authentication gate and the transfer route.

mod auth_layer;
mod request_id;
mod router;
mod state;
mod transfers;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub use auth_layer::{authenticate_agent, envelope_from_parts};
pub use request_id::assign_request_id;
pub use router::build_router;
pub use state::{build_firewall, build_policy_store, GatewayState};
pub use transfers::{TransferRequest, TransferResponse};
