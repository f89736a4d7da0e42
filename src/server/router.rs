use axum::http::Method;
use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth_layer::authenticate_agent;
use super::request_id::assign_request_id;
use super::state::GatewayState;
use super::transfers::create_transfer;

/// `/healthz` is open; `/v1/transfers` sits behind the authentication gate.
pub fn build_router(state: GatewayState, cors_permissive: bool) -> Router {
    let transfers = Router::new()
        .route("/v1/transfers", post(create_transfer))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            authenticate_agent,
        ));

    let router = Router::new()
        .route("/healthz", get(health_handler))
        .merge(transfers)
        .layer(middleware::from_fn(assign_request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors_permissive {
        router.layer(cors_layer())
    } else {
        router
    }
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}
