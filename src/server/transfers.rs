use axum::body::Bytes;
use axum::extract::State;
use axum::{Extension, Json};
use payguard_agent_auth::AuthenticatedAgent;
use payguard_core_types::{AgentId, Clock, RequestId};
use payguard_execution_firewall::{
    FirewallDecision, FirewallRequest, ProviderContext, TransactionContext,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::state::GatewayState;
use crate::audit::AuditRecord;
use crate::errors::GatewayError;

#[derive(Debug, Clone, Deserialize)]
pub struct TransferRequest {
    pub tx: TransactionContext,
    #[serde(default)]
    pub provider: Option<ProviderContext>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferResponse {
    pub request_id: RequestId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<AgentId>,
    pub decision: FirewallDecision,
}

/// A REJECTED decision is still a 200: firewall outcomes are answers, not errors.
#[instrument(skip_all, fields(request_id = %request_id))]
pub(crate) async fn create_transfer(
    State(state): State<GatewayState>,
    Extension(request_id): Extension<RequestId>,
    agent: Option<Extension<AuthenticatedAgent>>,
    body: Bytes,
) -> Result<Json<TransferResponse>, GatewayError> {
    let payload: TransferRequest = serde_json::from_slice(&body).map_err(|err| {
        GatewayError::invalid_request(format!("malformed transfer body: {err}"))
            .with_request_id(request_id.as_str())
    })?;
    let agent = agent.map(|Extension(agent)| agent);

    let mut request = FirewallRequest::new(payload.tx);
    if let Some(provider) = payload.provider {
        request = request.with_provider(provider);
    }
    if let Some(agent) = &agent {
        request = request.for_agent(agent.agent_id.as_str());
    }
    let decision = state.firewall.evaluate(&request).await;

    let record = AuditRecord {
        request_id: request_id.clone(),
        agent_id: agent.as_ref().map(|agent| agent.agent_id.clone()),
        key_id: agent.as_ref().map(|agent| agent.key_id.clone()),
        tx: request.tx.clone(),
        provider_id: request.provider.as_ref().map(|provider| provider.id.clone()),
        decision: decision.clone(),
        recorded_at: state.clock.now(),
    };
    state.audit.record(&record);
    info!(
        decision = decision.decision.as_str(),
        risk_level = decision.risk_level.as_u8(),
        "transfer evaluated"
    );

    Ok(Json(TransferResponse {
        request_id,
        agent_id: record.agent_id,
        decision,
    }))
}
