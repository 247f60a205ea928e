use crate::{
    AppState,
    agents::{AgentId, Topic},
    utils::circuit_breaker::CircuitState,
};
use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

/// List the agent team with routing and health information
#[utoipa::path(
    get,
    path = "/api/agents",
    responses(
        (status = 200, description = "All agents", body = Vec<AgentInfo>),
        (status = 401, description = "Missing or invalid API key")
    ),
    tag = "agents"
)]
pub async fn list_agents(State(state): State<AppState>) -> Json<Vec<AgentInfo>> {
    let registry = state.orchestrator.registry();
    let invoker = state.orchestrator.invoker();

    Json(
        AgentId::ALL
            .into_iter()
            .map(|id| AgentInfo {
                id,
                name: id.display_name(),
                description: id.description().to_string(),
                topics: registry.topics_for_agent(id),
                registered: registry.contains(id),
                circuit_state: invoker.circuit_state(id),
            })
            .collect(),
    )
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AgentInfo {
    pub id: AgentId,
    pub name: String,
    pub description: String,
    pub topics: Vec<Topic>,
    pub registered: bool,
    pub circuit_state: CircuitState,
}
