//! HTTP API Handlers and Routes
//!
//! This module provides the REST and WebSocket API for GENESIS, built on the
//! Axum web framework.
//!
//! # API Endpoints
//!
//! ## Chat
//! - `POST /api/chat` - Route a message through the agent team
//! - `GET /api/chat/ws` - WebSocket; one chat request per text frame
//!
//! ## Routing
//! - `POST /api/analyze` - Dry-run: intent, complexity and plan, no agent calls
//!
//! ## Agents
//! - `GET /api/agents` - Agents, their topics, registration and circuit state
//!
//! ## Service
//! - `GET /health` - Liveness probe, returns `OK`
//! - `GET /api/openapi.json` - OpenAPI document
//!
//! # Authentication
//!
//! See [`crate::auth`]. Only `/api/*` routes are guarded; `/health` is
//! always open.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use utoipa::OpenApi;

/// OpenAPI document for the GENESIS API
#[derive(OpenApi)]
#[openapi(
    info(title = "GENESIS A2A API", description = "Agent-to-agent orchestration for the GENESIS coaching team"),
    paths(
        handlers::chat::chat,
        handlers::chat::chat_ws,
        handlers::analyze::analyze,
        handlers::agents::list_agents,
    ),
    components(schemas(
        crate::types::ChatRequest,
        crate::types::ChatResponse,
        crate::types::ResponseMetadata,
        crate::types::PerspectiveSummary,
        crate::types::PerspectiveStatus,
        crate::types::AnalyzeRequest,
        crate::types::RoutingPreview,
        crate::types::IntentResult,
        crate::types::ComplexityAssessment,
        crate::coordination::CollaborationPlan,
        crate::coordination::CollaborationMode,
        crate::coordination::ComplexityLevel,
        crate::agents::AgentId,
        crate::agents::Topic,
        crate::utils::circuit_breaker::CircuitState,
        handlers::agents::AgentInfo,
    )),
    tags(
        (name = "chat", description = "Conversational endpoints"),
        (name = "routing", description = "Routing inspection"),
        (name = "agents", description = "Agent team")
    )
)]
pub struct ApiDoc;
