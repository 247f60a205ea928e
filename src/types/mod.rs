use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::agents::{AgentId, Topic};
use crate::coordination::{CollaborationMode, CollaborationPlan, ComplexityLevel};

// ============= API Request/Response Types =============

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatRequest {
    /// The user's message
    #[serde(alias = "message")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Free-form client context forwarded to agents
    #[serde(default)]
    pub context: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    pub response: String,
    pub agents_used: Vec<AgentId>,
    pub session_id: String,
    pub metadata: ResponseMetadata,
}

/// Routing and coordination details attached to every chat response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResponseMetadata {
    pub intent: String,
    pub confidence: f32,
    pub complexity: ComplexityLevel,
    pub mode: Option<CollaborationMode>,
    pub consensus_score: f32,
    /// True when the reply came from the NEXUS fallback path
    pub fallback: bool,
    pub latency_ms: u64,
    pub perspectives: Vec<PerspectiveSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PerspectiveSummary {
    pub agent_id: AgentId,
    pub status: PerspectiveStatus,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    #[serde(alias = "message")]
    pub text: String,
}

/// Dry-run routing decision for a query
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoutingPreview {
    pub intent: IntentResult,
    pub complexity: ComplexityAssessment,
    pub plan: CollaborationPlan,
}

// ============= Query & Routing Types =============

/// An incoming user request. Built once and only shared by reference afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub user_id: String,
    pub session_id: String,
    pub context: HashMap<String, serde_json::Value>,
}

impl Query {
    pub fn new(
        text: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
            context: HashMap::new(),
        }
    }

    pub fn with_context(mut self, context: HashMap<String, serde_json::Value>) -> Self {
        self.context = context;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IntentResult {
    pub intent_label: String,
    pub confidence: f32,
    pub matched_topics: Vec<Topic>,
}

impl IntentResult {
    pub fn primary_topic(&self) -> Option<Topic> {
        self.matched_topics.first().copied()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ComplexityAssessment {
    pub level: ComplexityLevel,
    pub score: usize,
    pub matched_topics: Vec<Topic>,
    /// Hard indicator phrases found in the query
    pub indicators: Vec<String>,
    /// True when a whole-person phrase ("holistic", ...) was present
    pub integral_request: bool,
}

// ============= Agent Types =============

/// Per-invocation context handed to an agent alongside the query
#[derive(Debug, Clone, Default)]
pub struct AgentContext {
    pub conversation_history: Vec<Message>,
    /// Outputs of other agents this agent should take into account
    pub peer_notes: Vec<PeerNote>,
    /// Extra instruction appended for this call (integration pass, review)
    pub instruction: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerNote {
    pub agent_id: AgentId,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

// ============= Collaboration Types =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PerspectiveStatus {
    Success,
    Failed,
    TimedOut,
    CircuitOpen,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AgentPerspective {
    pub agent_id: AgentId,
    pub response_text: String,
    pub latency_ms: u64,
    pub status: PerspectiveStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentPerspective {
    pub fn success(agent_id: AgentId, response_text: String, latency_ms: u64) -> Self {
        Self {
            agent_id,
            response_text,
            latency_ms,
            status: PerspectiveStatus::Success,
            error: None,
        }
    }

    pub fn failure(
        agent_id: AgentId,
        status: PerspectiveStatus,
        error: impl Into<String>,
        latency_ms: u64,
    ) -> Self {
        Self {
            agent_id,
            response_text: String::new(),
            latency_ms,
            status,
            error: Some(error.into()),
        }
    }

    /// Successful and carrying non-blank text
    pub fn is_usable(&self) -> bool {
        self.status == PerspectiveStatus::Success && !self.response_text.trim().is_empty()
    }

    pub fn summary(&self) -> PerspectiveSummary {
        PerspectiveSummary {
            agent_id: self.agent_id,
            status: self.status,
            latency_ms: self.latency_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CollaborationResult {
    pub perspectives: Vec<AgentPerspective>,
    pub consensus_score: f32,
    pub synthesized_text: String,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Circuit open for agent {0}")]
    CircuitOpen(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether a retry could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::LLM(_) | AppError::Agent(_) | AppError::Timeout(_)
        )
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match &self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::CircuitOpen(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::LLM(_) | AppError::Agent(_) => StatusCode::BAD_GATEWAY,
            AppError::Configuration(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
