//! Multi-agent coordination
//!
//! Everything between "we know what the user asked about" and "here is one
//! reply": choosing participants and a collaboration mode, invoking agents
//! under timeout/retry/circuit-breaker protection, and merging their
//! perspectives.

pub mod coordinator;
pub mod invoker;
pub mod synthesizer;

use crate::agents::AgentId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use coordinator::MultiAgentCoordinator;
pub use invoker::AgentInvoker;
pub use synthesizer::ResponseSynthesizer;

/// How involved a query is, from one specialist to whole-person coaching
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    Simple,
    Moderate,
    Complex,
    Integral,
}

impl ComplexityLevel {
    /// One level up, saturating at `Integral`
    pub fn raised(self) -> Self {
        match self {
            ComplexityLevel::Simple => ComplexityLevel::Moderate,
            ComplexityLevel::Moderate => ComplexityLevel::Complex,
            ComplexityLevel::Complex | ComplexityLevel::Integral => ComplexityLevel::Integral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityLevel::Simple => "simple",
            ComplexityLevel::Moderate => "moderate",
            ComplexityLevel::Complex => "complex",
            ComplexityLevel::Integral => "integral",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CollaborationMode {
    /// Everyone answers independently at the same time
    Parallel,
    /// Each agent builds on the answers before it
    Sequential,
    /// Independent drafts, then the lead integrates them
    Collaborative,
    /// The lead answers, the others review it
    Consultative,
}

impl CollaborationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollaborationMode::Parallel => "parallel",
            CollaborationMode::Sequential => "sequential",
            CollaborationMode::Collaborative => "collaborative",
            CollaborationMode::Consultative => "consultative",
        }
    }
}

/// Who participates in answering a query, and how
///
/// `participating_agent_ids` is never empty; the first entry leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CollaborationPlan {
    pub mode: CollaborationMode,
    pub participating_agent_ids: Vec<AgentId>,
}

impl CollaborationPlan {
    /// Plan for a single agent
    pub fn single(agent_id: AgentId) -> Self {
        Self {
            mode: CollaborationMode::Parallel,
            participating_agent_ids: vec![agent_id],
        }
    }

    pub fn lead(&self) -> AgentId {
        self.participating_agent_ids
            .first()
            .copied()
            .unwrap_or(AgentId::Nexus)
    }

    pub fn is_multi_agent(&self) -> bool {
        self.participating_agent_ids.len() > 1
    }
}
