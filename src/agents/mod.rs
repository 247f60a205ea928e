//! Agents and routing inputs
//!
//! GENESIS ships eleven agents: the NEXUS orchestrator plus ten domain
//! specialists. Every agent is an opaque async capability behind the
//! [`Agent`] trait; the stock implementation ([`SpecialistAgent`]) is backed
//! by a hosted model, but tests and embedders can register anything.

pub mod complexity;
pub mod intent;
pub mod orchestrator;
pub mod registry;
pub mod specialist;

use crate::types::{AgentContext, Query, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

// Re-export commonly used types
pub use complexity::ComplexityClassifier;
pub use intent::IntentAnalyzer;
pub use orchestrator::Orchestrator;
pub use registry::{AgentRegistry, AgentRegistryBuilder};
pub use specialist::SpecialistAgent;

/// Base trait for all agents
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Agent: Send + Sync {
    /// Answer the query, taking the per-call context into account
    async fn process(&self, query: &Query, context: &AgentContext) -> Result<String>;

    /// Identity of this agent
    fn id(&self) -> AgentId;
}

/// Identifiers of the agents GENESIS can route to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AgentId {
    /// Orchestrator and general fallback
    Nexus,
    /// Training and programming
    Blaze,
    /// Nutrition
    Sage,
    /// Recovery, sleep and biometrics
    Wave,
    /// Motivation and behavior change
    Spark,
    /// Progress analytics
    Stella,
    /// Biohacking and supplementation
    Nova,
    /// Female health
    Luna,
    /// Genetics
    Code,
    /// Device and app integrations
    Node,
    /// Security, privacy and compliance
    Guardian,
}

impl AgentId {
    pub const ALL: [AgentId; 11] = [
        AgentId::Nexus,
        AgentId::Blaze,
        AgentId::Sage,
        AgentId::Wave,
        AgentId::Spark,
        AgentId::Stella,
        AgentId::Nova,
        AgentId::Luna,
        AgentId::Code,
        AgentId::Node,
        AgentId::Guardian,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentId::Nexus => "nexus",
            AgentId::Blaze => "blaze",
            AgentId::Sage => "sage",
            AgentId::Wave => "wave",
            AgentId::Spark => "spark",
            AgentId::Stella => "stella",
            AgentId::Nova => "nova",
            AgentId::Luna => "luna",
            AgentId::Code => "code",
            AgentId::Node => "node",
            AgentId::Guardian => "guardian",
        }
    }

    /// Upper-case display name used in synthesized replies
    pub fn display_name(&self) -> String {
        self.as_str().to_uppercase()
    }

    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        Self::ALL.into_iter().find(|id| id.as_str() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            AgentId::Nexus => "Orchestrator; answers general questions and coordinates specialists",
            AgentId::Blaze => "Training programming, strength, conditioning and performance",
            AgentId::Sage => "Nutrition, meal planning and macronutrients",
            AgentId::Wave => "Recovery, sleep, HRV and biometric readiness",
            AgentId::Spark => "Motivation, habits and behavior change",
            AgentId::Stella => "Progress tracking, metrics and goal analytics",
            AgentId::Nova => "Biohacking, supplementation and longevity protocols",
            AgentId::Luna => "Female health, menstrual cycle and hormonal phases",
            AgentId::Code => "Genetics and genomic-informed recommendations",
            AgentId::Node => "Wearables, device sync and app integrations",
            AgentId::Guardian => "Security, privacy and data compliance",
        }
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Topics the intent analyzer can recognize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Training,
    Nutrition,
    Recovery,
    Motivation,
    Progress,
    Biohacking,
    FemaleHealth,
    Genetics,
    Integrations,
    Security,
}

impl Topic {
    /// Canonical order; used to break ties between equally matched topics
    pub const ALL: [Topic; 10] = [
        Topic::Training,
        Topic::Nutrition,
        Topic::Recovery,
        Topic::Motivation,
        Topic::Progress,
        Topic::Biohacking,
        Topic::FemaleHealth,
        Topic::Genetics,
        Topic::Integrations,
        Topic::Security,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Training => "training",
            Topic::Nutrition => "nutrition",
            Topic::Recovery => "recovery",
            Topic::Motivation => "motivation",
            Topic::Progress => "progress",
            Topic::Biohacking => "biohacking",
            Topic::FemaleHealth => "female_health",
            Topic::Genetics => "genetics",
            Topic::Integrations => "integrations",
            Topic::Security => "security",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_round_trips_through_name() {
        for id in AgentId::ALL {
            assert_eq!(AgentId::parse(id.as_str()), Some(id));
        }
        assert_eq!(AgentId::parse("  SAGE "), Some(AgentId::Sage));
        assert_eq!(AgentId::parse("unknown"), None);
    }

    #[test]
    fn test_agent_count() {
        assert_eq!(AgentId::ALL.len(), 11);
    }

    #[test]
    fn test_topic_parse_accepts_dashes() {
        assert_eq!(Topic::parse("female-health"), Some(Topic::FemaleHealth));
        assert_eq!(Topic::parse("Nutrition"), Some(Topic::Nutrition));
        assert_eq!(Topic::parse("astrology"), None);
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(serde_json::to_string(&AgentId::Guardian).unwrap(), "\"guardian\"");
        assert_eq!(
            serde_json::to_string(&Topic::FemaleHealth).unwrap(),
            "\"female_health\""
        );
    }
}
