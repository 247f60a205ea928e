//! # GENESIS - Agent-to-Agent Orchestration
//!
//! GENESIS routes natural-language requests across a team of eleven agents:
//! the NEXUS orchestrator plus ten domain specialists (training, nutrition,
//! recovery, motivation, progress analytics, biohacking, female health,
//! genetics, integrations and security). It works out what a user is asking
//! about, picks one or more agents, runs them in the right collaboration
//! mode and merges their answers into a single reply.
//!
//! ## Overview
//!
//! GENESIS can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `genesis` binary
//! 2. **As a library** - Embed the [`Orchestrator`] with your own [`agents::Agent`]s
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use genesis::agents::{AgentId, AgentRegistryBuilder};
//! use genesis::coordination::{AgentInvoker, ResponseSynthesizer};
//! use genesis::types::Query;
//! use genesis::{OrchestrationConfig, Orchestrator};
//! use std::sync::Arc;
//!
//! let registry = AgentRegistryBuilder::new()
//!     .with_agent(Arc::new(my_nexus))
//!     .with_agent(Arc::new(my_nutritionist))
//!     .build()?;
//!
//! let settings = OrchestrationConfig::default();
//! let invoker = Arc::new(AgentInvoker::new(Arc::new(registry), &settings));
//! let orchestrator = Orchestrator::new(invoker, ResponseSynthesizer::new(), settings);
//!
//! let reply = orchestrator
//!     .handle(Query::new("What should I eat before a run?", "user-1", "session-1"))
//!     .await;
//! println!("{}", reply.response);
//! ```
//!
//! ### Configuration-Driven Setup
//!
//! ```rust,ignore
//! use genesis::{AppState, GenesisConfigManager};
//! use std::sync::Arc;
//!
//! let config_manager = Arc::new(GenesisConfigManager::new("genesis.toml")?);
//! let state = AppState::from_config_manager(config_manager)?;
//! let app = genesis::api::routes::create_router(state);
//! ```
//!
//! ## Modules
//!
//! - [`agents`] - Agent trait, registry, intent analysis and the NEXUS orchestrator
//! - [`coordination`] - Plans, collaboration modes, guarded invocation, synthesis
//! - [`api`] - REST and WebSocket handlers and routes
//! - [`auth`] - API key guard and caller identity
//! - [`llm`] - Vertex AI and OpenAI-compatible model clients
//! - [`memory`] - Session history
//! - [`types`] - Common types and error handling
//! - [`utils`] - Configuration, retry and circuit breaker
//!
//! ## Architecture
//!
//! A request flows analyze → classify → plan → execute → synthesize. Every
//! agent call is bounded by a timeout, retried with backoff and guarded by a
//! per-agent circuit breaker. When no agent produces an answer, NEXUS answers
//! directly, and if NEXUS is down too a configured static message is returned.
//! Configuration (`genesis.toml`) is hot-reloaded.

/// Agents, routing inputs and the NEXUS orchestrator.
pub mod agents;
/// HTTP and WebSocket API handlers and routes.
pub mod api;
/// API key middleware and extractors.
pub mod auth;
/// Command-line interface definitions and output helpers.
pub mod cli;
/// Multi-agent planning, execution and synthesis.
pub mod coordination;
/// LLM provider clients and abstractions.
pub mod llm;
/// Conversation memory for agent context.
pub mod memory;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration, retry and circuit breaker utilities.
pub mod utils;

// Re-export commonly used types
pub use agents::{Agent, AgentId, AgentRegistry, AgentRegistryBuilder, Orchestrator, Topic};
pub use llm::{LLMClient, Provider, ProviderRegistry};
pub use types::{AppError, Result};
pub use utils::toml_config::{GenesisConfig, GenesisConfigManager, OrchestrationConfig};

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// TOML configuration with hot-reload support
    pub config_manager: Arc<GenesisConfigManager>,
    /// NEXUS orchestrator owning the agent team
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(config_manager: Arc<GenesisConfigManager>, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            config_manager,
            orchestrator,
        }
    }

    /// Build providers, agents and the orchestrator from the current configuration
    pub fn from_config_manager(config_manager: Arc<GenesisConfigManager>) -> Result<Self> {
        let config = config_manager.config();
        let providers = ProviderRegistry::from_config(&config);
        let orchestrator = Arc::new(Orchestrator::from_config(&config, &providers)?);
        Ok(Self::new(config_manager, orchestrator))
    }

    /// Push orchestration settings from every config reload into the orchestrator
    pub fn spawn_settings_listener(&self) -> tokio::task::JoinHandle<()> {
        let mut changes = self.config_manager.subscribe();
        let orchestrator = Arc::clone(&self.orchestrator);
        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let settings = changes.borrow_and_update().orchestration.clone();
                orchestrator.update_settings(settings);
            }
        })
    }
}
