//! Agent Registry
//!
//! Holds the registered agent capabilities and the topic → capable-agent
//! mapping used for routing. The primary agent of a topic comes first in its
//! list; the rest are secondaries.
//!
//! ## Configuration
//!
//! `[topics.<name>] agents = [...]` in `genesis.toml` replaces the built-in
//! mapping for that topic. `[agents.<id>] enabled = false` keeps an agent
//! from being registered at all.

use crate::agents::specialist::SpecialistAgent;
use crate::agents::{Agent, AgentId, Topic};
use crate::llm::ProviderRegistry;
use crate::types::{AppError, Result};
use crate::utils::toml_config::GenesisConfig;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Built-in topic → agents mapping, primary first
pub fn default_topic_agents(topic: Topic) -> Vec<AgentId> {
    use AgentId::*;
    match topic {
        Topic::Training => vec![Blaze, Wave],
        Topic::Nutrition => vec![Sage, Nova],
        Topic::Recovery => vec![Wave, Blaze],
        Topic::Motivation => vec![Spark, Stella],
        Topic::Progress => vec![Stella, Spark],
        Topic::Biohacking => vec![Nova, Sage],
        Topic::FemaleHealth => vec![Luna, Sage],
        Topic::Genetics => vec![Code, Nova],
        Topic::Integrations => vec![Node, Stella],
        Topic::Security => vec![Guardian, Node],
    }
}

/// Registry of agent capabilities and topic routing
pub struct AgentRegistry {
    agents: HashMap<AgentId, Arc<dyn Agent>>,
    topic_agents: HashMap<Topic, Vec<AgentId>>,
}

impl AgentRegistry {
    /// Empty registry with the built-in topic mapping
    fn with_default_topics() -> Self {
        Self {
            agents: HashMap::new(),
            topic_agents: Topic::ALL
                .into_iter()
                .map(|t| (t, default_topic_agents(t)))
                .collect(),
        }
    }

    /// Create LLM-backed specialists for every enabled agent in the config
    pub fn from_config(config: &GenesisConfig, providers: &ProviderRegistry) -> Result<Self> {
        let mut builder = AgentRegistryBuilder::new().with_topic_overrides(config.topic_overrides());

        for id in AgentId::ALL {
            let agent_config = config.agent(id);
            if !agent_config.enabled {
                info!(agent = %id, "Agent disabled in configuration");
                continue;
            }

            let model_name = config.agent_model(id);
            let llm = providers.create_client_for_model(&model_name).map_err(|e| {
                AppError::Configuration(format!("Cannot create model for agent {}: {}", id, e))
            })?;
            debug!(agent = %id, model = %model_name, "Registering agent");

            let agent = SpecialistAgent::new(id, llm, agent_config.system_prompt);
            builder = builder.with_agent(Arc::new(agent));
        }

        builder.build()
    }

    /// Register (or replace) an agent
    pub fn register(&mut self, id: AgentId, agent: Arc<dyn Agent>) {
        self.agents.insert(id, agent);
    }

    pub fn get(&self, id: AgentId) -> Option<Arc<dyn Agent>> {
        self.agents.get(&id).cloned()
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.contains_key(&id)
    }

    /// Registered agent ids, in agent order
    pub fn agent_ids(&self) -> Vec<AgentId> {
        AgentId::ALL
            .into_iter()
            .filter(|id| self.contains(*id))
            .collect()
    }

    /// Capable agents for a topic, primary first
    pub fn agents_for_topic(&self, topic: Topic) -> &[AgentId] {
        self.topic_agents
            .get(&topic)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn primary_for_topic(&self, topic: Topic) -> Option<AgentId> {
        self.agents_for_topic(topic).first().copied()
    }

    /// Topics an agent is mapped to, in canonical topic order
    pub fn topics_for_agent(&self, id: AgentId) -> Vec<Topic> {
        Topic::ALL
            .into_iter()
            .filter(|t| self.agents_for_topic(*t).contains(&id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// Builder for [`AgentRegistry`]
pub struct AgentRegistryBuilder {
    registry: AgentRegistry,
}

impl Default for AgentRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentRegistryBuilder {
    pub fn new() -> Self {
        Self {
            registry: AgentRegistry::with_default_topics(),
        }
    }

    /// Register an agent under its own id
    pub fn with_agent(mut self, agent: Arc<dyn Agent>) -> Self {
        self.registry.register(agent.id(), agent);
        self
    }

    /// Replace the capable agents of one topic
    pub fn with_topic_agents(mut self, topic: Topic, agents: Vec<AgentId>) -> Self {
        if !agents.is_empty() {
            self.registry.topic_agents.insert(topic, agents);
        }
        self
    }

    pub fn with_topic_overrides(self, overrides: HashMap<Topic, Vec<AgentId>>) -> Self {
        overrides
            .into_iter()
            .fold(self, |builder, (topic, agents)| {
                builder.with_topic_agents(topic, agents)
            })
    }

    /// Finish the registry. NEXUS must be registered since every fallback ends there.
    pub fn build(self) -> Result<AgentRegistry> {
        if !self.registry.contains(AgentId::Nexus) {
            return Err(AppError::Configuration(
                "agent 'nexus' must be registered".to_string(),
            ));
        }
        Ok(self.registry)
    }
}
