use crate::{
    agents::{AgentId, AgentRegistry, ComplexityClassifier, IntentAnalyzer},
    coordination::{AgentInvoker, MultiAgentCoordinator, ResponseSynthesizer},
    llm::ProviderRegistry,
    memory::{SessionStore, build_context},
    types::{
        AgentContext, AgentPerspective, ChatResponse, Message, Query, ResponseMetadata, Result,
        RoutingPreview,
    },
    utils::toml_config::{GenesisConfig, OrchestrationConfig, SynthesisMode},
};
use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// NEXUS: the entry point for every user request.
///
/// Runs analyze → classify → plan → execute → synthesize, falls back to
/// NEXUS itself and finally to a static message, and keeps the session
/// history. Agent failures never surface as errors from [`Orchestrator::handle`].
pub struct Orchestrator {
    analyzer: IntentAnalyzer,
    classifier: ComplexityClassifier,
    coordinator: MultiAgentCoordinator,
    synthesizer: ResponseSynthesizer,
    sessions: SessionStore,
    settings: ArcSwap<OrchestrationConfig>,
}

impl Orchestrator {
    pub fn new(
        invoker: Arc<AgentInvoker>,
        synthesizer: ResponseSynthesizer,
        settings: OrchestrationConfig,
    ) -> Self {
        Self {
            analyzer: IntentAnalyzer::new(),
            classifier: ComplexityClassifier::default(),
            coordinator: MultiAgentCoordinator::new(invoker),
            synthesizer,
            sessions: SessionStore::new(settings.session_capacity),
            settings: ArcSwap::from_pointee(settings),
        }
    }

    /// Build the full agent team from configuration
    pub fn from_config(config: &GenesisConfig, providers: &ProviderRegistry) -> Result<Self> {
        let registry = Arc::new(AgentRegistry::from_config(config, providers)?);
        let invoker = Arc::new(AgentInvoker::new(registry, &config.orchestration));

        let synthesis_model = match (&config.orchestration.synthesis_model, config.orchestration.synthesis) {
            (Some(model), _) => Some(model.clone()),
            (None, SynthesisMode::Model) => Some(config.agent_model(AgentId::Nexus)),
            (None, SynthesisMode::Concatenate) => None,
        };
        let synthesizer = match synthesis_model {
            Some(model) => ResponseSynthesizer::with_llm(providers.create_client_for_model(&model)?),
            None => ResponseSynthesizer::new(),
        };

        let analyzer = IntentAnalyzer::with_extra_keywords(&config.topic_keywords());
        Ok(Self::new(invoker, synthesizer, config.orchestration.clone()).with_analyzer(analyzer))
    }

    /// Replace the intent vocabulary (and the classifier built on it)
    pub fn with_analyzer(mut self, analyzer: IntentAnalyzer) -> Self {
        self.classifier = ComplexityClassifier::new(analyzer.clone());
        self.analyzer = analyzer;
        self
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        self.coordinator.invoker().registry()
    }

    pub fn invoker(&self) -> &Arc<AgentInvoker> {
        self.coordinator.invoker()
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Current orchestration settings snapshot
    pub fn settings(&self) -> Arc<OrchestrationConfig> {
        self.settings.load_full()
    }

    /// Swap in reloaded settings; applies from the next request on
    pub fn update_settings(&self, settings: OrchestrationConfig) {
        info!(
            confidence_threshold = settings.confidence_threshold,
            max_agents = settings.max_agents,
            "Orchestration settings updated"
        );
        self.settings.store(Arc::new(settings));
    }

    /// Routing decision for a query without invoking any agent
    pub fn preview(&self, query: &Query) -> RoutingPreview {
        self.preview_with(query, &self.settings())
    }

    fn preview_with(&self, query: &Query, settings: &OrchestrationConfig) -> RoutingPreview {
        let intent = self.analyzer.analyze(query);
        let complexity = self.classifier.classify(query);
        let plan = self.coordinator.plan(&intent, &complexity, settings);
        RoutingPreview {
            intent,
            complexity,
            plan,
        }
    }

    /// Answer a query. Always produces a response.
    pub async fn handle(&self, query: Query) -> ChatResponse {
        let started = Instant::now();
        let settings = self.settings();

        let RoutingPreview {
            intent,
            complexity,
            plan,
        } = self.preview_with(&query, &settings);
        info!(
            session_id = %query.session_id,
            intent = %intent.intent_label,
            confidence = intent.confidence,
            complexity = complexity.level.as_str(),
            participants = ?plan.participating_agent_ids,
            "Routing query"
        );

        let history = self
            .sessions
            .history(&query.session_id, settings.history_limit);
        let context = build_context(history, Some(settings.history_limit));

        let perspectives = self.coordinator.execute(&plan, &query, &context).await;
        let result = self
            .synthesizer
            .synthesize(&query, perspectives, settings.synthesis)
            .await;

        let mut perspectives = result.perspectives;
        let (response, agents_used, fallback) = if result.synthesized_text.trim().is_empty() {
            // Nothing succeeded, so a NEXUS perspective here is a NEXUS failure
            let nexus_failed = perspectives.iter().any(|p| p.agent_id == AgentId::Nexus);
            let (text, used, nexus) = self
                .fallback(&query, &context, &settings, nexus_failed)
                .await;
            perspectives.extend(nexus);
            (text, used, true)
        } else {
            let used = perspectives
                .iter()
                .filter(|p| p.is_usable())
                .map(|p| p.agent_id)
                .collect();
            (result.synthesized_text, used, false)
        };

        self.sessions.append(
            &query.session_id,
            [Message::user(query.text.clone()), Message::assistant(response.clone())],
        );

        let latency_ms = started.elapsed().as_millis() as u64;
        info!(
            session_id = %query.session_id,
            agents_used = ?agents_used,
            fallback,
            latency_ms,
            "Query handled"
        );

        ChatResponse {
            response,
            agents_used,
            session_id: query.session_id,
            metadata: ResponseMetadata {
                intent: intent.intent_label,
                confidence: intent.confidence,
                complexity: complexity.level,
                mode: plan.is_multi_agent().then_some(plan.mode),
                consensus_score: if fallback { 0.0 } else { result.consensus_score },
                fallback,
                latency_ms,
                perspectives: perspectives.iter().map(AgentPerspective::summary).collect(),
            },
        }
    }

    /// NEXUS directly, then the static message
    async fn fallback(
        &self,
        query: &Query,
        context: &AgentContext,
        settings: &OrchestrationConfig,
        nexus_already_failed: bool,
    ) -> (String, Vec<AgentId>, Option<AgentPerspective>) {
        if !nexus_already_failed {
            warn!(session_id = %query.session_id, "No usable agent response, falling back to NEXUS");
            let nexus = self
                .coordinator
                .invoker()
                .invoke(AgentId::Nexus, query, context)
                .await;
            if nexus.is_usable() {
                let text = nexus.response_text.trim().to_string();
                return (text, vec![AgentId::Nexus], Some(nexus));
            }
            warn!(session_id = %query.session_id, "NEXUS fallback failed, using static reply");
            return (settings.fallback_message.clone(), Vec::new(), Some(nexus));
        }

        warn!(session_id = %query.session_id, "NEXUS failed, using static reply");
        (settings.fallback_message.clone(), Vec::new(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{Agent, AgentRegistryBuilder, MockAgent};
    use crate::coordination::ComplexityLevel;
    use crate::types::{AppError, PerspectiveStatus};
    use crate::utils::toml_config::RetryConfig;

    fn settings() -> OrchestrationConfig {
        OrchestrationConfig {
            retry: RetryConfig {
                max_attempts: 1,
                ..Default::default()
            },
            fallback_message: "Please try again later.".to_string(),
            ..Default::default()
        }
    }

    fn answering(id: AgentId) -> Arc<dyn Agent> {
        let mut agent = MockAgent::new();
        agent.expect_id().return_const(id);
        agent
            .expect_process()
            .returning(move |_, _| Ok(format!("{} says hi", id.display_name())));
        Arc::new(agent)
    }

    fn failing(id: AgentId) -> Arc<dyn Agent> {
        let mut agent = MockAgent::new();
        agent.expect_id().return_const(id);
        agent
            .expect_process()
            .returning(|_, _| Err(AppError::InvalidInput("rejected".to_string())));
        Arc::new(agent)
    }

    fn orchestrator(agents: Vec<Arc<dyn Agent>>) -> Orchestrator {
        let registry = agents
            .into_iter()
            .fold(AgentRegistryBuilder::new(), |b, a| b.with_agent(a))
            .build()
            .unwrap();
        let invoker = Arc::new(AgentInvoker::new(Arc::new(registry), &settings()));
        Orchestrator::new(invoker, ResponseSynthesizer::new(), settings())
    }

    #[tokio::test]
    async fn test_general_query_goes_to_nexus() {
        let orch = orchestrator(vec![answering(AgentId::Nexus)]);
        let response = orch.handle(Query::new("hello there", "u", "s1")).await;

        assert_eq!(response.response, "NEXUS says hi");
        assert_eq!(response.agents_used, vec![AgentId::Nexus]);
        assert_eq!(response.metadata.intent, "general");
        assert_eq!(response.metadata.complexity, ComplexityLevel::Simple);
        assert!(response.metadata.mode.is_none());
        assert!(!response.metadata.fallback);
    }

    #[tokio::test]
    async fn test_single_agent_failure_falls_back_to_nexus() {
        let orch = orchestrator(vec![answering(AgentId::Nexus), failing(AgentId::Sage)]);
        let response = orch
            .handle(Query::new("What should I eat for breakfast?", "u", "s1"))
            .await;

        assert!(response.metadata.fallback);
        assert_eq!(response.response, "NEXUS says hi");
        assert_eq!(response.agents_used, vec![AgentId::Nexus]);
        assert_eq!(response.metadata.perspectives.len(), 2);
        assert_eq!(response.metadata.perspectives[0].status, PerspectiveStatus::Failed);
    }

    #[tokio::test]
    async fn test_static_message_when_everyone_fails() {
        let orch = orchestrator(vec![failing(AgentId::Nexus), failing(AgentId::Sage)]);
        let response = orch
            .handle(Query::new("What should I eat for breakfast?", "u", "s1"))
            .await;

        assert!(response.metadata.fallback);
        assert_eq!(response.response, "Please try again later.");
        assert!(response.agents_used.is_empty());
    }

    #[tokio::test]
    async fn test_nexus_is_not_retried_when_it_led() {
        let orch = orchestrator(vec![failing(AgentId::Nexus)]);
        let response = orch.handle(Query::new("hello there", "u", "s1")).await;
        assert_eq!(response.response, "Please try again later.");
        assert_eq!(response.metadata.perspectives.len(), 1);
    }

    #[tokio::test]
    async fn test_session_history_is_recorded() {
        let orch = orchestrator(vec![answering(AgentId::Nexus)]);
        orch.handle(Query::new("hello there", "u", "s1")).await;
        orch.handle(Query::new("hello again", "u", "s1")).await;

        let history = orch.sessions().history("s1", 10);
        assert_eq!(history.len(), 4);
        assert_eq!(history[2].content, "hello again");
    }

    #[test]
    fn test_preview_and_settings_swap() {
        let orch = orchestrator(AgentId::ALL.into_iter().map(answering).collect());
        let query = Query::new("I need a workout program and a meal plan", "u", "s");

        let preview = orch.preview(&query);
        assert!(preview.plan.participating_agent_ids.len() >= 2);

        orch.update_settings(OrchestrationConfig {
            max_agents: 2,
            ..settings()
        });
        assert_eq!(orch.settings().max_agents, 2);
        assert!(orch.preview(&query).plan.participating_agent_ids.len() <= 2);
    }
}
