//! Participant selection and collaboration modes

use crate::agents::AgentId;
use crate::coordination::invoker::AgentInvoker;
use crate::coordination::{CollaborationMode, CollaborationPlan, ComplexityLevel};
use crate::types::{AgentContext, AgentPerspective, ComplexityAssessment, IntentResult, PeerNote, Query};
use crate::utils::toml_config::OrchestrationConfig;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info};

const SEQUENTIAL_INSTRUCTION: &str = "Other specialists have already answered above. Build on \
their input from your own area of expertise instead of repeating it.";

const INTEGRATION_INSTRUCTION: &str = "Drafts from the specialists are above. Integrate them \
into a single coherent answer, resolving any conflicts between them.";

/// Decides who answers a query and runs the chosen collaboration mode
pub struct MultiAgentCoordinator {
    invoker: Arc<AgentInvoker>,
}

impl MultiAgentCoordinator {
    pub fn new(invoker: Arc<AgentInvoker>) -> Self {
        Self { invoker }
    }

    pub fn invoker(&self) -> &Arc<AgentInvoker> {
        &self.invoker
    }

    /// Choose participants and a mode. Pure; nothing is invoked.
    pub fn plan(
        &self,
        intent: &IntentResult,
        assessment: &ComplexityAssessment,
        settings: &OrchestrationConfig,
    ) -> CollaborationPlan {
        let registry = self.invoker.registry();
        let topics = &intent.matched_topics;

        let Some(&top_topic) = topics.first() else {
            return CollaborationPlan::single(AgentId::Nexus);
        };

        let multi_agent = topics.len() >= 2
            || !assessment.indicators.is_empty()
            || intent.confidence < settings.confidence_threshold;

        if !multi_agent {
            let agent = registry
                .primary_for_topic(top_topic)
                .filter(|id| registry.contains(*id))
                .unwrap_or(AgentId::Nexus);
            return CollaborationPlan::single(agent);
        }

        let mut participants: Vec<AgentId> = Vec::new();
        let add = |id: AgentId, participants: &mut Vec<AgentId>| {
            if registry.contains(id) && !participants.contains(&id) {
                participants.push(id);
            }
        };

        for topic in topics {
            if let Some(primary) = registry.primary_for_topic(*topic) {
                add(primary, &mut participants);
            }
        }
        if participants.len() < 2 {
            for secondary in registry.agents_for_topic(top_topic).iter().skip(1) {
                add(*secondary, &mut participants);
            }
        }
        if participants.len() < 2 {
            add(AgentId::Nexus, &mut participants);
        }
        participants.truncate(settings.max_agents.max(2));

        if participants.len() <= 1 {
            let agent = participants.first().copied().unwrap_or(AgentId::Nexus);
            return CollaborationPlan::single(agent);
        }

        let mode = if topics.len() >= 2 {
            match assessment.level {
                ComplexityLevel::Integral => CollaborationMode::Collaborative,
                ComplexityLevel::Complex => CollaborationMode::Sequential,
                _ => CollaborationMode::Parallel,
            }
        } else {
            CollaborationMode::Consultative
        };

        CollaborationPlan {
            mode,
            participating_agent_ids: participants,
        }
    }

    /// Run a plan. Individual failures come back as non-success perspectives.
    pub async fn execute(
        &self,
        plan: &CollaborationPlan,
        query: &Query,
        context: &AgentContext,
    ) -> Vec<AgentPerspective> {
        let ids = &plan.participating_agent_ids;
        info!(
            mode = plan.mode.as_str(),
            participants = ?ids,
            "Executing collaboration plan"
        );

        if !plan.is_multi_agent() {
            return vec![self.invoker.invoke(plan.lead(), query, context).await];
        }

        match plan.mode {
            CollaborationMode::Parallel => self.run_parallel(ids, query, context).await,
            CollaborationMode::Sequential => self.run_sequential(ids, query, context).await,
            CollaborationMode::Collaborative => {
                self.run_collaborative(ids, query, context).await
            }
            CollaborationMode::Consultative => {
                self.run_consultative(ids, query, context).await
            }
        }
    }

    async fn run_parallel(
        &self,
        ids: &[AgentId],
        query: &Query,
        context: &AgentContext,
    ) -> Vec<AgentPerspective> {
        join_all(ids.iter().map(|id| self.invoker.invoke(*id, query, context))).await
    }

    async fn run_sequential(
        &self,
        ids: &[AgentId],
        query: &Query,
        context: &AgentContext,
    ) -> Vec<AgentPerspective> {
        let mut chained = context.clone();
        let mut perspectives = Vec::with_capacity(ids.len());

        for id in ids {
            let perspective = self.invoker.invoke(*id, query, &chained).await;
            if perspective.is_usable() {
                chained.peer_notes.push(note(&perspective));
                chained.instruction = Some(SEQUENTIAL_INSTRUCTION.to_string());
            }
            perspectives.push(perspective);
        }

        perspectives
    }

    async fn run_collaborative(
        &self,
        ids: &[AgentId],
        query: &Query,
        context: &AgentContext,
    ) -> Vec<AgentPerspective> {
        let mut perspectives = self.run_parallel(ids, query, context).await;

        let drafts: Vec<PeerNote> = perspectives.iter().filter(|p| p.is_usable()).map(note).collect();
        let lead = ids[0];
        if !drafts.iter().any(|d| d.agent_id != lead) {
            debug!(agent = %lead, "No peer drafts to integrate");
            return perspectives;
        }

        let integration_context = AgentContext {
            conversation_history: context.conversation_history.clone(),
            peer_notes: drafts,
            instruction: Some(INTEGRATION_INSTRUCTION.to_string()),
        };
        let integrated = self.invoker.invoke(lead, query, &integration_context).await;

        if integrated.is_usable() {
            let first_round_ms = perspectives[0].latency_ms;
            perspectives[0] = AgentPerspective {
                latency_ms: first_round_ms + integrated.latency_ms,
                ..integrated
            };
        } else {
            debug!(agent = %lead, "Integration pass failed, keeping first-round draft");
        }

        perspectives
    }

    async fn run_consultative(
        &self,
        ids: &[AgentId],
        query: &Query,
        context: &AgentContext,
    ) -> Vec<AgentPerspective> {
        let lead = self.invoker.invoke(ids[0], query, context).await;

        let mut consult_context = context.clone();
        if lead.is_usable() {
            consult_context.peer_notes.push(note(&lead));
            consult_context.instruction = Some(format!(
                "{} has answered above. Review that answer from your area of expertise: add \
                 what is missing or correct what is wrong, without repeating it.",
                lead.agent_id.display_name()
            ));
        }

        let consultants = join_all(
            ids[1..]
                .iter()
                .map(|id| self.invoker.invoke(*id, query, &consult_context)),
        )
        .await;

        std::iter::once(lead).chain(consultants).collect()
    }
}

fn note(perspective: &AgentPerspective) -> PeerNote {
    PeerNote {
        agent_id: perspective.agent_id,
        content: perspective.response_text.clone(),
    }
}
