use crate::{
    agents::{Agent, AgentId},
    llm::LLMClient,
    types::{AgentContext, MessageRole, Query, Result},
};
use async_trait::async_trait;

/// Model-backed agent; one instance per [`AgentId`]
pub struct SpecialistAgent {
    id: AgentId,
    llm: Box<dyn LLMClient>,
    system_prompt: String,
}

impl SpecialistAgent {
    /// Create an agent, using the built-in persona unless a prompt override is given
    pub fn new(id: AgentId, llm: Box<dyn LLMClient>, system_prompt: Option<String>) -> Self {
        Self {
            id,
            llm,
            system_prompt: system_prompt.unwrap_or_else(|| default_system_prompt(id)),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn build_messages(&self, query: &Query, context: &AgentContext) -> Vec<(String, String)> {
        let mut messages = vec![("system".to_string(), self.system_prompt.clone())];

        // Client-supplied context (goals, units, timezone, ...)
        if !query.context.is_empty() {
            let mut entries: Vec<String> = query
                .context
                .iter()
                .map(|(k, v)| match v {
                    serde_json::Value::String(s) => format!("{}: {}", k, s),
                    other => format!("{}: {}", k, other),
                })
                .collect();
            entries.sort();
            messages.push((
                "system".to_string(),
                format!("User context: {}", entries.join(", ")),
            ));
        }

        for msg in &context.conversation_history {
            messages.push((msg.role.as_str().to_string(), msg.content.clone()));
        }

        if !context.peer_notes.is_empty() {
            let notes = context
                .peer_notes
                .iter()
                .map(|note| format!("[{}]\n{}", note.agent_id.display_name(), note.content))
                .collect::<Vec<_>>()
                .join("\n\n");
            messages.push((
                MessageRole::System.as_str().to_string(),
                format!("Input from other GENESIS specialists:\n\n{}", notes),
            ));
        }

        let mut prompt = query.text.clone();
        if let Some(instruction) = &context.instruction {
            prompt = format!("{}\n\n{}", prompt, instruction);
        }
        messages.push(("user".to_string(), prompt));

        messages
    }
}

#[async_trait]
impl Agent for SpecialistAgent {
    async fn process(&self, query: &Query, context: &AgentContext) -> Result<String> {
        let messages = self.build_messages(query, context);
        self.llm.generate_with_history(&messages).await
    }

    fn id(&self) -> AgentId {
        self.id
    }
}

/// Built-in persona for each agent
pub fn default_system_prompt(id: AgentId) -> String {
    let focus = match id {
        AgentId::Nexus => {
            "You are NEXUS, the orchestrator of the GENESIS coaching team. Answer general \
             questions directly and, when given input from specialists, combine it into one \
             clear, consistent answer."
        }
        AgentId::Blaze => {
            "You are BLAZE, the GENESIS training specialist. You design strength, hypertrophy \
             and conditioning programs, explain periodization and adjust volume and intensity \
             to the user's level."
        }
        AgentId::Sage => {
            "You are SAGE, the GENESIS nutrition specialist. You build meal plans, set calorie \
             and macronutrient targets and give practical food guidance."
        }
        AgentId::Wave => {
            "You are WAVE, the GENESIS recovery specialist. You interpret sleep, HRV and \
             readiness data and recommend recovery strategies and deload timing."
        }
        AgentId::Spark => {
            "You are SPARK, the GENESIS motivation coach. You help users build habits, stay \
             consistent and work through setbacks."
        }
        AgentId::Stella => {
            "You are STELLA, the GENESIS progress analyst. You interpret measurements, trends \
             and goal progress and turn them into clear next steps."
        }
        AgentId::Nova => {
            "You are NOVA, the GENESIS biohacking specialist. You advise on supplementation, \
             longevity protocols and evidence quality, always noting safety considerations."
        }
        AgentId::Luna => {
            "You are LUNA, the GENESIS female health specialist. You adapt training, nutrition \
             and recovery to the menstrual cycle, pregnancy and menopause."
        }
        AgentId::Code => {
            "You are CODE, the GENESIS genetics specialist. You explain how genetic markers may \
             inform training and nutrition, without overstating what genetics can predict."
        }
        AgentId::Node => {
            "You are NODE, the GENESIS integrations specialist. You help users connect \
             wearables and apps and make sense of synced data."
        }
        AgentId::Guardian => {
            "You are GUARDIAN, the GENESIS security and privacy specialist. You explain how \
             user health data is handled, shared and protected."
        }
    };

    format!(
        "{}\n\nKeep answers specific and actionable. If a question is outside your area, say \
         so briefly and answer only the part you can.",
        focus
    )
}
