//! Merging agent perspectives into one reply
//!
//! Consensus is the mean pairwise Jaccard similarity of the content words in
//! each successful answer. Text is either a labelled concatenation of the
//! answers in plan order, or a model-written merge that falls back to the
//! concatenation when the model errors or returns nothing.

use crate::agents::intent::normalize;
use crate::llm::LLMClient;
use crate::types::{AgentPerspective, CollaborationResult, Query};
use crate::utils::toml_config::SynthesisMode;
use std::collections::HashSet;
use tracing::{debug, warn};

const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "before", "but", "by", "can", "could", "do", "does", "for", "from", "get", "has", "have",
    "how", "i", "if", "in", "into", "is", "it", "its", "just", "may", "me", "more", "most",
    "my", "no", "not", "of", "on", "or", "other", "our", "out", "should", "so", "some", "such",
    "than", "that", "the", "their", "them", "then", "there", "these", "they", "this", "those",
    "to", "up", "very", "was", "we", "what", "when", "which", "while", "who", "will", "with",
    "would", "you", "your",
];

const MERGE_SYSTEM_PROMPT: &str = "You are NEXUS, the orchestrator of the GENESIS coaching team. \
Several specialists answered the same question. Merge their answers into one coherent reply for \
the user. Keep every concrete recommendation, resolve contradictions explicitly and do not \
mention that multiple specialists were involved unless it helps the user.";

pub struct ResponseSynthesizer {
    llm: Option<Box<dyn LLMClient>>,
}

impl Default for ResponseSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSynthesizer {
    /// Concatenation-only synthesizer
    pub fn new() -> Self {
        Self { llm: None }
    }

    /// Synthesizer able to merge with a model
    pub fn with_llm(llm: Box<dyn LLMClient>) -> Self {
        Self { llm: Some(llm) }
    }

    pub fn has_model(&self) -> bool {
        self.llm.is_some()
    }

    pub async fn synthesize(
        &self,
        query: &Query,
        perspectives: Vec<AgentPerspective>,
        mode: SynthesisMode,
    ) -> CollaborationResult {
        let usable: Vec<&AgentPerspective> =
            perspectives.iter().filter(|p| p.is_usable()).collect();

        let (consensus_score, synthesized_text) = match usable.as_slice() {
            [] => (0.0, String::new()),
            [only] => (1.0, only.response_text.trim().to_string()),
            many => {
                let consensus = consensus_score(many);
                let text = match (mode, &self.llm) {
                    (SynthesisMode::Model, Some(llm)) => self.merge(llm.as_ref(), query, many).await,
                    (SynthesisMode::Model, None) => {
                        debug!("No synthesis model configured, concatenating");
                        concatenate(many)
                    }
                    (SynthesisMode::Concatenate, _) => concatenate(many),
                };
                (consensus, text)
            }
        };

        CollaborationResult {
            perspectives,
            consensus_score,
            synthesized_text,
        }
    }

    async fn merge(&self, llm: &dyn LLMClient, query: &Query, usable: &[&AgentPerspective]) -> String {
        let sections = concatenate(usable);
        let prompt = format!(
            "User question:\n{}\n\nSpecialist answers:\n\n{}",
            query.text, sections
        );

        match llm.generate_with_system(MERGE_SYSTEM_PROMPT, &prompt).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                warn!("Synthesis model returned no text, concatenating");
                sections
            }
            Err(e) => {
                warn!(error = %e, "Synthesis model failed, concatenating");
                sections
            }
        }
    }
}

/// One labelled section per agent, in the order given
fn concatenate(perspectives: &[&AgentPerspective]) -> String {
    perspectives
        .iter()
        .map(|p| format!("**{}**\n{}", p.agent_id.display_name(), p.response_text.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn content_words(text: &str) -> HashSet<String> {
    normalize(text)
        .split_whitespace()
        .filter(|w| w.len() > 1 && !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    let union = a.union(b).count();
    if union == 0 {
        return 1.0;
    }
    a.intersection(b).count() as f32 / union as f32
}

/// Mean pairwise Jaccard similarity, in [0, 1]
fn consensus_score(perspectives: &[&AgentPerspective]) -> f32 {
    let sets: Vec<_> = perspectives
        .iter()
        .map(|p| content_words(&p.response_text))
        .collect();

    let mut total = 0.0;
    let mut pairs = 0;
    for i in 0..sets.len() {
        for j in (i + 1)..sets.len() {
            total += jaccard(&sets[i], &sets[j]);
            pairs += 1;
        }
    }

    if pairs == 0 {
        return 1.0;
    }
    (total / pairs as f32).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::AgentId;
    use crate::types::{AppError, PerspectiveStatus, Result};
    use async_trait::async_trait;

    struct FixedClient(std::result::Result<&'static str, &'static str>);

    #[async_trait]
    impl LLMClient for FixedClient {
        async fn generate_with_history(&self, _messages: &[(String, String)]) -> Result<String> {
            self.0
                .map(str::to_string)
                .map_err(|e| AppError::LLM(e.to_string()))
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    fn ok(id: AgentId, text: &str) -> AgentPerspective {
        AgentPerspective::success(id, text.to_string(), 5)
    }

    fn failed(id: AgentId) -> AgentPerspective {
        AgentPerspective::failure(id, PerspectiveStatus::Failed, "boom", 5)
    }

    fn query() -> Query {
        Query::new("Plan my week", "u", "s")
    }

    #[tokio::test]
    async fn test_no_usable_perspectives() {
        let result = ResponseSynthesizer::new()
            .synthesize(&query(), vec![failed(AgentId::Sage)], SynthesisMode::Concatenate)
            .await;
        assert!(result.synthesized_text.is_empty());
        assert_eq!(result.consensus_score, 0.0);
        assert_eq!(result.perspectives.len(), 1);
    }

    #[tokio::test]
    async fn test_single_perspective_is_passed_through() {
        let result = ResponseSynthesizer::new()
            .synthesize(
                &query(),
                vec![ok(AgentId::Sage, " Eat more protein. "), failed(AgentId::Nova)],
                SynthesisMode::Concatenate,
            )
            .await;
        assert_eq!(result.synthesized_text, "Eat more protein.");
        assert_eq!(result.consensus_score, 1.0);
    }

    #[tokio::test]
    async fn test_concatenation_is_labelled_in_order() {
        let result = ResponseSynthesizer::new()
            .synthesize(
                &query(),
                vec![
                    ok(AgentId::Blaze, "Squat twice a week."),
                    ok(AgentId::Sage, "Eat more protein."),
                ],
                SynthesisMode::Concatenate,
            )
            .await;
        assert_eq!(
            result.synthesized_text,
            "**BLAZE**\nSquat twice a week.\n\n**SAGE**\nEat more protein."
        );
        assert!((0.0..=1.0).contains(&result.consensus_score));
    }

    #[test]
    fn test_consensus_bounds() {
        let same = [ok(AgentId::Blaze, "sleep eight hours"), ok(AgentId::Wave, "Sleep eight hours!")];
        let refs: Vec<_> = same.iter().collect();
        assert_eq!(consensus_score(&refs), 1.0);

        let disjoint = [ok(AgentId::Blaze, "squat heavy"), ok(AgentId::Sage, "eat oats")];
        let refs: Vec<_> = disjoint.iter().collect();
        assert_eq!(consensus_score(&refs), 0.0);

        let partial = [
            ok(AgentId::Blaze, "protein helps recovery"),
            ok(AgentId::Sage, "protein helps muscle"),
        ];
        let refs: Vec<_> = partial.iter().collect();
        assert_eq!(consensus_score(&refs), 0.5);
    }

    #[test]
    fn test_stop_words_are_ignored() {
        let words = content_words("The protein and the oats");
        assert_eq!(words.len(), 2);
        assert!(words.contains("protein"));
    }

    #[tokio::test]
    async fn test_model_merge() {
        let synthesizer = ResponseSynthesizer::with_llm(Box::new(FixedClient(Ok("Merged plan."))));
        let result = synthesizer
            .synthesize(
                &query(),
                vec![ok(AgentId::Blaze, "a"), ok(AgentId::Sage, "b")],
                SynthesisMode::Model,
            )
            .await;
        assert_eq!(result.synthesized_text, "Merged plan.");
    }

    #[tokio::test]
    async fn test_model_failure_falls_back_to_concatenation() {
        for client in [FixedClient(Err("down")), FixedClient(Ok("   "))] {
            let synthesizer = ResponseSynthesizer::with_llm(Box::new(client));
            let result = synthesizer
                .synthesize(
                    &query(),
                    vec![ok(AgentId::Blaze, "Squat."), ok(AgentId::Sage, "Eat.")],
                    SynthesisMode::Model,
                )
                .await;
            assert_eq!(result.synthesized_text, "**BLAZE**\nSquat.\n\n**SAGE**\nEat.");
        }
    }
}
