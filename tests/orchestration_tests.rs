//! End-to-end orchestration tests over scripted agents
//!
//! Covers routing, the four collaboration modes, graceful degradation,
//! retries, timeouts, circuit breaking, session history and settings reload.

mod common;

use common::mocks::{
    ScriptedAgent, fast_settings, full_team, orchestrator_with, orchestrator_with_settings,
};
use genesis::agents::AgentId;
use genesis::coordination::{CollaborationMode, ComplexityLevel};
use genesis::types::{PerspectiveStatus, Query};
use genesis::utils::circuit_breaker::CircuitState;
use genesis::utils::toml_config::{OrchestrationConfig, RetryConfig};
use genesis::{AppState, GenesisConfigManager};
use rstest::rstest;
use std::sync::Arc;
use std::time::Duration;

fn query(text: &str) -> Query {
    Query::new(text, "user-1", "session-1")
}

fn agent(team: &[Arc<ScriptedAgent>], id: AgentId) -> Arc<ScriptedAgent> {
    team.iter()
        .find(|a| genesis::Agent::id(a.as_ref()) == id)
        .cloned()
        .expect("agent in team")
}

fn single_attempt() -> OrchestrationConfig {
    OrchestrationConfig {
        retry: RetryConfig {
            max_attempts: 1,
            ..fast_settings().retry
        },
        ..fast_settings()
    }
}

// ============= Routing =============

#[rstest]
#[case("hello there")]
#[case("tell me a joke")]
#[case("what is the capital of France?")]
fn test_no_topics_means_simple_single_participant(#[case] text: &str) {
    let orch = orchestrator_with(&full_team());
    let preview = orch.preview(&query(text));

    assert!(preview.intent.matched_topics.is_empty());
    assert_eq!(preview.complexity.level, ComplexityLevel::Simple);
    assert_eq!(preview.plan.participating_agent_ids, vec![AgentId::Nexus]);
}

#[rstest]
#[case("I need a workout program and a meal plan")]
#[case("Does creatine affect my sleep?")]
#[case("track my period and my workouts")]
#[case("gdpr rules for my dna results")]
fn test_two_or_more_topics_means_two_or_more_participants(#[case] text: &str) {
    let orch = orchestrator_with(&full_team());
    let preview = orch.preview(&query(text));

    assert!(preview.intent.matched_topics.len() >= 2, "text: {}", text);
    assert!(preview.plan.participating_agent_ids.len() >= 2, "text: {}", text);
}

#[test]
fn test_plan_only_uses_registered_agents() {
    let team = vec![
        ScriptedAgent::answering(AgentId::Nexus),
        ScriptedAgent::answering(AgentId::Blaze),
    ];
    let orch = orchestrator_with(&team);

    for text in [
        "I need a workout program and a meal plan",
        "Does creatine affect my sleep?",
        "my squat has hit a plateau",
        "hello there",
    ] {
        let plan = orch.preview(&query(text)).plan;
        assert!(!plan.participating_agent_ids.is_empty());
        for id in &plan.participating_agent_ids {
            assert!(orch.registry().contains(*id), "{} not registered", id);
        }
    }

    // WAVE and NOVA are missing: BLAZE covers recovery as a secondary, NEXUS fills in
    let plan = orch.preview(&query("Does creatine affect my sleep?")).plan;
    assert_eq!(plan.participating_agent_ids, vec![AgentId::Blaze, AgentId::Nexus]);

    let team = vec![ScriptedAgent::answering(AgentId::Nexus)];
    let orch = orchestrator_with(&team);
    let plan = orch.preview(&query("Does creatine affect my sleep?")).plan;
    assert_eq!(plan.participating_agent_ids, vec![AgentId::Nexus]);
}

#[test]
fn test_max_agents_caps_participants() {
    let settings = OrchestrationConfig {
        max_agents: 2,
        ..fast_settings()
    };
    let orch = orchestrator_with_settings(&full_team(), settings);
    let plan = orch
        .preview(&query("workout, meal plan, sleep, creatine and my dna"))
        .plan;
    assert_eq!(plan.participating_agent_ids.len(), 2);
}

#[test]
fn test_confidence_threshold_controls_fan_out() {
    let orch = orchestrator_with(&full_team());
    let text = "how do I squat";
    assert!(!orch.preview(&query(text)).plan.is_multi_agent());

    orch.update_settings(OrchestrationConfig {
        confidence_threshold: 0.8,
        ..fast_settings()
    });
    let plan = orch.preview(&query(text)).plan;
    assert_eq!(plan.mode, CollaborationMode::Consultative);
    assert_eq!(plan.participating_agent_ids, vec![AgentId::Blaze, AgentId::Wave]);
}

// ============= Collaboration modes =============

#[tokio::test]
async fn test_single_specialist_answers() {
    let team = full_team();
    let orch = orchestrator_with(&team);
    let reply = orch.handle(query("What should I eat for breakfast?")).await;

    assert_eq!(reply.response, "SAGE answer");
    assert_eq!(reply.agents_used, vec![AgentId::Sage]);
    assert_eq!(reply.metadata.intent, "nutrition");
    assert_eq!(reply.metadata.consensus_score, 1.0);
    assert!(reply.metadata.mode.is_none());
    assert_eq!(agent(&team, AgentId::Nexus).calls(), 0);
}

#[tokio::test]
async fn test_parallel_mode_merges_every_answer() {
    let team = full_team();
    let orch = orchestrator_with(&team);
    let reply = orch
        .handle(query("I need a workout program and a meal plan"))
        .await;

    assert_eq!(reply.metadata.mode, Some(CollaborationMode::Parallel));
    assert_eq!(reply.agents_used, vec![AgentId::Blaze, AgentId::Sage]);
    assert_eq!(reply.response, "**BLAZE**\nBLAZE answer\n\n**SAGE**\nSAGE answer");
    assert!((0.0..=1.0).contains(&reply.metadata.consensus_score));
    assert!(!reply.metadata.fallback);

    for id in [AgentId::Blaze, AgentId::Sage] {
        let contexts = agent(&team, id).contexts();
        assert_eq!(contexts.len(), 1);
        assert!(contexts[0].peer_notes.is_empty());
    }
}

#[tokio::test]
async fn test_sequential_mode_chains_peer_notes() {
    let team = full_team();
    let orch = orchestrator_with(&team);
    let text = "My squat is stuck, I sleep badly and wonder what to eat";

    let plan = orch.preview(&query(text)).plan;
    assert_eq!(plan.mode, CollaborationMode::Sequential);
    assert_eq!(
        plan.participating_agent_ids,
        vec![AgentId::Blaze, AgentId::Sage, AgentId::Wave]
    );

    let reply = orch.handle(query(text)).await;
    assert_eq!(reply.agents_used.len(), 3);

    let notes_seen: Vec<usize> = plan
        .participating_agent_ids
        .iter()
        .map(|id| agent(&team, *id).contexts()[0].peer_notes.len())
        .collect();
    assert_eq!(notes_seen, vec![0, 1, 2]);

    let wave = agent(&team, AgentId::Wave).contexts();
    assert_eq!(wave[0].peer_notes[0].agent_id, AgentId::Blaze);
    assert!(wave[0].instruction.is_some());
}

#[tokio::test]
async fn test_collaborative_mode_runs_an_integration_pass() {
    let team = vec![
        ScriptedAgent::answering(AgentId::Nexus),
        ScriptedAgent::answering(AgentId::Blaze),
        ScriptedAgent::replying(AgentId::Sage, "Integrated plan"),
        ScriptedAgent::answering(AgentId::Wave),
    ];
    let orch = orchestrator_with(&team);
    let text = "I want a holistic overhaul: workout, meal plan and sleep";

    let preview = orch.preview(&query(text));
    assert_eq!(preview.complexity.level, ComplexityLevel::Integral);
    assert_eq!(preview.plan.mode, CollaborationMode::Collaborative);
    assert_eq!(preview.plan.lead(), AgentId::Sage);

    let reply = orch.handle(query(text)).await;

    let sage = agent(&team, AgentId::Sage);
    assert_eq!(sage.calls(), 2);
    let integration = &sage.contexts()[1];
    assert!(integration.instruction.is_some());
    assert_eq!(integration.peer_notes.len(), 3);

    assert_eq!(agent(&team, AgentId::Blaze).calls(), 1);
    assert!(reply.response.starts_with("**SAGE**\nIntegrated plan"));
}

#[tokio::test]
async fn test_consultative_mode_reviews_the_lead_answer() {
    let team = full_team();
    let orch = orchestrator_with(&team);
    let text = "my squat has hit a plateau";

    let reply = orch.handle(query(text)).await;
    assert_eq!(reply.metadata.mode, Some(CollaborationMode::Consultative));
    assert_eq!(reply.agents_used, vec![AgentId::Blaze, AgentId::Wave]);

    let wave = agent(&team, AgentId::Wave).contexts();
    assert_eq!(wave[0].peer_notes.len(), 1);
    assert_eq!(wave[0].peer_notes[0].agent_id, AgentId::Blaze);
    assert_eq!(wave[0].peer_notes[0].content, "BLAZE answer");
}

// ============= Degradation =============

#[tokio::test]
async fn test_failed_participant_is_a_missing_perspective() {
    let team = vec![
        ScriptedAgent::answering(AgentId::Nexus),
        ScriptedAgent::answering(AgentId::Blaze),
        ScriptedAgent::rejecting(AgentId::Sage),
    ];
    let orch = orchestrator_with(&team);
    let reply = orch
        .handle(query("I need a workout program and a meal plan"))
        .await;

    assert!(!reply.metadata.fallback);
    assert_eq!(reply.response, "BLAZE answer");
    assert_eq!(reply.agents_used, vec![AgentId::Blaze]);
    let statuses: Vec<_> = reply.metadata.perspectives.iter().map(|p| p.status).collect();
    assert_eq!(statuses, vec![PerspectiveStatus::Success, PerspectiveStatus::Failed]);
}

#[tokio::test]
async fn test_all_specialists_failing_falls_back_to_nexus() {
    let team = vec![
        ScriptedAgent::replying(AgentId::Nexus, "NEXUS here"),
        ScriptedAgent::rejecting(AgentId::Blaze),
        ScriptedAgent::rejecting(AgentId::Sage),
    ];
    let orch = orchestrator_with(&team);
    let reply = orch
        .handle(query("I need a workout program and a meal plan"))
        .await;

    assert!(reply.metadata.fallback);
    assert_eq!(reply.response, "NEXUS here");
    assert_eq!(reply.agents_used, vec![AgentId::Nexus]);
    assert_eq!(reply.metadata.consensus_score, 0.0);
}

#[tokio::test]
async fn test_everyone_failing_returns_the_static_reply() {
    let team = vec![
        ScriptedAgent::rejecting(AgentId::Nexus),
        ScriptedAgent::rejecting(AgentId::Sage),
    ];
    let orch = orchestrator_with(&team);
    let reply = orch.handle(query("What should I eat for breakfast?")).await;

    assert!(reply.metadata.fallback);
    assert_eq!(reply.response, "GENESIS is unavailable right now.");
    assert!(reply.agents_used.is_empty());
    assert!(
        reply
            .metadata
            .perspectives
            .iter()
            .all(|p| p.status != PerspectiveStatus::Success)
    );
}

#[tokio::test]
async fn test_failed_nexus_participant_is_not_invoked_again() {
    // WAVE and NOVA are missing, so NEXUS pads the plan behind BLAZE
    let team = vec![
        ScriptedAgent::rejecting(AgentId::Nexus),
        ScriptedAgent::rejecting(AgentId::Blaze),
    ];
    let orch = orchestrator_with(&team);
    let reply = orch.handle(query("Does creatine affect my sleep?")).await;

    assert!(reply.metadata.fallback);
    assert_eq!(reply.response, "GENESIS is unavailable right now.");
    assert_eq!(agent(&team, AgentId::Nexus).calls(), 1);
    assert_eq!(agent(&team, AgentId::Blaze).calls(), 1);
    assert_eq!(reply.metadata.perspectives.len(), 2);
}

#[tokio::test]
async fn test_blank_answer_counts_as_failure() {
    let team = vec![
        ScriptedAgent::replying(AgentId::Nexus, "NEXUS here"),
        ScriptedAgent::blank(AgentId::Sage),
    ];
    let orch = orchestrator_with_settings(&team, single_attempt());
    let reply = orch.handle(query("What should I eat for breakfast?")).await;

    assert!(reply.metadata.fallback);
    assert_eq!(reply.response, "NEXUS here");
}

// ============= Invocation guards =============

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let team = vec![
        ScriptedAgent::answering(AgentId::Nexus),
        ScriptedAgent::flaky(AgentId::Sage, 2, "Oats and eggs"),
    ];
    let orch = orchestrator_with(&team);
    let reply = orch.handle(query("What should I eat for breakfast?")).await;

    assert_eq!(reply.response, "Oats and eggs");
    assert!(!reply.metadata.fallback);
    assert_eq!(agent(&team, AgentId::Sage).calls(), 3);
}

#[tokio::test]
async fn test_permanent_failures_are_not_retried() {
    let team = vec![
        ScriptedAgent::answering(AgentId::Nexus),
        ScriptedAgent::rejecting(AgentId::Sage),
    ];
    let orch = orchestrator_with(&team);
    orch.handle(query("What should I eat for breakfast?")).await;

    assert_eq!(agent(&team, AgentId::Sage).calls(), 1);
}

#[tokio::test]
async fn test_retries_stop_at_max_attempts() {
    let team = vec![
        ScriptedAgent::answering(AgentId::Nexus),
        ScriptedAgent::unavailable(AgentId::Sage),
    ];
    let orch = orchestrator_with(&team);
    let reply = orch.handle(query("What should I eat for breakfast?")).await;

    assert_eq!(agent(&team, AgentId::Sage).calls(), 3);
    assert!(reply.metadata.fallback);
}

#[tokio::test]
async fn test_slow_agent_times_out() {
    let team = vec![
        ScriptedAgent::answering(AgentId::Nexus),
        ScriptedAgent::slow(AgentId::Sage, Duration::from_secs(2)),
    ];
    let orch = orchestrator_with_settings(&team, single_attempt());
    let reply = orch.handle(query("What should I eat for breakfast?")).await;

    assert!(reply.metadata.fallback);
    assert_eq!(reply.response, "NEXUS answer");
    assert_eq!(reply.metadata.perspectives[0].agent_id, AgentId::Sage);
    assert_eq!(reply.metadata.perspectives[0].status, PerspectiveStatus::TimedOut);
    assert!(reply.metadata.latency_ms < 2_000);
}

#[tokio::test]
async fn test_circuit_opens_after_repeated_failures() {
    let team = vec![
        ScriptedAgent::answering(AgentId::Nexus),
        ScriptedAgent::rejecting(AgentId::Sage),
    ];
    let orch = orchestrator_with(&team);

    for _ in 0..3 {
        orch.handle(query("What should I eat for breakfast?")).await;
    }
    assert_eq!(orch.invoker().circuit_state(AgentId::Sage), CircuitState::Open);

    let reply = orch.handle(query("What should I eat for breakfast?")).await;
    assert_eq!(agent(&team, AgentId::Sage).calls(), 3);
    assert_eq!(reply.metadata.perspectives[0].status, PerspectiveStatus::CircuitOpen);
    assert_eq!(reply.response, "NEXUS answer");
    assert_eq!(orch.invoker().circuit_state(AgentId::Nexus), CircuitState::Closed);
}

// ============= Sessions =============

#[tokio::test]
async fn test_history_is_handed_to_later_turns() {
    let team = full_team();
    let orch = orchestrator_with(&team);

    orch.handle(query("hello there")).await;
    orch.handle(query("hello again")).await;

    let contexts = agent(&team, AgentId::Nexus).contexts();
    assert_eq!(contexts.len(), 2);
    assert!(contexts[0].conversation_history.is_empty());
    assert_eq!(contexts[1].conversation_history.len(), 2);
    assert_eq!(contexts[1].conversation_history[0].content, "hello there");
    assert_eq!(contexts[1].conversation_history[1].content, "NEXUS answer");
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let team = full_team();
    let orch = orchestrator_with(&team);

    orch.handle(Query::new("hello there", "u1", "a")).await;
    orch.handle(Query::new("hello there", "u2", "b")).await;

    let contexts = agent(&team, AgentId::Nexus).contexts();
    assert!(contexts[1].conversation_history.is_empty());
    assert_eq!(orch.sessions().len(), 2);
}

// ============= Settings reload =============

const RELOAD_CONFIG: &str = r#"
[providers.openai]
type = "openai"
api_key_env = "GENESIS_RELOAD_TEST_KEY"

[models.default]
provider = "openai"
model = "gpt-test"

[orchestration]
confidence_threshold = 0.6
max_agents = 4
"#;

#[tokio::test]
async fn test_reloaded_settings_reach_the_orchestrator() {
    // Only this test touches the variable
    unsafe {
        std::env::set_var("GENESIS_RELOAD_TEST_KEY", "sk-test");
    }
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("genesis.toml");
    std::fs::write(&path, RELOAD_CONFIG).unwrap();

    let manager = Arc::new(GenesisConfigManager::new(&path).unwrap());
    let state = AppState::new(Arc::clone(&manager), Arc::new(orchestrator_with(&full_team())));
    let listener = state.spawn_settings_listener();

    let broad = query("workout, meal plan, sleep, creatine and my dna");
    assert_eq!(state.orchestrator.preview(&broad).plan.participating_agent_ids.len(), 4);

    std::fs::write(
        &path,
        RELOAD_CONFIG
            .replace("confidence_threshold = 0.6", "confidence_threshold = 0.9")
            .replace("max_agents = 4", "max_agents = 2"),
    )
    .unwrap();
    manager.reload().unwrap();

    tokio::time::timeout(Duration::from_secs(2), async {
        while state.orchestrator.settings().max_agents != 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("settings were not swapped");

    let settings = state.orchestrator.settings();
    assert_eq!(settings.confidence_threshold, 0.9);
    assert_eq!(state.orchestrator.preview(&broad).plan.participating_agent_ids.len(), 2);

    // A single strong keyword now falls below the threshold
    let plan = state.orchestrator.preview(&query("how do I squat")).plan;
    assert_eq!(plan.mode, CollaborationMode::Consultative);

    listener.abort();
}
