//! Mock agents and LLM clients shared by the integration tests.
//!
//! Agents here never touch the network. Each one records how often it was
//! called and what context it saw, so tests can assert on routing and on the
//! peer notes a collaboration mode hands around.

#![allow(dead_code)]

use async_trait::async_trait;
use genesis::agents::{Agent, AgentId, AgentRegistryBuilder};
use genesis::coordination::{AgentInvoker, ResponseSynthesizer};
use genesis::llm::LLMClient;
use genesis::types::{AgentContext, AppError, Query, Result};
use genesis::utils::toml_config::{CircuitBreakerConfig, OrchestrationConfig, RetryConfig};
use genesis::Orchestrator;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Clone)]
enum Behavior {
    Reply(String),
    /// Fails with a transient error for the first `n` calls, then replies
    FlakyThen(usize, String),
    Transient,
    Permanent,
    Blank,
    Slow(Duration, String),
}

/// Agent with a fixed behavior and call recording
pub struct ScriptedAgent {
    id: AgentId,
    behavior: Behavior,
    calls: AtomicUsize,
    contexts: Mutex<Vec<AgentContext>>,
}

impl ScriptedAgent {
    fn with_behavior(id: AgentId, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            id,
            behavior,
            calls: AtomicUsize::new(0),
            contexts: Mutex::new(Vec::new()),
        })
    }

    /// Always answers with `text`
    pub fn replying(id: AgentId, text: &str) -> Arc<Self> {
        Self::with_behavior(id, Behavior::Reply(text.to_string()))
    }

    /// Answers `"<NAME> answer"`
    pub fn answering(id: AgentId) -> Arc<Self> {
        Self::replying(id, &format!("{} answer", id.display_name()))
    }

    /// Transient failures for the first `failures` calls, then `text`
    pub fn flaky(id: AgentId, failures: usize, text: &str) -> Arc<Self> {
        Self::with_behavior(id, Behavior::FlakyThen(failures, text.to_string()))
    }

    /// Always fails with a retryable error
    pub fn unavailable(id: AgentId) -> Arc<Self> {
        Self::with_behavior(id, Behavior::Transient)
    }

    /// Always fails with a non-retryable error
    pub fn rejecting(id: AgentId) -> Arc<Self> {
        Self::with_behavior(id, Behavior::Permanent)
    }

    /// Answers with whitespace only
    pub fn blank(id: AgentId) -> Arc<Self> {
        Self::with_behavior(id, Behavior::Blank)
    }

    /// Sleeps for `delay` before answering
    pub fn slow(id: AgentId, delay: Duration) -> Arc<Self> {
        Self::with_behavior(
            id,
            Behavior::Slow(delay, format!("{} answer", id.display_name())),
        )
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Contexts received, in call order
    pub fn contexts(&self) -> Vec<AgentContext> {
        self.contexts.lock().clone()
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    async fn process(&self, _query: &Query, context: &AgentContext) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.contexts.lock().push(context.clone());

        match &self.behavior {
            Behavior::Reply(text) => Ok(text.clone()),
            Behavior::FlakyThen(failures, text) => {
                if call < *failures {
                    Err(AppError::LLM(format!("upstream hiccup #{}", call + 1)))
                } else {
                    Ok(text.clone())
                }
            }
            Behavior::Transient => Err(AppError::LLM("model unavailable".to_string())),
            Behavior::Permanent => Err(AppError::InvalidInput("request rejected".to_string())),
            Behavior::Blank => Ok("   ".to_string()),
            Behavior::Slow(delay, text) => {
                tokio::time::sleep(*delay).await;
                Ok(text.clone())
            }
        }
    }

    fn id(&self) -> AgentId {
        self.id
    }
}

/// Mock LLM client returning a fixed response and recording the messages it got
pub struct MockLLMClient {
    response: Option<String>,
    seen: Mutex<Vec<Vec<(String, String)>>>,
}

impl MockLLMClient {
    pub fn new(response: &str) -> Self {
        Self {
            response: Some(response.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<Vec<(String, String)>> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate_with_history(&self, messages: &[(String, String)]) -> Result<String> {
        self.seen.lock().push(messages.to_vec());
        self.response
            .clone()
            .ok_or_else(|| AppError::LLM("Mock LLM failure".to_string()))
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Settings tuned for tests: no backoff sleeps, short timeout
pub fn fast_settings() -> OrchestrationConfig {
    OrchestrationConfig {
        agent_timeout_ms: 200,
        retry: RetryConfig {
            max_attempts: 3,
            initial_delay_ms: 1,
            max_delay_ms: 2,
            multiplier: 1.0,
            jitter: false,
        },
        circuit_breaker: CircuitBreakerConfig {
            failure_threshold: 3,
            success_threshold: 1,
            reset_timeout_ms: 60_000,
            failure_window_ms: 60_000,
        },
        fallback_message: "GENESIS is unavailable right now.".to_string(),
        ..Default::default()
    }
}

/// Orchestrator over the given agents with [`fast_settings`]
pub fn orchestrator_with(agents: &[Arc<ScriptedAgent>]) -> Orchestrator {
    orchestrator_with_settings(agents, fast_settings())
}

pub fn orchestrator_with_settings(
    agents: &[Arc<ScriptedAgent>],
    settings: OrchestrationConfig,
) -> Orchestrator {
    let registry = agents
        .iter()
        .fold(AgentRegistryBuilder::new(), |builder, agent| {
            builder.with_agent(Arc::clone(agent) as Arc<dyn Agent>)
        })
        .build()
        .expect("registry with NEXUS");
    let invoker = Arc::new(AgentInvoker::new(Arc::new(registry), &settings));
    Orchestrator::new(invoker, ResponseSynthesizer::new(), settings)
}

/// NEXUS plus every specialist, all answering
pub fn full_team() -> Vec<Arc<ScriptedAgent>> {
    AgentId::ALL.into_iter().map(ScriptedAgent::answering).collect()
}
