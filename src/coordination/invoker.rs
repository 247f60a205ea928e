//! Guarded agent invocation
//!
//! Every outbound agent call goes through [`AgentInvoker::invoke`], which
//! applies a per-attempt timeout, retries transient failures with backoff and
//! keeps one circuit breaker per agent. Failures come back as non-success
//! [`AgentPerspective`]s instead of errors.

use crate::agents::{AgentId, AgentRegistry};
use crate::types::{AgentContext, AgentPerspective, AppError, PerspectiveStatus, Query};
use crate::utils::circuit_breaker::{CircuitBreaker, CircuitState};
use crate::utils::retry::retry_with_backoff;
use crate::utils::toml_config::{OrchestrationConfig, RetryConfig};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub struct AgentInvoker {
    registry: Arc<AgentRegistry>,
    timeout: Duration,
    retry: RetryConfig,
    breakers: HashMap<AgentId, CircuitBreaker>,
}

impl AgentInvoker {
    pub fn new(registry: Arc<AgentRegistry>, config: &OrchestrationConfig) -> Self {
        let breakers = AgentId::ALL
            .into_iter()
            .map(|id| (id, CircuitBreaker::new(id.as_str(), &config.circuit_breaker)))
            .collect();

        Self {
            registry,
            timeout: Duration::from_millis(config.agent_timeout_ms),
            retry: config.retry.clone(),
            breakers,
        }
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Invoke one agent. Never fails; problems are reported in the perspective.
    pub async fn invoke(
        &self,
        agent_id: AgentId,
        query: &Query,
        context: &AgentContext,
    ) -> AgentPerspective {
        let started = Instant::now();

        let Some(agent) = self.registry.get(agent_id) else {
            return AgentPerspective::failure(
                agent_id,
                PerspectiveStatus::Failed,
                AppError::NotFound(format!("agent {} is not registered", agent_id)).to_string(),
                0,
            );
        };

        let breaker = self.breakers.get(&agent_id);
        if breaker.is_some_and(|b| !b.allow_request()) {
            debug!(agent = %agent_id, "Circuit open, skipping call");
            return AgentPerspective::failure(
                agent_id,
                PerspectiveStatus::CircuitOpen,
                AppError::CircuitOpen(agent_id.to_string()).to_string(),
                0,
            );
        }

        let timeout = self.timeout;
        let outcome = retry_with_backoff(
            &self.retry,
            |attempt| {
                let agent = Arc::clone(&agent);
                async move {
                    debug!(agent = %agent_id, attempt, "Invoking agent");
                    match tokio::time::timeout(timeout, agent.process(query, context)).await {
                        Ok(Ok(text)) if text.trim().is_empty() => {
                            Err(AppError::Agent(format!("agent {} returned no text", agent_id)))
                        }
                        Ok(result) => result,
                        Err(_) => Err(AppError::Timeout(format!(
                            "agent {} did not answer within {} ms",
                            agent_id,
                            timeout.as_millis()
                        ))),
                    }
                }
            },
            AppError::is_transient,
        )
        .await;

        let latency_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Ok((text, attempts)) => {
                if let Some(b) = breaker {
                    b.record_success();
                }
                debug!(agent = %agent_id, latency_ms, attempts, "Agent answered");
                AgentPerspective::success(agent_id, text, latency_ms)
            }
            Err((err, attempts)) => {
                if let Some(b) = breaker {
                    b.record_failure();
                }
                warn!(agent = %agent_id, latency_ms, attempts, error = %err, "Agent call failed");
                let status = match err {
                    AppError::Timeout(_) => PerspectiveStatus::TimedOut,
                    AppError::CircuitOpen(_) => PerspectiveStatus::CircuitOpen,
                    _ => PerspectiveStatus::Failed,
                };
                AgentPerspective::failure(agent_id, status, err.to_string(), latency_ms)
            }
        }
    }

    pub fn circuit_state(&self, agent_id: AgentId) -> CircuitState {
        self.breakers
            .get(&agent_id)
            .map(CircuitBreaker::state)
            .unwrap_or(CircuitState::Closed)
    }

    /// Breaker state of every agent, in agent order
    pub fn circuit_states(&self) -> Vec<(AgentId, CircuitState)> {
        AgentId::ALL
            .into_iter()
            .map(|id| (id, self.circuit_state(id)))
            .collect()
    }
}
