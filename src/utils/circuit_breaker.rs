//! Per-agent circuit breaker
//!
//! Stops hammering an agent that keeps failing:
//! - Closed: calls pass through, failures are counted in a rolling window
//! - Open: calls are rejected until the reset timeout elapses
//! - HalfOpen: probe calls pass; enough successes close the circuit, any failure reopens it

use crate::utils::toml_config::CircuitBreakerConfig;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failures: u32,
    successes: u32,
    window_started: Option<Instant>,
    opened_at: Option<Instant>,
}

/// Circuit breaker guarding a single agent
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    failure_threshold: u32,
    success_threshold: u32,
    reset_timeout: Duration,
    failure_window: Duration,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: &CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            failure_threshold: config.failure_threshold.max(1),
            success_threshold: config.success_threshold.max(1),
            reset_timeout: Duration::from_millis(config.reset_timeout_ms),
            failure_window: Duration::from_millis(config.failure_window_ms),
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                failures: 0,
                successes: 0,
                window_started: None,
                opened_at: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state, applying the open → half-open transition if due
    pub fn state(&self) -> CircuitState {
        let mut inner = self.inner.lock();
        self.maybe_half_open(&mut inner);
        inner.state
    }

    pub fn failure_count(&self) -> u32 {
        self.inner.lock().failures
    }

    /// Whether a call may go through right now
    pub fn allow_request(&self) -> bool {
        self.state() != CircuitState::Open
    }

    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.failures = 0;
                inner.window_started = None;
            }
            CircuitState::HalfOpen => {
                inner.successes += 1;
                if inner.successes >= self.success_threshold {
                    tracing::info!(agent = %self.name, "Circuit breaker closed");
                    inner.state = CircuitState::Closed;
                    inner.failures = 0;
                    inner.successes = 0;
                    inner.window_started = None;
                    inner.opened_at = None;
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        let now = Instant::now();
        match inner.state {
            CircuitState::Closed => {
                let window_expired = inner
                    .window_started
                    .is_some_and(|started| now.duration_since(started) > self.failure_window);
                if window_expired || inner.window_started.is_none() {
                    inner.window_started = Some(now);
                    inner.failures = 0;
                }
                inner.failures += 1;
                tracing::debug!(
                    agent = %self.name,
                    failures = inner.failures,
                    threshold = self.failure_threshold,
                    "Circuit breaker failure recorded"
                );
                if inner.failures >= self.failure_threshold {
                    self.open(&mut inner, now);
                }
            }
            CircuitState::HalfOpen => {
                tracing::warn!(agent = %self.name, "Probe failed in half-open state, reopening");
                self.open(&mut inner, now);
            }
            CircuitState::Open => {}
        }
    }

    /// Force the breaker back to closed
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.state = CircuitState::Closed;
        inner.failures = 0;
        inner.successes = 0;
        inner.window_started = None;
        inner.opened_at = None;
    }

    fn open(&self, inner: &mut BreakerInner, now: Instant) {
        tracing::warn!(agent = %self.name, failures = inner.failures, "Circuit breaker opened");
        inner.state = CircuitState::Open;
        inner.opened_at = Some(now);
        inner.successes = 0;
    }

    fn maybe_half_open(&self, inner: &mut BreakerInner) {
        if inner.state != CircuitState::Open {
            return;
        }
        let due = inner
            .opened_at
            .is_none_or(|opened| opened.elapsed() >= self.reset_timeout);
        if due {
            tracing::info!(agent = %self.name, "Circuit breaker half-open");
            inner.state = CircuitState::HalfOpen;
            inner.failures = 0;
            inner.successes = 0;
        }
    }
}
