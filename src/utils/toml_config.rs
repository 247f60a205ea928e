//! TOML-based configuration for GENESIS
//!
//! This module provides declarative configuration for model providers, models,
//! agents, topic routing and orchestration behavior via a TOML file
//! (`genesis.toml`).
//!
//! # Hot Reloading
//!
//! Configuration changes are detected and applied at runtime. Use
//! `GenesisConfigManager` for thread-safe access to the current configuration
//! and `subscribe()` to react to reloads.

use crate::agents::{AgentId, Topic};
use arc_swap::ArcSwap;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

/// Root configuration structure loaded from genesis.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenesisConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    /// Named LLM provider configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Named model configurations that reference providers
    #[serde(default)]
    pub models: HashMap<String, ModelConfig>,

    /// Per-agent configuration keyed by agent id (`sage`, `blaze`, ...)
    #[serde(default)]
    pub agents: HashMap<String, AgentConfig>,

    /// Topic routing overrides keyed by topic name
    #[serde(default)]
    pub topics: HashMap<String, TopicConfig>,

    #[serde(default)]
    pub orchestration: OrchestrationConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

// ============= Authentication Configuration =============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Environment variable holding the API key. When unset or empty the API is open.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

// ============= Provider Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    /// Google Vertex AI `generateContent`
    Vertex {
        /// Environment variable containing the GCP project id
        project_env: String,
        #[serde(default = "default_vertex_location")]
        location: String,
        /// Environment variable containing an OAuth access token
        access_token_env: String,
        /// Override for the API host (tests, private endpoints)
        #[serde(default)]
        base_url: Option<String>,
    },
    /// OpenAI-compatible chat completions
    OpenAI {
        /// Environment variable containing API key
        api_key_env: String,
        #[serde(default = "default_openai_base")]
        api_base: String,
    },
}

fn default_vertex_location() -> String {
    "us-central1".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

// ============= Model Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Reference to a provider name defined in [providers]
    pub provider: String,

    /// Model name/identifier to use with the provider
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_model_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_model_max_tokens() -> u32 {
    1024
}

// ============= Agent Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Reference to a model name defined in [models]; falls back to `orchestration.default_model`
    #[serde(default)]
    pub model: Option<String>,

    /// System prompt override
    #[serde(default)]
    pub system_prompt: Option<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: None,
            system_prompt: None,
            enabled: true,
        }
    }
}

fn default_true() -> bool {
    true
}

// ============= Topic Configuration =============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicConfig {
    /// Capable agents, primary first. Empty keeps the built-in mapping.
    #[serde(default)]
    pub agents: Vec<String>,

    /// Extra keywords merged into the built-in vocabulary
    #[serde(default)]
    pub keywords: Vec<String>,
}

// ============= Orchestration Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationConfig {
    /// Intent confidence below this triggers a multi-agent plan
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// Upper bound on participants in a multi-agent plan
    #[serde(default = "default_max_agents")]
    pub max_agents: usize,

    /// Per-attempt timeout for a single agent call
    #[serde(default = "default_agent_timeout_ms")]
    pub agent_timeout_ms: u64,

    /// Model used by agents without an explicit `model`
    #[serde(default = "default_model_name")]
    pub default_model: String,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,

    #[serde(default)]
    pub synthesis: SynthesisMode,

    /// Model used when `synthesis = "model"`
    #[serde(default)]
    pub synthesis_model: Option<String>,

    /// Messages of session history handed to agents
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Sessions kept in memory before the least recently used is evicted
    #[serde(default = "default_session_capacity")]
    pub session_capacity: usize,

    /// Reply used when every agent, NEXUS included, failed
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisMode {
    /// Ranked, labelled concatenation of agent outputs
    #[default]
    Concatenate,
    /// Merge with a model, falling back to concatenation
    Model,
}

fn default_confidence_threshold() -> f32 {
    0.6
}

fn default_max_agents() -> usize {
    4
}

fn default_agent_timeout_ms() -> u64 {
    30_000
}

fn default_model_name() -> String {
    "default".to_string()
}

fn default_history_limit() -> usize {
    10
}

fn default_session_capacity() -> usize {
    1000
}

fn default_fallback_message() -> String {
    "I'm having trouble reaching my specialist agents right now. Please try again in a moment."
        .to_string()
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: default_confidence_threshold(),
            max_agents: default_max_agents(),
            agent_timeout_ms: default_agent_timeout_ms(),
            default_model: default_model_name(),
            retry: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            synthesis: SynthesisMode::default(),
            synthesis_model: None,
            history_limit: default_history_limit(),
            session_capacity: default_session_capacity(),
            fallback_message: default_fallback_message(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 200,
            max_delay_ms: 5_000,
            multiplier: 2.0,
            jitter: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub success_threshold: u32,
    pub reset_timeout_ms: u64,
    pub failure_window_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            reset_timeout_ms: 30_000,
            failure_window_ms: 60_000,
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Configuration warnings that don't prevent operation but may indicate issues
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub kind: ConfigWarningKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarningKind {
    UnusedProvider,
    UnusedModel,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    #[error("Provider '{0}' referenced by model '{1}' does not exist")]
    MissingProvider(String, String),

    #[error("Model '{0}' referenced by '{1}' does not exist")]
    MissingModel(String, String),

    #[error("Unknown agent '{0}'")]
    UnknownAgent(String),

    #[error("Unknown topic '{0}'")]
    UnknownTopic(String),

    #[error("Watch error: {0}")]
    WatchError(#[from] notify::Error),
}

impl GenesisConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: GenesisConfig = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate internal references, value ranges and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        let orch = &self.orchestration;
        if !(0.0..=1.0).contains(&orch.confidence_threshold) {
            return Err(ConfigError::ValidationError(format!(
                "orchestration.confidence_threshold must be within [0, 1], got {}",
                orch.confidence_threshold
            )));
        }
        if orch.max_agents < 2 {
            return Err(ConfigError::ValidationError(format!(
                "orchestration.max_agents must be at least 2, got {}",
                orch.max_agents
            )));
        }
        if orch.agent_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "orchestration.agent_timeout_ms must be positive".to_string(),
            ));
        }

        for provider in self.providers.values() {
            match provider {
                ProviderConfig::Vertex {
                    project_env,
                    access_token_env,
                    ..
                } => {
                    self.validate_env_var(project_env)?;
                    self.validate_env_var(access_token_env)?;
                }
                ProviderConfig::OpenAI { api_key_env, .. } => {
                    self.validate_env_var(api_key_env)?;
                }
            }
        }

        for (model_name, model_config) in &self.models {
            if !self.providers.contains_key(&model_config.provider) {
                return Err(ConfigError::MissingProvider(
                    model_config.provider.clone(),
                    model_name.clone(),
                ));
            }
        }

        for (agent_name, agent_config) in &self.agents {
            if AgentId::parse(agent_name).is_none() {
                return Err(ConfigError::UnknownAgent(agent_name.clone()));
            }
            if let Some(model) = &agent_config.model
                && !self.models.contains_key(model)
            {
                return Err(ConfigError::MissingModel(
                    model.clone(),
                    format!("agent {}", agent_name),
                ));
            }
        }

        if self.agents.get("nexus").is_some_and(|a| !a.enabled) {
            return Err(ConfigError::ValidationError(
                "agent 'nexus' is the fallback agent and cannot be disabled".to_string(),
            ));
        }

        for (topic_name, topic_config) in &self.topics {
            if Topic::parse(topic_name).is_none() {
                return Err(ConfigError::UnknownTopic(topic_name.clone()));
            }
            for agent in &topic_config.agents {
                if AgentId::parse(agent).is_none() {
                    return Err(ConfigError::UnknownAgent(agent.clone()));
                }
            }
        }

        if let Some(model) = &orch.synthesis_model
            && !self.models.contains_key(model)
        {
            return Err(ConfigError::MissingModel(
                model.clone(),
                "orchestration.synthesis_model".to_string(),
            ));
        }

        let uses_default_model = AgentId::ALL.into_iter().any(|id| {
            let agent = self.agent(id);
            agent.enabled && agent.model.is_none()
        });
        if uses_default_model && !self.models.contains_key(&orch.default_model) {
            return Err(ConfigError::MissingModel(
                orch.default_model.clone(),
                "orchestration.default_model".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate configuration with warnings for unused items
    pub fn validate_with_warnings(&self) -> Result<Vec<ConfigWarning>, ConfigError> {
        self.validate()?;

        let mut warnings = Vec::new();
        warnings.extend(self.check_unused_providers());
        warnings.extend(self.check_unused_models());
        Ok(warnings)
    }

    fn check_unused_providers(&self) -> Vec<ConfigWarning> {
        let referenced: HashSet<_> = self.models.values().map(|m| m.provider.as_str()).collect();

        self.providers
            .keys()
            .filter(|name| !referenced.contains(name.as_str()))
            .map(|name| ConfigWarning {
                kind: ConfigWarningKind::UnusedProvider,
                message: format!(
                    "Provider '{}' is defined but not referenced by any model",
                    name
                ),
            })
            .collect()
    }

    fn check_unused_models(&self) -> Vec<ConfigWarning> {
        let mut referenced: HashSet<&str> = self
            .agents
            .values()
            .filter_map(|a| a.model.as_deref())
            .collect();
        referenced.insert(self.orchestration.default_model.as_str());
        if let Some(model) = &self.orchestration.synthesis_model {
            referenced.insert(model.as_str());
        }

        self.models
            .keys()
            .filter(|name| !referenced.contains(name.as_str()))
            .map(|name| ConfigWarning {
                kind: ConfigWarningKind::UnusedModel,
                message: format!(
                    "Model '{}' is defined but not referenced by any agent",
                    name
                ),
            })
            .collect()
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }

    /// Get a resolved value from an env var reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok().filter(|v| !v.is_empty())
    }

    /// API key guarding `/api/*`, if one is configured and set
    pub fn api_key(&self) -> Option<String> {
        self.auth
            .api_key_env
            .as_deref()
            .and_then(|env| self.resolve_env(env))
    }

    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    pub fn get_model(&self, name: &str) -> Option<&ModelConfig> {
        self.models.get(name)
    }

    /// Agent config, or the defaults when the agent has no section
    pub fn agent(&self, id: AgentId) -> AgentConfig {
        self.agents.get(id.as_str()).cloned().unwrap_or_default()
    }

    /// Model name an agent runs on
    pub fn agent_model(&self, id: AgentId) -> String {
        self.agent(id)
            .model
            .unwrap_or_else(|| self.orchestration.default_model.clone())
    }

    /// Topic → agents overrides, parsed
    pub fn topic_overrides(&self) -> HashMap<Topic, Vec<AgentId>> {
        self.topics
            .iter()
            .filter_map(|(name, tc)| {
                let topic = Topic::parse(name)?;
                let agents: Vec<AgentId> =
                    tc.agents.iter().filter_map(|a| AgentId::parse(a)).collect();
                (!agents.is_empty()).then_some((topic, agents))
            })
            .collect()
    }

    /// Extra topic keywords, parsed
    pub fn topic_keywords(&self) -> HashMap<Topic, Vec<String>> {
        self.topics
            .iter()
            .filter_map(|(name, tc)| {
                let topic = Topic::parse(name)?;
                (!tc.keywords.is_empty()).then(|| (topic, tc.keywords.clone()))
            })
            .collect()
    }
}

// ============= Hot Reloading Configuration Manager =============

/// Thread-safe configuration manager with hot reloading support
pub struct GenesisConfigManager {
    config: Arc<ArcSwap<GenesisConfig>>,
    config_path: PathBuf,
    watcher: RwLock<Option<RecommendedWatcher>>,
    changes: watch::Sender<Arc<GenesisConfig>>,
}

impl GenesisConfigManager {
    /// Create a new configuration manager and load the initial config
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        // Absolute path for reliable file watching
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(ConfigError::ReadError)?
                .join(path)
        };

        let config = GenesisConfig::load(&path)?;
        Ok(Self::build(config, path))
    }

    /// Create a config manager directly from a config (no file watching)
    pub fn from_config(config: GenesisConfig) -> Self {
        Self::build(config, PathBuf::from("genesis.toml"))
    }

    fn build(config: GenesisConfig, config_path: PathBuf) -> Self {
        let config = Arc::new(config);
        let (changes, _) = watch::channel(Arc::clone(&config));
        Self {
            config: Arc::new(ArcSwap::new(config)),
            config_path,
            watcher: RwLock::new(None),
            changes,
        }
    }

    /// Get the current configuration (lockless read)
    pub fn config(&self) -> Arc<GenesisConfig> {
        self.config.load_full()
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Receive every successfully reloaded configuration
    pub fn subscribe(&self) -> watch::Receiver<Arc<GenesisConfig>> {
        self.changes.subscribe()
    }

    /// Manually reload the configuration from disk
    pub fn reload(&self) -> Result<(), ConfigError> {
        info!("Reloading configuration from {:?}", self.config_path);

        let new_config = Arc::new(GenesisConfig::load(&self.config_path)?);
        self.config.store(Arc::clone(&new_config));
        self.changes.send_replace(new_config);

        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Start watching the config file for changes
    pub fn start_watching(&self) -> Result<(), ConfigError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        // Debounced in the receiver
                        let _ = tx.send(());
                    }
                }
                Err(e) => {
                    error!("Config watcher error: {:?}", e);
                }
            }
        })?;

        if let Some(parent) = self.config_path.parent() {
            watcher.watch(parent, RecursiveMode::NonRecursive)?;
        }
        *self.watcher.write() = Some(watcher);

        let config_path = self.config_path.clone();
        let config_arc = Arc::clone(&self.config);
        let changes = self.changes.clone();
        tokio::spawn(async move {
            let debounce = Duration::from_millis(500);
            let mut last_reload: Option<std::time::Instant> = None;

            while rx.recv().await.is_some() {
                if last_reload.is_some_and(|t| t.elapsed() < debounce) {
                    continue;
                }

                // Let the writer finish
                tokio::time::sleep(Duration::from_millis(100)).await;

                match GenesisConfig::load(&config_path) {
                    Ok(new_config) => {
                        let new_config = Arc::new(new_config);
                        config_arc.store(Arc::clone(&new_config));
                        changes.send_replace(new_config);
                        info!("Configuration hot-reloaded successfully");
                        last_reload = Some(std::time::Instant::now());
                    }
                    Err(e) => {
                        warn!("Failed to hot-reload config: {}. Keeping previous config.", e);
                    }
                }
            }
        });

        info!("Configuration hot-reload watcher started");
        Ok(())
    }

    /// Stop watching for configuration changes
    pub fn stop_watching(&self) {
        *self.watcher.write() = None;
        info!("Configuration hot-reload watcher stopped");
    }
}
