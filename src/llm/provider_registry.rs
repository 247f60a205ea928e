//! Provider Registry for managing the configured LLM providers
//!
//! Resolves a model name from `genesis.toml` through its provider entry into
//! a ready-to-use [`LLMClient`]. Secrets are read from the environment at
//! client creation time, never stored in the config itself.

use crate::llm::client::{GenerationParams, LLMClient, Provider};
use crate::llm::vertex::VertexClient;
use crate::types::{AppError, Result};
use crate::utils::toml_config::{GenesisConfig, ModelConfig, ProviderConfig};
use std::collections::HashMap;

/// Registry for managing multiple named LLM providers
pub struct ProviderRegistry {
    /// Provider configurations keyed by name
    providers: HashMap<String, ProviderConfig>,
    /// Model configurations keyed by name
    models: HashMap<String, ModelConfig>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    /// Create a new empty provider registry
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            models: HashMap::new(),
        }
    }

    /// Create a provider registry from TOML configuration
    pub fn from_config(config: &GenesisConfig) -> Self {
        Self {
            providers: config.providers.clone(),
            models: config.models.clone(),
        }
    }

    /// Register a provider configuration
    pub fn register_provider(&mut self, name: &str, config: ProviderConfig) {
        self.providers.insert(name.to_string(), config);
    }

    /// Register a model configuration
    pub fn register_model(&mut self, name: &str, config: ModelConfig) {
        self.models.insert(name.to_string(), config);
    }

    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    pub fn get_model(&self, name: &str) -> Option<&ModelConfig> {
        self.models.get(name)
    }

    pub fn has_model(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Get all model names, sorted
    pub fn model_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Resolve the model -> provider chain into a [`Provider`]
    pub fn resolve(&self, model_name: &str) -> Result<Provider> {
        let model_config = self.get_model(model_name).ok_or_else(|| {
            AppError::Configuration(format!("Model '{}' not found in configuration", model_name))
        })?;

        let provider_config = self.get_provider(&model_config.provider).ok_or_else(|| {
            AppError::Configuration(format!(
                "Provider '{}' referenced by model '{}' not found",
                model_config.provider, model_name
            ))
        })?;

        let params = GenerationParams {
            temperature: model_config.temperature,
            max_tokens: model_config.max_tokens,
        };

        match provider_config {
            ProviderConfig::Vertex {
                project_env,
                location,
                access_token_env,
                base_url,
            } => Ok(Provider::Vertex {
                base_url: base_url
                    .clone()
                    .unwrap_or_else(|| VertexClient::default_base_url(location)),
                project: require_env(project_env)?,
                location: location.clone(),
                access_token: require_env(access_token_env)?,
                model: model_config.model.clone(),
                params,
            }),
            ProviderConfig::OpenAI {
                api_key_env,
                api_base,
            } => Ok(Provider::OpenAI {
                api_key: require_env(api_key_env)?,
                api_base: api_base.clone(),
                model: model_config.model.clone(),
                params,
            }),
        }
    }

    /// Create an LLM client for a specific model by name
    pub fn create_client_for_model(&self, model_name: &str) -> Result<Box<dyn LLMClient>> {
        self.resolve(model_name)?.create_client()
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            AppError::Configuration(format!("Environment variable '{}' is not set", name))
        })
}
