//! LLM client abstraction and provider selection
//!
//! Agents only ever see [`LLMClient`]; which hosted model sits behind it is
//! decided by a [`Provider`] built from configuration.

use crate::types::Result;
use async_trait::async_trait;

/// Generic LLM client trait for provider abstraction
///
/// Completions are opaque text; GENESIS never inspects model internals.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion from a prompt
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_history(&[("user".to_string(), prompt.to_string())])
            .await
    }

    /// Generate with system prompt
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.generate_with_history(&[
            ("system".to_string(), system.to_string()),
            ("user".to_string(), prompt.to_string()),
        ])
        .await
    }

    /// Generate with conversation history
    async fn generate_with_history(
        &self,
        messages: &[(String, String)], // (role, content) pairs
    ) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Sampling parameters shared by all providers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

/// Provider enum for runtime selection
#[derive(Debug, Clone)]
pub enum Provider {
    /// Google Vertex AI (Gemini `generateContent`)
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::Vertex {
    ///     base_url: "https://us-central1-aiplatform.googleapis.com".to_string(),
    ///     project: "my-project".to_string(),
    ///     location: "us-central1".to_string(),
    ///     access_token: token,
    ///     model: "gemini-1.5-pro".to_string(),
    ///     params: GenerationParams::default(),
    /// };
    /// ```
    Vertex {
        base_url: String,
        project: String,
        location: String,
        access_token: String,
        model: String,
        params: GenerationParams,
    },

    /// OpenAI API and compatible endpoints
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
        params: GenerationParams,
    },
}

impl Provider {
    /// Create a client instance for this provider
    pub fn create_client(&self) -> Result<Box<dyn LLMClient>> {
        match self {
            Provider::Vertex {
                base_url,
                project,
                location,
                access_token,
                model,
                params,
            } => Ok(Box::new(super::vertex::VertexClient::new(
                base_url.clone(),
                project.clone(),
                location.clone(),
                access_token.clone(),
                model.clone(),
                *params,
            ))),

            Provider::OpenAI {
                api_key,
                api_base,
                model,
                params,
            } => Ok(Box::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                *params,
            ))),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Vertex { .. } => "Vertex AI",
            Provider::OpenAI { .. } => "OpenAI",
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Provider::Vertex { model, .. } | Provider::OpenAI { model, .. } => model,
        }
    }
}
