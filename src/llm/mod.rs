//! LLM Provider Clients and Abstractions
//!
//! Every GENESIS agent produces text through an [`LLMClient`]. Two hosted
//! providers are supported, both spoken over plain HTTPS with `reqwest`:
//! - Google Vertex AI (`generateContent`)
//! - OpenAI and OpenAI-compatible `/chat/completions` endpoints
//!
//! # Example
//!
//! ```ignore
//! use genesis::llm::ProviderRegistry;
//!
//! let registry = ProviderRegistry::from_config(&config);
//! let client = registry.create_client_for_model("default")?;
//! let text = client.generate_with_system("You are SAGE.", "Is oatmeal a good breakfast?").await?;
//! ```

/// Core LLM client trait and provider selection.
pub mod client;
/// OpenAI-compatible chat completions client.
pub mod openai;
/// Registry resolving configured models to clients.
pub mod provider_registry;
/// Vertex AI Gemini client.
pub mod vertex;

pub use client::{GenerationParams, LLMClient, Provider};
pub use provider_registry::ProviderRegistry;
