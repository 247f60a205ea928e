use crate::llm::client::{GenerationParams, LLMClient};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Vertex AI client speaking the Gemini `generateContent` REST API
pub struct VertexClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: String,
    model: String,
    params: GenerationParams,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl VertexClient {
    pub fn new(
        base_url: String,
        project: String,
        location: String,
        access_token: String,
        model: String,
        params: GenerationParams,
    ) -> Self {
        let endpoint = format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            base_url.trim_end_matches('/'),
            project,
            location,
            model
        );

        Self {
            http: reqwest::Client::new(),
            endpoint,
            access_token,
            model,
            params,
        }
    }

    /// Default regional API host for a location
    pub fn default_base_url(location: &str) -> String {
        format!("https://{}-aiplatform.googleapis.com", location)
    }

    fn build_request<'a>(&self, messages: &'a [(String, String)]) -> GenerateContentRequest<'a> {
        let system_parts: Vec<Part<'a>> = messages
            .iter()
            .filter(|(role, _)| role == "system")
            .map(|(_, content)| Part { text: content })
            .collect();

        let contents = messages
            .iter()
            .filter(|(role, _)| role != "system")
            .map(|(role, content)| Content {
                // Gemini calls the assistant side "model"
                role: if role == "assistant" { "model" } else { "user" },
                parts: vec![Part { text: content }],
            })
            .collect();

        GenerateContentRequest {
            contents,
            system_instruction: (!system_parts.is_empty()).then_some(SystemInstruction {
                parts: system_parts,
            }),
            generation_config: GenerationConfig {
                temperature: self.params.temperature,
                max_output_tokens: self.params.max_tokens,
            },
        }
    }
}

#[async_trait]
impl LLMClient for VertexClient {
    async fn generate_with_history(&self, messages: &[(String, String)]) -> Result<String> {
        let body = self.build_request(messages);

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LLM(format!("Vertex AI request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::LLM(format!(
                "Vertex AI returned {}: {}",
                status, detail
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::LLM(format!("Invalid Vertex AI response: {}", e)))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AppError::LLM("No response from Vertex AI".to_string()));
        }
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
