use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::services::generation_service::GenerationError;

/// A fully built generation request: directives plus the requested count.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub system_directive: String,
    pub prompt: String,
    pub count: u32,
}

/// Seam to the generative collaborator. Production uses [`GeminiClient`];
/// tests substitute scripted sources. Implementations own the transport-level
/// error mapping and must treat the returned text as untrusted.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Issues exactly one generation call and returns the raw response text.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;

    /// Whether the collaborator is reachable in principle (credentials
    /// present). Used by the health endpoint.
    fn is_configured(&self) -> bool;
}

/// Client for a Gemini-style `generateContent` HTTP API.
pub struct GeminiClient {
    http_client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
    timeout: std::time::Duration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: ContentPayload,
    contents: Vec<ContentPayload>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct ContentPayload {
    parts: Vec<TextPart>,
}

#[derive(Debug, Serialize)]
struct TextPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_url: config.generation_api_url.clone(),
            api_key: config.generation_api_key.clone(),
            model: config.generation_model.clone(),
            timeout: std::time::Duration::from_secs(config.generation_timeout_secs),
        }
    }
}

#[async_trait]
impl QuestionSource for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        // Fail fast when unconfigured; the request is never issued.
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            GenerationError::Configuration("generation API key is not set".to_string())
        })?;

        let url = format!(
            "{}/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            self.model
        );

        let payload = GenerateContentRequest {
            system_instruction: ContentPayload {
                parts: vec![TextPart {
                    text: request.system_directive.clone(),
                }],
            },
            contents: vec![ContentPayload {
                parts: vec![TextPart {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        tracing::debug!(model = %self.model, count = request.count, "Calling generation API");

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GenerationError::Network(format!(
                "generation API returned {}: {}",
                status, error_text
            )));
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        // A safety-filtered prompt comes back with no candidates or empty
        // parts rather than a transport error.
        let text: String = body
            .candidates
            .into_iter()
            .filter_map(|candidate| candidate.content)
            .flat_map(|content| content.parts)
            .filter_map(|part| part.text)
            .collect();

        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        Ok(text)
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
