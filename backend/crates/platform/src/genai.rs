//! Generative text client (Gemini `generateContent`)

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug, Error)]
pub enum GenAiError {
    #[error("Generation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Generation provider returned status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Generation provider returned no text")]
    EmptyResponse,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
            temperature: 0.7,
            max_output_tokens: 2048,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
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
struct GenerateResponse {
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
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, config: GeminiConfig) -> Self {
        Self { http, config }
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenAiError> {
        let request = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        };

        let response = self
            .http
            .post(self.config.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenAiError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await?;
        parsed.into_text().ok_or(GenAiError::EmptyResponse)
    }
}

/// Returns a fixed reply and records prompts
#[derive(Debug, Clone, Default)]
pub struct ScriptedGenerator {
    reply: String,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedGenerator {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            prompts: Arc::default(),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[derive(Debug, Clone)]
pub enum TextGenerator {
    Gemini(GeminiClient),
    Scripted(ScriptedGenerator),
}

impl TextGenerator {
    pub async fn generate(&self, prompt: &str) -> Result<String, GenAiError> {
        match self {
            TextGenerator::Gemini(client) => {
                let text = client.generate(prompt).await?;
                tracing::debug!(chars = text.len(), "Generated text");
                Ok(text)
            }
            TextGenerator::Scripted(scripted) => {
                scripted
                    .prompts
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .push(prompt.to_string());
                if scripted.reply.is_empty() {
                    return Err(GenAiError::EmptyResponse);
                }
                Ok(scripted.reply.clone())
            }
        }
    }
}
