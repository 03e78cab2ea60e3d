//! Question answering backed by an external completion service.

use crate::{CompanionError, InteractionStore, Result};
use async_trait::async_trait;
use companion_types::Interaction;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Answer recorded when the service replies with no text.
pub const EMPTY_COMPLETION_ANSWER: &str = "No response received.";

/// Starter questions offered before the student types anything.
pub const SUGGESTIONS: &[&str] = &[
    "What events are coming up?",
    "How do I sign up for an event?",
    "What classes do I have today?",
];

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Text completion service.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Produce an answer for the prompt. `Ok(None)` means the service replied
    /// without any text.
    async fn complete(&self, prompt: &str) -> Result<Option<String>>;
}

/// Validates questions, asks the completion service, and records the exchange.
pub struct Assistant {
    client: Arc<dyn CompletionClient>,
    store: Arc<InteractionStore>,
}

impl Assistant {
    pub fn new(client: Arc<dyn CompletionClient>, store: Arc<InteractionStore>) -> Self {
        Self { client, store }
    }

    /// Answer a question and store it in the history.
    ///
    /// Blank questions are rejected before the service is called. If the
    /// service fails nothing is stored.
    pub async fn ask(&self, question: &str) -> Result<Interaction> {
        let question = question.trim();
        if question.is_empty() {
            return Err(CompanionError::EmptyQuestion);
        }

        tracing::debug!(target: "companion::assistant", "Asking completion service ({} chars)", question.len());

        let answer = match self.client.complete(question).await {
            Ok(Some(text)) if !text.trim().is_empty() => text,
            Ok(_) => EMPTY_COMPLETION_ANSWER.to_string(),
            Err(e) => {
                tracing::warn!(target: "companion::assistant", "Completion failed: {}", e);
                return Err(e);
            }
        };

        self.store.insert(question, &answer)
    }

    pub fn suggestions(&self) -> &'static [&'static str] {
        SUGGESTIONS
    }
}

/// Gemini client configuration.
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// Never print the key
impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Show only the last four characters of a credential.
pub fn mask_api_key(key: &str) -> String {
    let count = key.chars().count();
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = key.chars().skip(count - 4).collect();
    format!("****{}", tail)
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.is_empty() { None } else { Some(text) }
    }
}

/// [`CompletionClient`] for the Gemini `generateContent` REST API.
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CompanionError::Completion(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<Option<String>> {
        // The URL carries the key; log the model only
        tracing::debug!(target: "companion::assistant", "Sending request to model {}", self.config.model);

        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );
        let request = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| CompanionError::Completion(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CompanionError::Completion(e.without_url().to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {}", status));
            return Err(CompanionError::Completion(message));
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| CompanionError::Completion(format!("invalid response: {}", e)))?;
        Ok(parsed.text())
    }
}
