//! OpenAI chat completions over blocking HTTP.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use woodshu_engine::completion::{Completer, CompletionRequest};
use woodshu_engine::WorkflowError;

/// Request timeout. Critiques with a high-detail image can take a while.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Error from a completion call
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionError {
    /// API key not configured
    MissingKey,
    /// Network error
    Network(String),
    /// API error response
    Api { status: u16, message: String },
    /// Failed to parse response
    Parse(String),
    /// Provider returned unexpected format
    InvalidResponse(String),
}

impl std::fmt::Display for CompletionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionError::MissingKey => write!(f, "API key not configured"),
            CompletionError::Network(msg) => write!(f, "Network error: {}", msg),
            CompletionError::Api { status, message } => {
                write!(f, "API error ({}): {}", status, message)
            }
            CompletionError::Parse(msg) => write!(f, "Failed to parse response: {}", msg),
            CompletionError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

impl std::error::Error for CompletionError {}

impl From<CompletionError> for WorkflowError {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::MissingKey => WorkflowError::Configuration(err.to_string()),
            other => WorkflowError::Service(other.to_string()),
        }
    }
}

// ============================================================================
// OpenAI API types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: MessageContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    ImageUrl { image_url: ImageRef<'a> },
}

#[derive(Debug, Serialize)]
struct ImageRef<'a> {
    url: &'a str,
    detail: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Message list: system, then the image part (if any), then the user text.
fn build_request(request: &CompletionRequest) -> ChatRequest<'_> {
    let mut messages = vec![ChatMessage {
        role: "system",
        content: MessageContent::Text(&request.system),
    }];
    if let Some(url) = request.image_url.as_deref() {
        messages.push(ChatMessage {
            role: "user",
            content: MessageContent::Parts(vec![ContentPart::ImageUrl {
                image_url: ImageRef { url, detail: "high" },
            }]),
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: MessageContent::Text(&request.user),
    });

    ChatRequest {
        model: &request.params.model,
        messages,
        temperature: request.params.temperature,
        max_tokens: request.params.max_tokens,
    }
}

/// OpenAI-compatible client (blocking).
#[derive(Debug, Clone)]
pub struct OpenAIClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAIClient {
    /// `base_url` is the API root, e.g. `https://api.openai.com/v1`.
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, CompletionError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("woodshu/{}", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// One chat completion; returns the first choice's text.
    pub fn chat(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let api_key = self.api_key.as_deref().ok_or(CompletionError::MissingKey)?;
        let url = format!("{}/chat/completions", self.base_url);
        log::debug!(
            "POST {} model={} image={}",
            url,
            request.params.model,
            request.image_url.is_some()
        );

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&build_request(request))
            .send()
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            log::warn!("completion failed: HTTP {}: {}", status.as_u16(), message);
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .map_err(|e| CompletionError::Parse(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::InvalidResponse("No choices in response".to_string()))?
            .message
            .content
            .ok_or_else(|| CompletionError::InvalidResponse("Empty message content".to_string()))
    }
}

impl Completer for OpenAIClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, WorkflowError> {
        self.chat(request).map_err(WorkflowError::from)
    }
}
