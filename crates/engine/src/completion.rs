//! Seam between the page workflow and the chat-completion backend.

use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;

/// Default model for every use case.
pub const DEFAULT_MODEL: &str = "gpt-4-turbo";

/// Per-use-case request parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub model: String,
    /// Sampling temperature in `[0, 1]`; `None` leaves the provider default.
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

impl ModelParams {
    /// Carving critique: long answers, provider-default temperature.
    pub fn critique() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
            max_tokens: Some(2000),
        }
    }

    /// Project suggestion: low temperature for focused plans.
    pub fn project() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: Some(0.2),
            max_tokens: None,
        }
    }

    /// Wood lookup: lowest temperature, the answer follows a fixed format.
    pub fn material() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: Some(0.15),
            max_tokens: None,
        }
    }

    /// Clamp temperature into `[0, 1]`.
    pub fn normalized(mut self) -> Self {
        self.temperature = self.temperature.map(|t| t.clamp(0.0, 1.0));
        self
    }
}

/// One chat completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    /// Image reference sent as a high-detail `image_url` part.
    pub image_url: Option<String>,
    pub params: ModelParams,
}

/// Anything that can answer a completion request.
///
/// Implementations must check their credential before any network traffic
/// and report its absence as `WorkflowError::Configuration`. Transport and
/// provider failures map to `WorkflowError::Service`. No retries.
pub trait Completer {
    fn complete(&self, request: &CompletionRequest) -> Result<String, WorkflowError>;
}

impl<C: Completer + ?Sized> Completer for &C {
    fn complete(&self, request: &CompletionRequest) -> Result<String, WorkflowError> {
        (**self).complete(request)
    }
}
