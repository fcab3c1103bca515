//! Provider-agnostic completion interface.

use async_trait::async_trait;

use crate::error::LlmError;

/// A single completion request: fixed system framing plus one user
/// prompt, with bounded output and explicit sampling temperature.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            max_tokens: 1024,
            temperature: 0.2,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// Completion output. The content is untrusted text — callers must
/// parse defensively.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
}

/// Trait for text-generation backends.
///
/// Transport concerns (timeouts, retry, quota) live behind this trait;
/// callers see one bounded async call.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Model identifier for logging.
    fn model_name(&self) -> &str;

    /// Run one completion.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}
