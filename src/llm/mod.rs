//! Text-generation integration.
//!
//! The [`LlmProvider`] trait hides the transport; the Anthropic
//! Messages API client is the one production backend. Providers are
//! created once and injected as `Arc<dyn LlmProvider>`.

pub mod anthropic;
pub mod provider;

pub use anthropic::AnthropicProvider;
pub use provider::{CompletionRequest, CompletionResponse, LlmProvider};

use std::sync::Arc;

use secrecy::SecretString;

use crate::error::LlmError;

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: SecretString,
    pub model: String,
    /// Override for tests; `None` uses the public endpoint.
    pub base_url: Option<String>,
}

/// Create the production provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let provider = AnthropicProvider::new(config)?;
    tracing::info!(model = %config.model, "Using Anthropic provider");
    Ok(Arc::new(provider))
}
