//! Anthropic Messages API client.
//!
//! One fixed-shape request per analysis: a single user message with
//! optional system framing, bounded output tokens and explicit
//! temperature. Transport policy (timeouts, bounded retry with
//! backoff) lives here so callers see a single async call.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::LlmError;
use crate::llm::LlmConfig;
use crate::llm::provider::{CompletionRequest, CompletionResponse, LlmProvider};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// [`LlmProvider`] backed by the Anthropic Messages API.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl AnthropicProvider {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(READ_TIMEOUT)
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: "anthropic".to_string(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    async fn send_once(&self, request: &CompletionRequest) -> Result<reqwest::Response, LlmError> {
        let mut body = json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
            "messages": [{"role": "user", "content": request.prompt}],
        });
        if let Some(system) = &request.system {
            body["system"] = json!(system);
        }

        self.client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: "anthropic".to_string(),
                reason: e.to_string(),
            })
    }
}

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let mut backoff = INITIAL_BACKOFF;
        let mut last_error = LlmError::RequestFailed {
            provider: "anthropic".to_string(),
            reason: "no attempts made".to_string(),
        };

        for attempt in 1..=MAX_ATTEMPTS {
            match self.send_once(&request).await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let parsed: MessagesResponse =
                            resp.json().await.map_err(|e| LlmError::InvalidResponse {
                                provider: "anthropic".to_string(),
                                reason: format!("invalid JSON body: {e}"),
                            })?;
                        let content = parsed
                            .content
                            .into_iter()
                            .find(|block| block.kind == "text")
                            .map(|block| block.text)
                            .ok_or_else(|| LlmError::InvalidResponse {
                                provider: "anthropic".to_string(),
                                reason: "no text content block".to_string(),
                            })?;
                        return Ok(CompletionResponse { content });
                    }

                    if status.as_u16() == 429 {
                        last_error = LlmError::RateLimited {
                            provider: "anthropic".to_string(),
                            retry_after: Some(backoff),
                        };
                    } else if status.is_server_error() {
                        last_error = LlmError::RequestFailed {
                            provider: "anthropic".to_string(),
                            reason: format!("status {status}"),
                        };
                    } else {
                        // Auth/validation failures won't improve on retry.
                        return Err(LlmError::RequestFailed {
                            provider: "anthropic".to_string(),
                            reason: format!("status {status}"),
                        });
                    }
                }
                Err(e) => last_error = e,
            }

            if attempt < MAX_ATTEMPTS {
                debug!(attempt, error = %last_error, "Retrying generation request");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
        }

        Err(last_error)
    }
}
