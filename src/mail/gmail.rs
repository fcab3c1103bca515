//! Gmail REST connector.
//!
//! Speaks the provider's JSON API directly: one listing call per
//! analysis request plus one fetch per message, bearer-token auth,
//! bounded retry with backoff on transient failures. Token refresh is
//! the auth collaborator's job — this client only spends the token it
//! was given.

use std::time::Duration;

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::MailConfig;
use crate::error::MailError;
use crate::mail::MailProvider;
use crate::mail::types::{RawMessage, RawMessageList};

const DEFAULT_BASE_URL: &str = "https://gmail.googleapis.com/gmail/v1";

/// Fields filter keeps fetch payloads down to what normalization needs.
const MESSAGE_FIELDS: &str = "id,snippet,payload(headers,body,parts)";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Gmail REST [`MailProvider`] implementation.
pub struct GmailConnector {
    client: reqwest::Client,
    access_token: SecretString,
    base_url: String,
    max_results: u32,
}

impl GmailConnector {
    /// Build a connector from config.
    pub fn new(config: MailConfig) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(READ_TIMEOUT)
            .build()
            .map_err(|e| MailError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            access_token: config.access_token,
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            max_results: config.max_results,
        })
    }

    /// GET a JSON resource with bounded retry on 429/5xx/transport errors.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, MailError> {
        let mut backoff = INITIAL_BACKOFF;
        let mut last_failure = String::new();

        for attempt in 1..=MAX_ATTEMPTS {
            let response = self
                .client
                .get(url)
                .query(query)
                .bearer_auth(self.access_token.expose_secret())
                .send()
                .await;

            match response {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return resp
                            .json::<T>()
                            .await
                            .map_err(|e| MailError::Http(format!("invalid JSON body: {e}")));
                    }
                    if status.as_u16() == 429 || status.is_server_error() {
                        last_failure = format!("status {status}");
                    } else {
                        // 4xx other than 429 won't get better on retry.
                        return Err(MailError::Http(format!("request failed: status {status}")));
                    }
                }
                Err(e) => {
                    last_failure = e.to_string();
                }
            }

            if attempt < MAX_ATTEMPTS {
                debug!(attempt, failure = %last_failure, "Retrying provider request");
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
        }

        Err(MailError::Http(format!(
            "request failed after {MAX_ATTEMPTS} attempts: {last_failure}"
        )))
    }

    async fn list_unread_ids(&self, lookback_days: u32) -> Result<Vec<String>, MailError> {
        let start_date = Utc::now() - chrono::Duration::days(i64::from(lookback_days));
        let query = format!("is:unread after:{}", start_date.format("%Y/%m/%d"));

        let url = format!("{}/users/me/messages", self.base_url);
        let list: RawMessageList = self
            .get_json(
                &url,
                &[
                    ("q", query),
                    ("maxResults", self.max_results.to_string()),
                ],
            )
            .await
            .map_err(|e| MailError::ListFailed(e.to_string()))?;

        Ok(list.messages.into_iter().map(|m| m.id).collect())
    }

    async fn fetch_message(&self, id: &str) -> Result<RawMessage, MailError> {
        let url = format!("{}/users/me/messages/{}", self.base_url, id);
        self.get_json(
            &url,
            &[
                ("format", "full".to_string()),
                ("fields", MESSAGE_FIELDS.to_string()),
            ],
        )
        .await
        .map_err(|e| MailError::FetchFailed {
            id: id.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl MailProvider for GmailConnector {
    fn name(&self) -> &str {
        "gmail"
    }

    async fn fetch_unread(&self, lookback_days: u32) -> Result<Vec<RawMessage>, MailError> {
        let ids = self.list_unread_ids(lookback_days).await?;
        debug!(count = ids.len(), "Listed unread messages");

        let mut messages = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.fetch_message(id).await {
                Ok(msg) => messages.push(msg),
                Err(e) => {
                    // One bad fetch never aborts the batch.
                    warn!(id = %id, error = %e, "Skipping message that failed to fetch");
                }
            }
        }

        Ok(messages)
    }
}
