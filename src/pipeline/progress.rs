//! Staged analysis pipeline with progress reporting.
//!
//! Consumers watch a long-running analysis through a stream of typed
//! events rather than waiting on one opaque future. Event order is
//! fixed: connecting, retrieving, retrieved, analyzing, then exactly
//! one terminal event (complete or error). All outward-facing text is
//! sanitized before it reaches the stream.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, warn};

use crate::analysis::AnalysisEngine;
use crate::analysis::types::{AnalysisMethod, AnalysisResult, Message};
use crate::error::PipelineError;
use crate::mail::{MailProvider, normalizer};
use crate::pipeline::sanitize::{MAX_ERROR_LEN, sanitize_result, sanitize_text};

pub const MIN_LOOKBACK_DAYS: i64 = 1;
pub const MAX_LOOKBACK_DAYS: i64 = 365;

const CHANNEL_CAPACITY: usize = 16;

/// One analysis run: how far back to look and which analyzer to use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub lookback_days: i64,
    pub method: AnalysisMethod,
}

impl AnalysisRequest {
    /// Reject out-of-range lookbacks before any external call is made.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !(MIN_LOOKBACK_DAYS..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
            return Err(PipelineError::InvalidLookback {
                days: self.lookback_days,
            });
        }
        Ok(())
    }
}

/// Progress events, tagged by step for the wire format. Every event
/// carries a short human-readable message alongside its payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "lowercase")]
pub enum ProgressEvent {
    Connecting { message: String },
    Retrieving { message: String },
    Retrieved { count: usize, message: String },
    Analyzing { message: String },
    Complete { result: AnalysisResult, message: String },
    Error { message: String },
}

impl ProgressEvent {
    fn connecting() -> Self {
        Self::Connecting {
            message: "Connecting to mail provider...".to_string(),
        }
    }

    fn retrieving() -> Self {
        Self::Retrieving {
            message: "Retrieving unread messages...".to_string(),
        }
    }

    fn retrieved(count: usize) -> Self {
        Self::Retrieved {
            count,
            message: format!("Found {count} unread message(s)"),
        }
    }

    fn analyzing() -> Self {
        Self::Analyzing {
            message: "Analyzing messages...".to_string(),
        }
    }

    fn complete(result: AnalysisResult) -> Self {
        Self::Complete {
            result,
            message: "Analysis complete".to_string(),
        }
    }
}

/// Orchestrates retrieval, normalization, and analysis behind a
/// progress stream.
pub struct InsightPipeline {
    mail: Arc<dyn MailProvider>,
    engine: Arc<AnalysisEngine>,
}

impl InsightPipeline {
    pub fn new(mail: Arc<dyn MailProvider>, engine: AnalysisEngine) -> Self {
        Self {
            mail,
            engine: Arc::new(engine),
        }
    }

    /// Start one analysis run.
    ///
    /// Invalid requests fail here, before any provider is contacted.
    /// Failures after that point arrive as a terminal error event on
    /// the stream; internal error detail stays in the logs.
    pub fn run(
        &self,
        request: AnalysisRequest,
    ) -> Result<ReceiverStream<ProgressEvent>, PipelineError> {
        request.validate()?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let mail = Arc::clone(&self.mail);
        let engine = Arc::clone(&self.engine);

        tokio::spawn(async move {
            // A send failure means the consumer went away; stop quietly.
            macro_rules! emit {
                ($event:expr) => {
                    if tx.send($event).await.is_err() {
                        return;
                    }
                };
            }

            emit!(ProgressEvent::connecting());
            emit!(ProgressEvent::retrieving());

            let raw = match mail.fetch_unread(request.lookback_days as u32).await {
                Ok(raw) => raw,
                Err(e) => {
                    error!(provider = mail.name(), error = %e, "Message retrieval failed");
                    emit!(error_event("Failed to retrieve unread messages"));
                    return;
                }
            };

            let mut messages: Vec<Message> = raw
                .iter()
                .filter_map(|raw| match normalizer::normalize(raw) {
                    Ok(msg) => Some(msg),
                    Err(e) => {
                        warn!(error = %e, "Skipping unreadable message");
                        None
                    }
                })
                .collect();
            messages.sort_by(|a, b| b.received_at.cmp(&a.received_at));

            emit!(ProgressEvent::retrieved(messages.len()));
            emit!(ProgressEvent::analyzing());

            match engine.analyze(&messages, request.method).await {
                Ok(result) => {
                    info!(
                        method = result.method.label(),
                        total = result.total_considered,
                        ranked = result.ranked_messages.len(),
                        "Analysis complete"
                    );
                    emit!(ProgressEvent::complete(sanitize_result(result)));
                }
                Err(e) => {
                    error!(error = %e, "Analysis failed");
                    emit!(error_event("Analysis failed"));
                }
            }
        });

        Ok(ReceiverStream::new(rx))
    }
}

fn error_event(message: &str) -> ProgressEvent {
    ProgressEvent::Error {
        message: sanitize_text(message, MAX_ERROR_LEN),
    }
}
