//! Shared types for the analysis pipeline.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Placeholder body for messages whose content could not be extracted.
///
/// Distinguishable from a genuinely empty body — see
/// [`Message::has_extractable_body`].
pub const NO_CONTENT_PLACEHOLDER: &str = "(no content)";

/// Maximum number of ranked messages any analyzer may return.
pub const DISPLAY_CAP: usize = 20;

// ── Normalized message ──────────────────────────────────────────────

/// Normalized, flattened representation of one provider mail item.
///
/// Constructed only by the normalizer and never mutated downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Provider-unique identifier.
    pub id: String,
    /// Subject line (placeholder when the header is missing).
    pub subject: String,
    /// Human-readable sender name; falls back to the address.
    pub sender_display_name: String,
    /// Sender email address.
    pub sender_address: String,
    /// Plain-text body, HTML retained as fallback only.
    pub body: String,
    /// When the message was received (processing time if unparseable).
    pub received_at: DateTime<Utc>,
    /// Short provider-supplied excerpt.
    pub preview: String,
}

impl Message {
    /// Whether body extraction actually produced content.
    ///
    /// `false` means the normalizer substituted the no-content
    /// placeholder because no text part could be decoded.
    pub fn has_extractable_body(&self) -> bool {
        self.body != NO_CONTENT_PLACEHOLDER
    }
}

// ── Scored message ──────────────────────────────────────────────────

/// A message flagged as important by an analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredMessage {
    pub message: Message,
    /// Importance in [0.0, 1.0]; clamped at construction.
    pub importance_score: f64,
    /// Short human-readable explanation.
    pub reason: String,
}

impl ScoredMessage {
    /// Create a scored message, clamping the score into [0.0, 1.0].
    pub fn new(message: Message, importance_score: f64, reason: String) -> Self {
        Self {
            message,
            importance_score: importance_score.clamp(0.0, 1.0),
            reason,
        }
    }
}

// ── Analysis method ─────────────────────────────────────────────────

/// Which scoring/summarization strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMethod {
    /// Deterministic rule-based scoring, no external calls.
    Heuristic,
    /// External text-generation model.
    Generative,
}

impl AnalysisMethod {
    /// Short label for logging and result tagging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Heuristic => "heuristic",
            Self::Generative => "generative",
        }
    }
}

impl FromStr for AnalysisMethod {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heuristic" => Ok(Self::Heuristic),
            "generative" => Ok(Self::Generative),
            other => Err(AnalysisError::UnsupportedMethod(other.to_string())),
        }
    }
}

// ── Analysis result ─────────────────────────────────────────────────

/// Complete output of one analysis invocation.
///
/// Produced exactly once per request — either a full result or a
/// terminal error, never a partial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Narrative summary of the whole input set.
    pub summary: String,
    /// Important messages, descending by score, at most [`DISPLAY_CAP`].
    pub ranked_messages: Vec<ScoredMessage>,
    /// Count of the full input set, not the sampled subset.
    pub total_considered: usize,
    pub method: AnalysisMethod,
    pub generated_at: DateTime<Utc>,
}
