//! LLM-backed analyzer.
//!
//! Builds one prompt from a sampled message set, invokes the
//! text-generation endpoint, and parses the structured result
//! defensively — model output is untrusted, possibly malformed input.
//! Parse failures degrade to a best-effort textual summary rather than
//! failing the request; only transport/quota failures are fatal.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::analysis::heuristic::DomainPolicy;
use crate::analysis::sampler;
use crate::analysis::types::{
    AnalysisMethod, AnalysisResult, DISPLAY_CAP, Message, ScoredMessage,
};
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::llm::{CompletionRequest, LlmProvider};

/// Fixed system framing for the analysis call.
const SYSTEM_PROMPT: &str =
    "You are a mail analysis assistant. You respond only with valid JSON, \
     no prose before or after it.";

/// Hard output-token ceiling for the analysis call.
const MAX_OUTPUT_TOKENS: u32 = 2048;

/// Per-message preview cap inside the prompt.
const PREVIEW_CAP: usize = 300;

/// Minimum provider-snippet length worth using as-is.
const SNIPPET_MIN: usize = 50;

/// Reason used when the model omits one.
const DEFAULT_REASON: &str = "Identified as important by the model";

/// Scorer/summarizer backed by an external text-generation model.
pub struct GenerativeAnalyzer {
    llm: Arc<dyn LlmProvider>,
    config: AnalysisConfig,
    policy: DomainPolicy,
}

/// Expected JSON shape of the model response. Every field defaulted —
/// the format is not contractually guaranteed.
#[derive(Debug, serde::Deserialize)]
struct ModelResponse {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    important_emails: Vec<ModelRankedItem>,
}

#[derive(Debug, serde::Deserialize)]
struct ModelRankedItem {
    /// 1-based index into the prompt's message ordering.
    #[serde(default)]
    email_index: i64,
    #[serde(default = "default_score")]
    importance_score: f64,
    #[serde(default)]
    reason: String,
}

fn default_score() -> f64 {
    0.5
}

impl GenerativeAnalyzer {
    pub fn new(llm: Arc<dyn LlmProvider>, config: AnalysisConfig, policy: DomainPolicy) -> Self {
        Self { llm, config, policy }
    }

    /// Analyze a message set; `method = generative`.
    ///
    /// Fails only on transport/quota errors from the endpoint.
    pub async fn analyze(&self, messages: &[Message]) -> Result<AnalysisResult, AnalysisError> {
        if messages.is_empty() {
            // Short-circuit without any external call.
            return Ok(AnalysisResult {
                summary: "No unread messages found.".to_string(),
                ranked_messages: Vec::new(),
                total_considered: 0,
                method: AnalysisMethod::Generative,
                generated_at: Utc::now(),
            });
        }

        let sampled = sampler::sample(messages, self.config.sampling_budget, &self.policy);
        let prompt = build_prompt(&sampled, messages.len());

        let request = CompletionRequest::new(prompt)
            .with_system(SYSTEM_PROMPT)
            .with_max_tokens(self.config.max_tokens.min(MAX_OUTPUT_TOKENS))
            .with_temperature(self.config.temperature);

        let response = self.llm.complete(request).await?;

        let (mut summary, ranked) = parse_response(&response.content, &sampled);

        if sampled.len() < messages.len() {
            // Let the caller tell "found in everything" apart from
            // "found in a prioritized subset".
            summary.push_str(&format!(
                " (Analyzed {} prioritized messages out of {} total.)",
                sampled.len(),
                messages.len()
            ));
        }

        Ok(AnalysisResult {
            summary,
            ranked_messages: ranked,
            total_considered: messages.len(),
            method: AnalysisMethod::Generative,
            generated_at: Utc::now(),
        })
    }
}

// ── Prompt construction ─────────────────────────────────────────────

/// Compact preview bounding prompt size independent of body length:
/// provider snippet when substantial, else the first non-blank body
/// lines, whitespace-collapsed and capped.
fn build_preview(msg: &Message) -> String {
    let raw = if msg.preview.len() > SNIPPET_MIN {
        msg.preview.clone()
    } else if msg.has_extractable_body() && !msg.body.trim().is_empty() {
        msg.body
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(3)
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        return "(No content available)".to_string();
    };

    let collapsed: String = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(PREVIEW_CAP).collect()
}

fn build_prompt(sampled: &[Message], total: usize) -> String {
    let mut entries = Vec::with_capacity(sampled.len());
    for (idx, msg) in sampled.iter().enumerate() {
        entries.push(format!(
            "Message {}:\nSubject: {}\nFrom: {} <{}>\nDate: {}\nPreview: {}",
            idx + 1,
            msg.subject,
            msg.sender_display_name,
            msg.sender_address,
            msg.received_at.format("%Y-%m-%d %H:%M:%S"),
            build_preview(msg),
        ));
    }

    let limit_note = if total > sampled.len() {
        format!(
            "\n\nNote: Analyzing {} prioritized messages out of {} total (most recent plus potentially important).",
            sampled.len(),
            total
        )
    } else {
        String::new()
    };

    format!(
        "Analyze the following {count} unread messages.\n\
         Each message shows: Subject, Sender, Date, and Preview.\n\n\
         {entries}{limit_note}\n\n\
         Provide:\n\
         1. A concise summary of all messages (2-3 sentences)\n\
         2. Up to 10 important messages with an importance score (0.0-1.0) and a short reason\n\n\
         Respond in JSON format:\n\
         {{\n\
           \"summary\": \"Your summary here\",\n\
           \"important_emails\": [\n\
             {{\"email_index\": 1, \"importance_score\": 0.85, \"reason\": \"Brief explanation\"}}\n\
           ]\n\
         }}\n\n\
         Consider messages important if they contain urgent or time-sensitive language, \
         require action or a response, come from work or professional contacts, or have \
         significant business implications.\n\n\
         Respond only with valid JSON.",
        count = sampled.len(),
        entries = entries.join("\n\n"),
    )
}

// ── Response parsing ────────────────────────────────────────────────

/// Strip a markdown code fence (with optional info string) wrapping
/// the payload. Unfenced input passes through trimmed.
fn strip_markdown_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info-string line ("json" etc.), then the closing fence.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    let rest = rest.trim_end();
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Parse the model response into (summary, ranked list).
///
/// JSON decode failure degrades to the raw text (truncated) as the
/// summary with an empty ranked list. Entries with indices outside the
/// sampled set are discarded; scores are clamped; missing reasons get
/// a placeholder.
fn parse_response(content: &str, sampled: &[Message]) -> (String, Vec<ScoredMessage>) {
    let json_text = strip_markdown_fence(content);

    let parsed: ModelResponse = match serde_json::from_str(json_text) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "Model response was not valid JSON, degrading to raw summary");
            let fallback = if content.trim().is_empty() {
                "Unable to parse analysis results.".to_string()
            } else {
                content.trim().chars().take(500).collect()
            };
            return (fallback, Vec::new());
        }
    };

    let summary = if parsed.summary.is_empty() {
        "No summary provided.".to_string()
    } else {
        parsed.summary
    };

    let mut ranked: Vec<ScoredMessage> = parsed
        .important_emails
        .into_iter()
        .filter_map(|item| {
            // Bounds check before any arithmetic: the index is untrusted
            // and may be any i64, including extremes that overflow.
            if item.email_index < 1 || item.email_index > sampled.len() as i64 {
                // Hallucinated index — drop silently.
                warn!(email_index = item.email_index, "Discarding out-of-range model index");
                return None;
            }
            let index = (item.email_index - 1) as usize;
            let reason = if item.reason.is_empty() {
                DEFAULT_REASON.to_string()
            } else {
                item.reason
            };
            Some(ScoredMessage::new(
                sampled[index].clone(),
                item.importance_score,
                reason,
            ))
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.importance_score
            .partial_cmp(&a.importance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(DISPLAY_CAP);

    (summary, ranked)
}
