//! Output sanitization.
//!
//! Every string that leaves the pipeline passes through here: control
//! characters stripped, newlines normalized, runaway whitespace
//! collapsed, and each field bounded so a single pathological message
//! cannot bloat the event stream.

use std::sync::LazyLock;

use regex::Regex;

use crate::analysis::types::AnalysisResult;

pub const MAX_SUMMARY_LEN: usize = 1000;
pub const MAX_SUBJECT_LEN: usize = 500;
pub const MAX_SENDER_LEN: usize = 200;
pub const MAX_BODY_LEN: usize = 5000;
pub const MAX_REASON_LEN: usize = 500;
pub const MAX_PREVIEW_LEN: usize = 500;
pub const MAX_ERROR_LEN: usize = 500;

/// Control characters other than tab and newline. Carriage returns are
/// normalized away before this runs.
static CONTROL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap());

static EXCESS_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Clean one text field and bound its length. Truncation appends an
/// ellipsis marker so readers can tell a cut field from a short one.
pub fn sanitize_text(text: &str, max_len: usize) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let stripped = CONTROL_CHARS.replace_all(&normalized, "");
    let collapsed = EXCESS_NEWLINES.replace_all(&stripped, "\n\n");
    let trimmed = collapsed.trim();

    if trimmed.chars().count() <= max_len {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(max_len).collect();
    out.push_str("...");
    out
}

/// Sanitize every outward-facing field of a result in place.
pub fn sanitize_result(mut result: AnalysisResult) -> AnalysisResult {
    result.summary = sanitize_text(&result.summary, MAX_SUMMARY_LEN);
    for scored in &mut result.ranked_messages {
        let msg = &mut scored.message;
        msg.subject = sanitize_text(&msg.subject, MAX_SUBJECT_LEN);
        msg.sender_display_name = sanitize_text(&msg.sender_display_name, MAX_SENDER_LEN);
        msg.sender_address = sanitize_text(&msg.sender_address, MAX_SENDER_LEN);
        msg.body = sanitize_text(&msg.body, MAX_BODY_LEN);
        msg.preview = sanitize_text(&msg.preview, MAX_PREVIEW_LEN);
        scored.reason = sanitize_text(&scored.reason, MAX_REASON_LEN);
    }
    result
}
