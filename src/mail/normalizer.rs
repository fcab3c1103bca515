//! Raw provider message → normalized [`Message`].
//!
//! Pure string/tree parsing, no I/O. Policy is lossy-but-available:
//! missing headers get placeholders, unparseable dates fall back to
//! processing time, undecodable parts become empty strings. The only
//! hard failure is a message with no payload object at all.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};

use crate::analysis::types::{Message, NO_CONTENT_PLACEHOLDER};
use crate::error::MailError;
use crate::mail::types::{RawMessage, RawPart};

/// Maximum part-tree depth visited during body extraction.
const MAX_PART_DEPTH: usize = 16;

/// Maximum total parts visited during body extraction.
const MAX_PART_COUNT: usize = 256;

/// Subject placeholder when the header is absent.
const NO_SUBJECT: &str = "(No Subject)";

/// Sender placeholder when the From header is absent.
const UNKNOWN_SENDER: &str = "Unknown";

/// Normalize one raw provider message into an immutable [`Message`].
///
/// Fails only when the message carries no payload object — everything
/// else degrades to placeholders so one odd message never aborts a
/// batch.
pub fn normalize(raw: &RawMessage) -> Result<Message, MailError> {
    let payload = raw.payload.as_ref().ok_or_else(|| MailError::MalformedMessage {
        id: raw.id.clone(),
        reason: "message has no payload".into(),
    })?;

    let subject = lookup_header(payload, "Subject")
        .unwrap_or(NO_SUBJECT)
        .to_string();
    let sender_full = lookup_header(payload, "From").unwrap_or(UNKNOWN_SENDER);
    let (sender_display_name, sender_address) = parse_sender(sender_full);

    let received_at = parse_timestamp(lookup_header(payload, "Date"));

    let body = extract_body(payload);

    Ok(Message {
        id: raw.id.clone(),
        subject,
        sender_display_name,
        sender_address,
        body,
        received_at,
        preview: raw.snippet.clone(),
    })
}

/// Case-insensitive header lookup on the root payload.
fn lookup_header<'a>(payload: &'a RawPart, name: &str) -> Option<&'a str> {
    payload
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// Split a combined `Display Name <address>` string into name/address.
///
/// When no display name is present the address doubles as the name.
fn parse_sender(sender_full: &str) -> (String, String) {
    let trimmed = sender_full.trim();

    if let (Some(open), Some(close)) = (trimmed.find('<'), trimmed.rfind('>'))
        && close > open
    {
        let address = trimmed[open + 1..close].trim().to_string();
        let name = trimmed[..open].trim().trim_matches('"').trim();
        if name.is_empty() {
            return (address.clone(), address);
        }
        return (name.to_string(), address);
    }

    // Bare address (or unparseable blob) serves as both.
    (trimmed.to_string(), trimmed.to_string())
}

/// Parse the RFC 2822 `Date` header, falling back to processing time.
fn parse_timestamp(date_str: Option<&str>) -> DateTime<Utc> {
    date_str
        .and_then(|s| DateTime::parse_from_rfc2822(s.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

/// Extract body text from the part tree.
///
/// Direct payload content wins outright. Otherwise the tree is walked
/// depth-first with an explicit stack (bounded by depth and part count
/// so adversarial nesting can't blow resources): the first non-empty
/// `text/plain` payload short-circuits, the first `text/html` payload
/// is kept as a fallback, every other MIME type is skipped.
fn extract_body(payload: &RawPart) -> String {
    if let Some(body) = &payload.body
        && let Some(data) = &body.data
    {
        let direct = decode_body_data(data);
        if !direct.is_empty() {
            return direct;
        }
    }

    let mut html_fallback: Option<String> = None;
    let mut visited = 0usize;
    // Reverse push keeps pop order equal to document order.
    let mut stack: Vec<(&RawPart, usize)> =
        payload.parts.iter().rev().map(|p| (p, 1)).collect();

    while let Some((part, depth)) = stack.pop() {
        visited += 1;
        if visited > MAX_PART_COUNT {
            tracing::warn!(limit = MAX_PART_COUNT, "Part-count guard hit during body extraction");
            break;
        }

        if depth < MAX_PART_DEPTH {
            for child in part.parts.iter().rev() {
                stack.push((child, depth + 1));
            }
        }

        let data = part.body.as_ref().and_then(|b| b.data.as_deref());
        let Some(data) = data else { continue };

        match part.mime_type.as_str() {
            "text/plain" => {
                let text = decode_body_data(data);
                if !text.is_empty() {
                    return text;
                }
            }
            "text/html" => {
                if html_fallback.is_none() {
                    let text = decode_body_data(data);
                    if !text.is_empty() {
                        html_fallback = Some(text);
                    }
                }
            }
            // Inline attachments and other representations are ignored.
            _ => {}
        }
    }

    html_fallback.unwrap_or_else(|| NO_CONTENT_PLACEHOLDER.to_string())
}

/// Decode a URL-safe base64 payload; failures yield an empty string.
fn decode_body_data(data: &str) -> String {
    let unpadded = data.trim_end_matches('=');
    match URL_SAFE_NO_PAD.decode(unpadded) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::types::{RawBody, RawHeader};

    fn encode(text: &str) -> String {
        URL_SAFE_NO_PAD.encode(text.as_bytes())
    }

    fn header(name: &str, value: &str) -> RawHeader {
        RawHeader {
            name: name.into(),
            value: value.into(),
        }
    }

    fn text_part(mime: &str, text: &str) -> RawPart {
        RawPart {
            mime_type: mime.into(),
            body: Some(RawBody {
                data: Some(encode(text)),
            }),
            ..Default::default()
        }
    }

    fn raw_with_parts(parts: Vec<RawPart>) -> RawMessage {
        RawMessage {
            id: "m1".into(),
            snippet: "preview text".into(),
            payload: Some(RawPart {
                mime_type: "multipart/alternative".into(),
                headers: vec![
                    header("Subject", "Quarterly report"),
                    header("From", "Alice Smith <alice@corp.example>"),
                    header("Date", "Mon, 13 Jul 2026 10:00:00 +0000"),
                ],
                parts,
                ..Default::default()
            }),
        }
    }

    // ── failure and placeholder behavior ────────────────────────────

    #[test]
    fn missing_payload_is_malformed() {
        let raw = RawMessage {
            id: "broken".into(),
            ..Default::default()
        };
        let err = normalize(&raw).unwrap_err();
        assert!(matches!(err, MailError::MalformedMessage { ref id, .. } if id == "broken"));
    }

    #[test]
    fn missing_headers_get_placeholders() {
        let raw = RawMessage {
            id: "m1".into(),
            payload: Some(RawPart::default()),
            ..Default::default()
        };
        let msg = normalize(&raw).unwrap();
        assert_eq!(msg.subject, "(No Subject)");
        assert_eq!(msg.sender_display_name, "Unknown");
        assert_eq!(msg.sender_address, "Unknown");
        assert_eq!(msg.body, NO_CONTENT_PLACEHOLDER);
        assert!(!msg.has_extractable_body());
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let raw = RawMessage {
            id: "m1".into(),
            payload: Some(RawPart {
                headers: vec![header("subject", "lower"), header("FROM", "x@y.z")],
                ..Default::default()
            }),
            ..Default::default()
        };
        let msg = normalize(&raw).unwrap();
        assert_eq!(msg.subject, "lower");
        assert_eq!(msg.sender_address, "x@y.z");
    }

    // ── sender parsing ──────────────────────────────────────────────

    #[test]
    fn sender_splits_name_and_address() {
        let (name, addr) = parse_sender("Alice Smith <alice@corp.example>");
        assert_eq!(name, "Alice Smith");
        assert_eq!(addr, "alice@corp.example");
    }

    #[test]
    fn sender_quoted_name_unwrapped() {
        let (name, addr) = parse_sender("\"Smith, Alice\" <alice@corp.example>");
        assert_eq!(name, "Smith, Alice");
        assert_eq!(addr, "alice@corp.example");
    }

    #[test]
    fn bare_address_doubles_as_name() {
        let (name, addr) = parse_sender("bob@example.com");
        assert_eq!(name, "bob@example.com");
        assert_eq!(addr, "bob@example.com");
    }

    #[test]
    fn bracket_only_sender_uses_address() {
        let (name, addr) = parse_sender("<carol@example.com>");
        assert_eq!(name, "carol@example.com");
        assert_eq!(addr, "carol@example.com");
    }

    // ── timestamp parsing ───────────────────────────────────────────

    #[test]
    fn rfc2822_date_parsed() {
        let ts = parse_timestamp(Some("Mon, 13 Jul 2026 10:00:00 +0200"));
        assert_eq!(ts.to_rfc3339(), "2026-07-13T08:00:00+00:00");
    }

    #[test]
    fn bad_date_falls_back_to_now() {
        let before = Utc::now();
        let ts = parse_timestamp(Some("not a date"));
        assert!(ts >= before);
    }

    // ── body extraction ─────────────────────────────────────────────

    #[test]
    fn plain_text_preferred_over_html() {
        let raw = raw_with_parts(vec![
            text_part("text/html", "<b>rich</b>"),
            text_part("text/plain", "plain wins"),
        ]);
        let msg = normalize(&raw).unwrap();
        assert_eq!(msg.body, "plain wins");
    }

    #[test]
    fn html_only_body_is_retained() {
        let raw = raw_with_parts(vec![text_part("text/html", "<p>only html</p>")]);
        let msg = normalize(&raw).unwrap();
        assert_eq!(msg.body, "<p>only html</p>");
        assert!(msg.has_extractable_body());
    }

    #[test]
    fn direct_payload_body_wins() {
        let mut raw = raw_with_parts(vec![text_part("text/plain", "nested")]);
        raw.payload.as_mut().unwrap().body = Some(RawBody {
            data: Some(encode("direct content")),
        });
        let msg = normalize(&raw).unwrap();
        assert_eq!(msg.body, "direct content");
    }

    #[test]
    fn nested_plain_text_found() {
        let inner = RawPart {
            mime_type: "multipart/alternative".into(),
            parts: vec![
                text_part("text/html", "<i>inner html</i>"),
                text_part("text/plain", "deep plain"),
            ],
            ..Default::default()
        };
        let raw = raw_with_parts(vec![
            RawPart {
                mime_type: "multipart/mixed".into(),
                parts: vec![inner],
                ..Default::default()
            },
            text_part("image/png", "binarydata"),
        ]);
        let msg = normalize(&raw).unwrap();
        assert_eq!(msg.body, "deep plain");
    }

    #[test]
    fn attachment_parts_ignored() {
        let raw = raw_with_parts(vec![
            text_part("application/pdf", "%PDF-1.7"),
            text_part("image/jpeg", "jpegbytes"),
        ]);
        let msg = normalize(&raw).unwrap();
        assert_eq!(msg.body, NO_CONTENT_PLACEHOLDER);
    }

    #[test]
    fn undecodable_part_becomes_empty() {
        let raw = raw_with_parts(vec![RawPart {
            mime_type: "text/plain".into(),
            body: Some(RawBody {
                data: Some("!!!not-base64!!!".into()),
            }),
            ..Default::default()
        }]);
        let msg = normalize(&raw).unwrap();
        // Decode failure degrades to the placeholder, not an error.
        assert_eq!(msg.body, NO_CONTENT_PLACEHOLDER);
    }

    #[test]
    fn padded_base64_accepted() {
        let padded = base64::engine::general_purpose::URL_SAFE.encode("padded body");
        assert!(padded.ends_with('='));
        let raw = raw_with_parts(vec![RawPart {
            mime_type: "text/plain".into(),
            body: Some(RawBody { data: Some(padded) }),
            ..Default::default()
        }]);
        let msg = normalize(&raw).unwrap();
        assert_eq!(msg.body, "padded body");
    }

    #[test]
    fn depth_guard_bounds_hostile_nesting() {
        // Plain text buried below the depth guard must not be reached.
        let mut part = text_part("text/plain", "too deep");
        for _ in 0..32 {
            part = RawPart {
                mime_type: "multipart/mixed".into(),
                parts: vec![part],
                ..Default::default()
            };
        }
        let raw = raw_with_parts(vec![part]);
        let msg = normalize(&raw).unwrap();
        assert_eq!(msg.body, NO_CONTENT_PLACEHOLDER);
    }

    #[test]
    fn normalization_is_idempotent() {
        let raw = raw_with_parts(vec![text_part("text/plain", "stable")]);
        let a = normalize(&raw).unwrap();
        let b = normalize(&raw).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn preview_and_id_carried_through() {
        let raw = raw_with_parts(vec![text_part("text/plain", "body")]);
        let msg = normalize(&raw).unwrap();
        assert_eq!(msg.id, "m1");
        assert_eq!(msg.preview, "preview text");
        assert_eq!(msg.received_at.to_rfc3339(), "2026-07-13T10:00:00+00:00");
    }
}
