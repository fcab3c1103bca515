//! Deterministic rule-based analyzer.
//!
//! Scores every message from three bounded components (keywords,
//! sender domain, body length) and builds an extractive summary from
//! sender and keyword frequencies. No external calls; identical input
//! yields byte-identical output.

use chrono::Utc;

use crate::analysis::types::{
    AnalysisMethod, AnalysisResult, DISPLAY_CAP, Message, ScoredMessage,
};

/// Keywords that indicate urgency or required action.
pub const IMPORTANCE_KEYWORDS: &[&str] = &[
    "urgent",
    "deadline",
    "asap",
    "critical",
    "priority",
    "action required",
    "time sensitive",
    "immediate",
    "emergency",
    "attention",
    "required",
    "respond",
    "reply",
    "confirm",
    "approval",
];

/// Score above which a message is flagged as important.
const IMPORTANCE_THRESHOLD: f64 = 0.5;

/// Basic English stopwords filtered out of theme extraction.
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was",
    "one", "our", "out", "has", "have", "been", "being", "were", "this", "that", "these", "those",
    "with", "will", "would", "could", "should", "from", "they", "them", "their", "there", "then",
    "than", "what", "which", "when", "where", "who", "whom", "your", "yours", "about", "into",
    "through", "during", "before", "after", "above", "below", "over", "under", "again", "further",
    "once", "here", "because", "until", "while", "against", "between", "does", "did", "doing",
    "his", "him", "she", "hers", "its", "itself", "ours", "some", "such", "only", "own", "same",
    "too", "very", "just", "also", "each", "few", "how", "more", "most", "other",
];

// ── Domain policy ───────────────────────────────────────────────────

/// Replaceable sender-domain classification table.
///
/// The work-marker list is a coarse heuristic, kept as data rather
/// than logic so callers can substitute a better one.
#[derive(Debug, Clone)]
pub struct DomainPolicy {
    /// Substrings of the sender address that suggest a work sender.
    pub work_markers: Vec<String>,
    /// Well-known personal webmail domains.
    pub personal_domains: Vec<String>,
}

impl Default for DomainPolicy {
    fn default() -> Self {
        Self {
            work_markers: ["company", "corp", "work", "office", "business", "enterprise"]
                .into_iter()
                .map(String::from)
                .collect(),
            personal_domains: ["gmail.com", "yahoo.com", "hotmail.com", "outlook.com"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl DomainPolicy {
    /// Whether the address matches a work indicator.
    pub fn is_work(&self, address: &str) -> bool {
        let lower = address.to_lowercase();
        self.work_markers.iter().any(|m| lower.contains(m))
    }

    /// Whether the address belongs to a known personal webmail domain.
    pub fn is_personal(&self, address: &str) -> bool {
        let lower = address.to_lowercase();
        self.personal_domains.iter().any(|d| lower.contains(d))
    }
}

// ── Analyzer ────────────────────────────────────────────────────────

/// Deterministic scorer/summarizer requiring no external service.
#[derive(Debug, Clone, Default)]
pub struct HeuristicAnalyzer {
    policy: DomainPolicy,
}

impl HeuristicAnalyzer {
    pub fn new(policy: DomainPolicy) -> Self {
        Self { policy }
    }

    /// Analyze a message set. Deterministic; `method = heuristic`.
    pub fn analyze(&self, messages: &[Message]) -> AnalysisResult {
        if messages.is_empty() {
            return AnalysisResult {
                summary: "No unread messages found.".to_string(),
                ranked_messages: Vec::new(),
                total_considered: 0,
                method: AnalysisMethod::Heuristic,
                generated_at: Utc::now(),
            };
        }

        let mut ranked: Vec<ScoredMessage> = messages
            .iter()
            .filter_map(|msg| {
                let score = self.importance_score(msg);
                (score > IMPORTANCE_THRESHOLD).then(|| {
                    let reason = self.importance_reason(msg, score);
                    ScoredMessage::new(msg.clone(), score, reason)
                })
            })
            .collect();

        // Stable sort keeps input order among equal scores.
        ranked.sort_by(|a, b| {
            b.importance_score
                .partial_cmp(&a.importance_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(DISPLAY_CAP);

        AnalysisResult {
            summary: self.summarize(messages),
            ranked_messages: ranked,
            total_considered: messages.len(),
            method: AnalysisMethod::Heuristic,
            generated_at: Utc::now(),
        }
    }

    /// Sum of three independently bounded components, clamped to [0, 1].
    fn importance_score(&self, msg: &Message) -> f64 {
        let full_text = format!("{} {}", msg.subject, msg.body).to_lowercase();

        // Keyword component: 0.15 per distinct match, capped at 0.5.
        let keyword_matches = IMPORTANCE_KEYWORDS
            .iter()
            .filter(|kw| full_text.contains(*kw))
            .count();
        let keyword_score = (keyword_matches as f64 * 0.15).min(0.5);

        // Sender-domain component.
        let domain_score = if self.policy.is_work(&msg.sender_address) {
            0.3
        } else if !self.policy.is_personal(&msg.sender_address) {
            // Unknown domain, might be work-related.
            0.15
        } else {
            0.0
        };

        // Length component: highest threshold met wins.
        let length_score = match msg.body.len() {
            len if len > 1000 => 0.2,
            len if len > 500 => 0.15,
            len if len > 200 => 0.1,
            len if len > 50 => 0.05,
            _ => 0.0,
        };

        (keyword_score + domain_score + length_score).clamp(0.0, 1.0)
    }

    /// Human-readable explanation of which components fired.
    fn importance_reason(&self, msg: &Message, score: f64) -> String {
        let mut reasons = Vec::new();

        let full_text = format!("{} {}", msg.subject, msg.body).to_lowercase();
        let found: Vec<&str> = IMPORTANCE_KEYWORDS
            .iter()
            .filter(|kw| full_text.contains(*kw))
            .take(3)
            .copied()
            .collect();
        if !found.is_empty() {
            reasons.push(format!("Contains keywords: {}", found.join(", ")));
        }

        if self.policy.is_work(&msg.sender_address) {
            reasons.push("From work-related domain".to_string());
        }

        if msg.body.len() > 1000 {
            reasons.push("Substantial content length".to_string());
        }

        if reasons.is_empty() {
            // Shouldn't happen given the formula, kept for robustness.
            reasons.push(format!("Importance score: {score:.2}"));
        }

        reasons.join("; ")
    }

    /// Extractive summary over the full input set.
    fn summarize(&self, messages: &[Message]) -> String {
        let total = messages.len();

        let mut all_keywords = Vec::new();
        for msg in messages {
            let text = format!("{} {}", msg.subject, msg.body);
            all_keywords.extend(extract_keywords(&text));
        }
        let themes = top_by_frequency(all_keywords.into_iter(), 5);

        let senders: Vec<String> = messages
            .iter()
            .map(|m| m.sender_display_name.clone())
            .collect();
        let distinct_senders = {
            let mut seen = Vec::new();
            for s in &senders {
                if !seen.contains(s) {
                    seen.push(s.clone());
                }
            }
            seen.len()
        };
        let top_senders = top_by_frequency(senders.into_iter(), 3);

        let mut parts = vec![format!(
            "You have {} unread message{} from {} sender{}.",
            total,
            plural(total),
            distinct_senders,
            plural(distinct_senders)
        )];

        if !top_senders.is_empty() {
            parts.push(format!("Most messages are from: {}.", top_senders.join(", ")));
        }
        if !themes.is_empty() {
            parts.push(format!("Common themes include: {}.", themes.join(", ")));
        }

        let now = Utc::now();
        let recent = messages
            .iter()
            .filter(|m| now.signed_duration_since(m.received_at).num_days() < 1)
            .count();
        if recent > 0 {
            parts.push(format!(
                "{} message{} received in the last 24 hours.",
                recent,
                plural(recent)
            ));
        }

        parts.join(" ")
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Stopword-filtered alphabetic tokens (len > 2), top 10 by frequency.
fn extract_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let tokens = lower
        .split(|c: char| !c.is_alphabetic())
        .filter(|t| t.len() > 2 && !STOPWORDS.contains(t))
        .map(String::from);
    top_by_frequency(tokens, 10)
}

/// Top-k items by frequency; ties broken by first appearance so the
/// output is deterministic for identical input.
fn top_by_frequency(items: impl Iterator<Item = String>, k: usize) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(s, _)| *s == item) {
            Some(entry) => entry.1 += 1,
            None => counts.push((item, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(k).map(|(s, _)| s).collect()
}
