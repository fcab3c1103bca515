//! Relevance-aware sampling under a budget.
//!
//! Naive truncation would silently drop important-but-older messages,
//! while running the full analyzer twice (once to sample, once to
//! score) is too costly on large inboxes. The sampler splits the
//! budget: half goes to the most recent tier, the rest to the
//! highest-scoring remainder under a deliberately coarse heuristic.

use crate::analysis::heuristic::{DomainPolicy, IMPORTANCE_KEYWORDS};
use crate::analysis::types::Message;

/// Extra signals worth catching at sampling time even though the full
/// analyzer doesn't score them.
const SAMPLING_EXTRA_KEYWORDS: &[&str] = &[
    "meeting", "interview", "offer", "contract", "invoice", "payment",
];

/// Select at most `budget` messages from `messages` (assumed sorted
/// most recent first). Returns the input unchanged when it fits.
pub fn sample(messages: &[Message], budget: usize, policy: &DomainPolicy) -> Vec<Message> {
    if messages.len() <= budget {
        return messages.to_vec();
    }

    let recent_count = budget.div_ceil(2).min(budget);
    let mut selected: Vec<Message> = messages[..recent_count].to_vec();
    let remaining_slots = budget - recent_count;
    if remaining_slots == 0 {
        return selected;
    }

    let mut scored: Vec<(i32, &Message)> = messages[recent_count..]
        .iter()
        .map(|msg| (coarse_score(msg, policy), msg))
        .collect();
    // Stable sort: ties keep original (recency) order.
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    selected.extend(scored.into_iter().take(remaining_slots).map(|(_, m)| m.clone()));
    selected
}

/// Cheap integer score — subject + preview only, no body scan beyond
/// a length check. Intentionally coarser than the full analyzers.
fn coarse_score(msg: &Message, policy: &DomainPolicy) -> i32 {
    let text = format!("{} {}", msg.subject, msg.preview).to_lowercase();

    let mut score = 0;
    for keyword in IMPORTANCE_KEYWORDS.iter().chain(SAMPLING_EXTRA_KEYWORDS) {
        if text.contains(keyword) {
            score += 1;
        }
    }

    if !policy.is_personal(&msg.sender_address) {
        score += 2;
    }

    if msg.body.len() > 1000 {
        score += 1;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    /// Build a recency-sorted inbox; index 0 is the newest message.
    fn make_inbox(specs: &[(&str, &str)]) -> Vec<Message> {
        let now = Utc::now();
        specs
            .iter()
            .enumerate()
            .map(|(i, (id, subject))| Message {
                id: (*id).to_string(),
                subject: (*subject).to_string(),
                sender_display_name: "Friend".into(),
                sender_address: "friend@gmail.com".into(),
                body: "short note".into(),
                received_at: now - Duration::hours(i as i64),
                preview: (*subject).to_string(),
            })
            .collect()
    }

    #[test]
    fn small_input_returned_unchanged() {
        let policy = DomainPolicy::default();
        let inbox = make_inbox(&[("a", "one"), ("b", "two")]);
        let sampled = sample(&inbox, 50, &policy);
        assert_eq!(sampled.len(), 2);
        assert_eq!(sampled[0].id, "a");
    }

    #[test]
    fn input_exactly_at_budget_returned_unchanged() {
        let policy = DomainPolicy::default();
        let inbox = make_inbox(&[("a", "one"), ("b", "two"), ("c", "three")]);
        assert_eq!(sample(&inbox, 3, &policy).len(), 3);
    }

    #[test]
    fn oversized_input_bounded_by_budget() {
        let policy = DomainPolicy::default();
        let specs: Vec<(String, String)> = (0..80)
            .map(|i| (format!("m{i}"), "nothing special".to_string()))
            .collect();
        let refs: Vec<(&str, &str)> = specs
            .iter()
            .map(|(a, b)| (a.as_str(), b.as_str()))
            .collect();
        let inbox = make_inbox(&refs);
        assert_eq!(sample(&inbox, 50, &policy).len(), 50);
    }

    #[test]
    fn urgent_old_messages_survive_sampling() {
        // 60 messages: the 10 oldest say "urgent", the rest are noise.
        // With budget 50 every urgent message must be retained in
        // addition to the recent tier.
        let policy = DomainPolicy::default();
        let specs: Vec<(String, String)> = (0..60)
            .map(|i| {
                let subject = if i >= 50 {
                    "urgent: please respond".to_string()
                } else {
                    "newsletter weekly digest".to_string()
                };
                (format!("m{i}"), subject)
            })
            .collect();
        let refs: Vec<(&str, &str)> = specs
            .iter()
            .map(|(a, b)| (a.as_str(), b.as_str()))
            .collect();
        let inbox = make_inbox(&refs);

        let sampled = sample(&inbox, 50, &policy);
        assert_eq!(sampled.len(), 50);
        for i in 50..60 {
            let id = format!("m{i}");
            assert!(
                sampled.iter().any(|m| m.id == id),
                "urgent message {id} was dropped"
            );
        }
    }

    #[test]
    fn recent_tier_always_included() {
        let policy = DomainPolicy::default();
        let specs: Vec<(String, String)> = (0..100)
            .map(|i| (format!("m{i}"), "plain".to_string()))
            .collect();
        let refs: Vec<(&str, &str)> = specs
            .iter()
            .map(|(a, b)| (a.as_str(), b.as_str()))
            .collect();
        let inbox = make_inbox(&refs);

        let sampled = sample(&inbox, 40, &policy);
        // First 20 slots are the newest 20 messages, in order.
        for i in 0..20 {
            assert_eq!(sampled[i].id, format!("m{i}"));
        }
    }

    #[test]
    fn remainder_ties_keep_recency_order() {
        let policy = DomainPolicy::default();
        let specs: Vec<(String, String)> = (0..10)
            .map(|i| (format!("m{i}"), "plain".to_string()))
            .collect();
        let refs: Vec<(&str, &str)> = specs
            .iter()
            .map(|(a, b)| (a.as_str(), b.as_str()))
            .collect();
        let inbox = make_inbox(&refs);

        let sampled = sample(&inbox, 6, &policy);
        // Recent tier m0-m2, then the remainder all tie at the same
        // score so the next most recent fill the rest.
        let ids: Vec<&str> = sampled.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m0", "m1", "m2", "m3", "m4", "m5"]);
    }

    #[test]
    fn non_personal_sender_outranks_noise() {
        let policy = DomainPolicy::default();
        let mut inbox = make_inbox(&[
            ("new1", "plain"),
            ("new2", "plain"),
            ("old-noise", "plain"),
            ("old-work", "plain"),
        ]);
        inbox[3].sender_address = "lead@client.example".into();

        let sampled = sample(&inbox, 3, &policy);
        let ids: Vec<&str> = sampled.iter().map(|m| m.id.as_str()).collect();
        assert!(ids.contains(&"old-work"));
        assert!(!ids.contains(&"old-noise"));
    }
}
