//! Comment ranking for the Tesla timeline documents.
//!
//! Events reference social-media posts by URL; seeded candidate comments are
//! keyed by the post's status id. Each event gets the top comments by a
//! synthetic score combining likes with a lexical information-density
//! heuristic.

use crate::models::{Comment, TimelineEvent};
use std::collections::HashMap;
use std::fmt;

/// Comments kept per event after ranking.
pub const MAX_COMMENTS: usize = 20;

const LIKES_WEIGHT: f64 = 0.75;
const DENSITY_WEIGHT: f64 = 30.0;

// ── Status id parsing ─────────────────────────────────────────────────────────

/// Numeric status identifier extracted from a post URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatusId(String);

impl StatusId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse the `/status/<digits>` path segment out of a post URL.
pub fn extract_status_id(url: &str) -> Option<StatusId> {
    const MARKER: &str = "/status/";
    let idx = url.find(MARKER)?;
    let rest = &url[idx + MARKER.len()..];
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        Some(StatusId(digits))
    }
}

// ── Scoring ───────────────────────────────────────────────────────────────────

/// Lexical information density of a comment, capped at 10:
/// unique-token ratio + length + digit count.
pub fn info_density(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }

    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '.' {
            current.push(ch.to_ascii_lowercase());
        } else if !current.is_empty() {
            tokens.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    let unique = {
        let mut t = tokens;
        t.sort();
        t.dedup();
        t.len() as f64
    };
    let length = text.chars().count() as f64;
    let digits = text.chars().filter(|c| c.is_ascii_digit()).count() as f64;

    (unique / 12.0 + (length / 80.0).min(4.0) + digits * 0.08).min(10.0)
}

fn score(comment: &Comment) -> f64 {
    let likes = comment.likes.unwrap_or(0) as f64;
    likes * LIKES_WEIGHT + info_density(&comment.text_en) * DENSITY_WEIGHT
}

/// Rank candidates by score descending and keep the top `MAX_COMMENTS`.
/// The sort is stable: equal scores keep their input order.
pub fn rank_comments(candidates: &[Comment]) -> Vec<Comment> {
    let mut scored: Vec<(f64, Comment)> = candidates
        .iter()
        .map(|c| {
            let normalized = Comment {
                likes: Some(c.likes.unwrap_or(0)),
                ..c.clone()
            };
            (score(c), normalized)
        })
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(MAX_COMMENTS);
    scored.into_iter().map(|(_, c)| c).collect()
}

/// Attach ranked comments to every event whose source URL resolves to a
/// seeded status id; drop stale comments everywhere else.
pub fn attach_comments(events: &mut [TimelineEvent], by_status: &HashMap<String, Vec<Comment>>) {
    for event in events.iter_mut() {
        let seeded = extract_status_id(&event.source)
            .and_then(|sid| by_status.get(sid.as_str()));
        event.comments = seeded.map(|candidates| rank_comments(candidates));
    }
}
