//! Relevance sub-scores.
//!
//! Each sub-score maps a context item to [0, 1]. The weighted combination
//! happens in [`crate::select`]; this module owns the individual factors
//! and the replaceable similarity strategy.

use chrono::{DateTime, Utc};
use postpilot_models::{ContextItem, InteractionKind};
use std::collections::BTreeSet;

/// The current request context selection is performed against.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Text of the request (typically the new journal body).
    pub content: String,

    /// When the request was made.
    pub timestamp: DateTime<Utc>,
}

impl Request {
    /// Create a request.
    pub fn new(content: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            content: content.into(),
            timestamp,
        }
    }
}

/// A context item paired with its relevance score for one selection pass.
///
/// Ephemeral: produced during scoring, never persisted.
#[derive(Debug, Clone)]
pub struct ScoredItem<'a> {
    /// Position of the item in the original history sequence.
    pub index: usize,

    /// The scored item.
    pub item: &'a ContextItem,

    /// Combined relevance score.
    pub score: f64,
}

/// Recency sub-score: exponential half-life decay of elapsed time.
///
/// Elapsed time is measured from the newest item in the history, so the
/// newest item always scores exactly 1.0 and the function stays
/// independent of the wall clock.
pub fn recency_score(
    timestamp: DateTime<Utc>,
    newest: DateTime<Utc>,
    halflife_secs: i64,
) -> f64 {
    let elapsed_ms = (newest - timestamp).num_milliseconds().max(0) as f64;
    let halflife_ms = (halflife_secs as f64) * 1000.0;
    0.5f64.powf(elapsed_ms / halflife_ms)
}

/// Satisfaction sub-score: the recorded score, or a neutral 0.5.
pub fn satisfaction_score(item: &ContextItem) -> f64 {
    item.satisfaction.unwrap_or(0.5)
}

/// Importance sub-score, rule-derived from the interaction kind.
///
/// Approved items (satisfaction at or above the approval threshold) score
/// 1.0 regardless of kind.
pub fn importance_score(item: &ContextItem) -> f64 {
    if item.is_approved() {
        return 1.0;
    }
    match item.kind {
        InteractionKind::Upload => 0.9,
        InteractionKind::Feedback => 0.7,
        InteractionKind::Text => 0.6,
        InteractionKind::Button => 0.4,
    }
}

/// Strategy for scoring lexical similarity between an item and the request.
///
/// The original system's similarity measure was unspecified, so it is a
/// replaceable strategy rather than a fixed function.
pub trait SimilarityScorer: Send + Sync {
    /// Similarity in [0, 1] between the item and the request.
    fn score(&self, item: &ContextItem, request: &Request) -> f64;
}

/// Default similarity: token-set Jaccard overlap.
///
/// The item side is the union of its content tokens and its tags; the
/// request side is its content tokens.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenOverlap;

impl SimilarityScorer for TokenOverlap {
    fn score(&self, item: &ContextItem, request: &Request) -> f64 {
        let mut item_tokens = tokenize(&item.content);
        item_tokens.extend(item.tags.iter().map(|t| t.to_lowercase()));
        let request_tokens = tokenize(&request.content);

        if item_tokens.is_empty() || request_tokens.is_empty() {
            return 0.0;
        }

        let intersection = item_tokens.intersection(&request_tokens).count();
        let union = item_tokens.union(&request_tokens).count();
        intersection as f64 / union as f64
    }
}

/// Split text into a set of lowercased alphanumeric tokens.
fn tokenize(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn item(content: &str) -> ContextItem {
        ContextItem::new(InteractionKind::Text, content)
    }

    #[test]
    fn test_recency_newest_scores_one() {
        let now = Utc::now();
        assert_eq!(recency_score(now, now, 3600), 1.0);
    }

    #[test]
    fn test_recency_halflife_point() {
        let now = Utc::now();
        let older = now - Duration::seconds(3600);
        let score = recency_score(older, now, 3600);
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_recency_monotonically_decreasing() {
        let now = Utc::now();
        let mut last = f64::INFINITY;
        for minutes in [0, 10, 60, 600, 6000] {
            let score = recency_score(now - Duration::minutes(minutes), now, 3600);
            assert!(score <= last);
            assert!(score > 0.0);
            last = score;
        }
    }

    #[test]
    fn test_recency_future_timestamp_clamped() {
        // An item stamped after the anchor must not score above 1.0.
        let now = Utc::now();
        let future = now + Duration::seconds(30);
        assert_eq!(recency_score(future, now, 3600), 1.0);
    }

    #[test]
    fn test_satisfaction_default_is_neutral() {
        assert_eq!(satisfaction_score(&item("x")), 0.5);
        assert_eq!(
            satisfaction_score(&item("x").with_satisfaction(0.9)),
            0.9
        );
    }

    #[test]
    fn test_importance_rules() {
        assert_eq!(
            importance_score(&ContextItem::new(InteractionKind::Upload, "j")),
            0.9
        );
        assert_eq!(
            importance_score(&ContextItem::new(InteractionKind::Button, "b")),
            0.4
        );
        // Approval overrides the kind rule.
        let approved = ContextItem::new(InteractionKind::Button, "b").with_satisfaction(0.9);
        assert_eq!(importance_score(&approved), 1.0);
    }

    #[test]
    fn test_token_overlap_identical_text() {
        let request = Request::new("fixed the async runtime bug", Utc::now());
        let same = item("fixed the async runtime bug");
        assert_eq!(TokenOverlap.score(&same, &request), 1.0);
    }

    #[test]
    fn test_token_overlap_disjoint_text() {
        let request = Request::new("gardening weekend", Utc::now());
        let other = item("database migration notes");
        assert_eq!(TokenOverlap.score(&other, &request), 0.0);
    }

    #[test]
    fn test_token_overlap_counts_tags() {
        let request = Request::new("rust", Utc::now());
        let untagged = item("completely unrelated words");
        let tagged = item("completely unrelated words").with_tags(["rust"]);
        assert_eq!(TokenOverlap.score(&untagged, &request), 0.0);
        assert!(TokenOverlap.score(&tagged, &request) > 0.0);
    }

    #[test]
    fn test_token_overlap_empty_sides() {
        let request = Request::new("", Utc::now());
        assert_eq!(TokenOverlap.score(&item("words"), &request), 0.0);

        let request = Request::new("words", Utc::now());
        assert_eq!(TokenOverlap.score(&item(""), &request), 0.0);
    }

    #[test]
    fn test_tokenize_case_and_punctuation() {
        let tokens = tokenize("Fixed the Bug, fixed-the-BUG!");
        assert_eq!(
            tokens,
            ["bug", "fixed", "the"]
                .iter()
                .map(|s| s.to_string())
                .collect()
        );
    }
}
