//! Context selection: score, rank, pack, reorder.
//!
//! The selection pass is a bounded knapsack-by-greedy: items are ranked by
//! relevance and accepted in rank order while they fit the token budget.
//! An item that would overflow is skipped, not a stopping point, so a
//! smaller lower-ranked item can still make it in. Accuracy of the ranking
//! matters more than byte-perfect packing at these history sizes.

use postpilot_models::ContextItem;
use thiserror::Error;
use tracing::debug;

use crate::config::{ConfigError, PrioritizerConfig};
use crate::scoring::{
    importance_score, recency_score, satisfaction_score, Request, ScoredItem, SimilarityScorer,
    TokenOverlap,
};

/// Errors raised by context selection.
#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    /// The token budget was zero.
    #[error("token budget must be positive")]
    InvalidBudget,
}

/// Estimate the token cost of a piece of text.
///
/// A simple length heuristic: roughly four characters per token, rounded
/// up.
pub fn estimate_tokens(content: &str) -> usize {
    content.chars().count().div_ceil(4)
}

/// Scores and selects context items for prompt assembly.
///
/// Construction validates the configuration; afterwards the prioritizer is
/// immutable and [`select_context`](Self::select_context) is a pure
/// function of its arguments.
pub struct ContextPrioritizer {
    config: PrioritizerConfig,
    similarity: Box<dyn SimilarityScorer>,
}

impl ContextPrioritizer {
    /// Create a prioritizer with the default token-overlap similarity.
    pub fn new(config: PrioritizerConfig) -> Result<Self, ConfigError> {
        Self::with_similarity(config, Box::new(TokenOverlap))
    }

    /// Create a prioritizer with a custom similarity strategy.
    pub fn with_similarity(
        config: PrioritizerConfig,
        similarity: Box<dyn SimilarityScorer>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, similarity })
    }

    /// The active configuration.
    pub fn config(&self) -> &PrioritizerConfig {
        &self.config
    }

    /// Score every history item and return them in selection order:
    /// descending score, ties broken by descending recency, then by
    /// original insertion order.
    pub fn score_history<'a>(
        &self,
        history: &'a [ContextItem],
        request: &Request,
    ) -> Vec<ScoredItem<'a>> {
        let Some(newest) = history.iter().map(|i| i.timestamp).max() else {
            return Vec::new();
        };
        let weights = &self.config.weights;

        let mut scored: Vec<ScoredItem<'a>> = history
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let score = weights.recency
                    * recency_score(item.timestamp, newest, self.config.recency_halflife_secs)
                    + weights.satisfaction * satisfaction_score(item)
                    + weights.similarity * self.similarity.score(item, request)
                    + weights.importance * importance_score(item);
                ScoredItem { index, item, score }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| b.item.timestamp.cmp(&a.item.timestamp))
                .then_with(|| a.index.cmp(&b.index))
        });
        scored
    }

    /// Select the subset of `history` to embed in the next prompt.
    ///
    /// Items are accepted greedily in score order until the budget is
    /// spent; an item that would overflow is skipped and scanning
    /// continues. The accepted items are returned in chronological order.
    ///
    /// # Errors
    ///
    /// [`SelectionError::InvalidBudget`] if `max_tokens` is zero. An empty
    /// history, or a budget too small for any single item, yields an empty
    /// result instead of an error.
    pub fn select_context(
        &self,
        history: &[ContextItem],
        request: &Request,
        max_tokens: usize,
    ) -> Result<Vec<ContextItem>, SelectionError> {
        if max_tokens == 0 {
            return Err(SelectionError::InvalidBudget);
        }
        if history.is_empty() {
            return Ok(Vec::new());
        }

        let ranked = self.score_history(history, request);

        let mut spent = 0usize;
        let mut accepted: Vec<&ScoredItem<'_>> = Vec::new();
        for scored in &ranked {
            let cost = estimate_tokens(&scored.item.content);
            if spent + cost > max_tokens {
                continue;
            }
            spent += cost;
            accepted.push(scored);
        }

        // Chronological output, regardless of acceptance order.
        accepted.sort_by(|a, b| {
            a.item
                .timestamp
                .cmp(&b.item.timestamp)
                .then_with(|| a.index.cmp(&b.index))
        });

        debug!(
            history = history.len(),
            selected = accepted.len(),
            tokens = spent,
            budget = max_tokens,
            "Context selected"
        );

        Ok(accepted.into_iter().map(|s| s.item.clone()).collect())
    }
}
