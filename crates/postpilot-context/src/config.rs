//! Prioritizer configuration.
//!
//! Weights and decay parameters are a fixed, typed struct with documented
//! defaults. The configuration is built once at startup and read-only
//! afterwards; validation happens when the prioritizer is constructed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a configuration fails validation.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A scoring weight was negative or not a finite number.
    #[error("scoring weight `{name}` must be a finite, non-negative number (got {value})")]
    InvalidWeight {
        /// Name of the offending weight.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// All weights were zero, which would make every score 0.
    #[error("at least one scoring weight must be positive")]
    AllWeightsZero,

    /// The recency half-life must be a positive duration.
    #[error("recency half-life must be positive (got {0}s)")]
    InvalidHalflife(i64),
}

/// Relative weights of the four relevance sub-scores.
///
/// Weights are non-negative floats; they need not sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Weight of the recency sub-score.
    #[serde(default = "default_recency_weight")]
    pub recency: f64,

    /// Weight of the satisfaction sub-score.
    #[serde(default = "default_satisfaction_weight")]
    pub satisfaction: f64,

    /// Weight of the similarity sub-score.
    #[serde(default = "default_similarity_weight")]
    pub similarity: f64,

    /// Weight of the importance sub-score.
    #[serde(default = "default_importance_weight")]
    pub importance: f64,
}

fn default_recency_weight() -> f64 {
    0.3
}

fn default_satisfaction_weight() -> f64 {
    0.4
}

fn default_similarity_weight() -> f64 {
    0.2
}

fn default_importance_weight() -> f64 {
    0.1
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            recency: default_recency_weight(),
            satisfaction: default_satisfaction_weight(),
            similarity: default_similarity_weight(),
            importance: default_importance_weight(),
        }
    }
}

impl ScoringWeights {
    /// Validate that every weight is finite and non-negative, and that at
    /// least one is positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("recency", self.recency),
            ("satisfaction", self.satisfaction),
            ("similarity", self.similarity),
            ("importance", self.importance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        if self.recency + self.satisfaction + self.similarity + self.importance == 0.0 {
            return Err(ConfigError::AllWeightsZero);
        }
        Ok(())
    }
}

/// Configuration for the context prioritizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrioritizerConfig {
    /// Relative weights of the relevance sub-scores.
    #[serde(default)]
    pub weights: ScoringWeights,

    /// Half-life of the recency decay curve, in seconds. After one
    /// half-life an item's recency sub-score drops to 0.5.
    #[serde(default = "default_recency_halflife_secs")]
    pub recency_halflife_secs: i64,

    /// Minimum similarity for an item to be considered at all. Reserved
    /// for future pruning; selection itself does not consult it.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub similarity_threshold: Option<f64>,
}

fn default_recency_halflife_secs() -> i64 {
    // One day: journal uploads are a daily rhythm.
    86_400
}

impl Default for PrioritizerConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            recency_halflife_secs: default_recency_halflife_secs(),
            similarity_threshold: None,
        }
    }
}

impl PrioritizerConfig {
    /// Validate weights and the half-life.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        if self.recency_halflife_secs <= 0 {
            return Err(ConfigError::InvalidHalflife(self.recency_halflife_secs));
        }
        Ok(())
    }
}
