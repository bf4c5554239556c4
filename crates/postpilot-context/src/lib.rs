//! Context prioritization for PostPilot.
//!
//! Given a session's history and the current request, this crate selects
//! the subset of past interactions worth embedding in the next LLM prompt.
//! Each item gets a relevance score (a weighted average of recency,
//! satisfaction, similarity, and importance), items are ranked, and a
//! greedy pass packs them into the configured token budget. The selected
//! items are returned in chronological order so the assembled prompt reads
//! as a timeline.
//!
//! Selection is a pure function of its inputs plus the prioritizer's
//! configuration: no clocks, no I/O, no shared mutable state.
//!
//! # Example
//!
//! ```
//! use postpilot_context::{ContextPrioritizer, PrioritizerConfig, Request};
//! use postpilot_models::{ContextItem, InteractionKind};
//! use chrono::Utc;
//!
//! let prioritizer = ContextPrioritizer::new(PrioritizerConfig::default()).unwrap();
//! let history = vec![ContextItem::new(InteractionKind::Upload, "shipped the parser")];
//! let request = Request::new("write a post about the parser", Utc::now());
//!
//! let selected = prioritizer.select_context(&history, &request, 1000).unwrap();
//! assert_eq!(selected.len(), 1);
//! ```

pub mod config;
pub mod scoring;
pub mod select;

pub use config::{ConfigError, PrioritizerConfig, ScoringWeights};
pub use scoring::{Request, ScoredItem, SimilarityScorer, TokenOverlap};
pub use select::{estimate_tokens, ContextPrioritizer, SelectionError};
