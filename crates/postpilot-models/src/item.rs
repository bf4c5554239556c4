//! Context items: the unit of session history.
//!
//! Every user interaction during a session is recorded as a [`ContextItem`].
//! Items are immutable after creation; the prioritizer scores them when
//! assembling the next prompt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The kind of interaction a context item records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    /// A markdown journal upload.
    Upload,
    /// A free-form text message.
    Text,
    /// An inline button press (approve, reject, regenerate).
    Button,
    /// A satisfaction rating given after a post was finalized.
    Feedback,
}

/// One historical interaction, eligible for inclusion in a future prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    /// When the interaction happened.
    pub timestamp: DateTime<Utc>,

    /// Text content of the interaction.
    pub content: String,

    /// What kind of interaction this was.
    pub kind: InteractionKind,

    /// Recorded satisfaction in [0, 1], if the user rated the outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub satisfaction: Option<f64>,

    /// Tags extracted from the content, used for similarity scoring.
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl ContextItem {
    /// Create a new context item stamped with the current time.
    pub fn new(kind: InteractionKind, content: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            content: content.into(),
            kind,
            satisfaction: None,
            tags: BTreeSet::new(),
        }
    }

    /// Create a context item with an explicit timestamp.
    pub fn at(timestamp: DateTime<Utc>, kind: InteractionKind, content: impl Into<String>) -> Self {
        Self {
            timestamp,
            content: content.into(),
            kind,
            satisfaction: None,
            tags: BTreeSet::new(),
        }
    }

    /// Attach a satisfaction score. Values outside [0, 1] are clamped.
    pub fn with_satisfaction(mut self, score: f64) -> Self {
        self.satisfaction = Some(score.clamp(0.0, 1.0));
        self
    }

    /// Attach tags for similarity scoring.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the user marked this interaction as a satisfying outcome.
    pub fn is_approved(&self) -> bool {
        self.satisfaction.is_some_and(|s| s >= 0.8)
    }
}
