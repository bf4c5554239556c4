//! Finalized post records written to storage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{PostId, SeriesId};
use crate::session::{Audience, Tone};

/// Lifecycle status of a post record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    /// Generated but not yet reviewed.
    #[default]
    Draft,
    /// Approved by the user, pending publication.
    Approved,
    /// Rejected by the user.
    Rejected,
    /// Published to the destination platform.
    Published,
}

impl PostStatus {
    /// Parse a status from its storage representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "published" => Some(Self::Published),
            _ => None,
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
            Self::Published => write!(f, "published"),
        }
    }
}

/// A finalized post as persisted in Airtable and the local cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Unique identifier for the post.
    pub id: PostId,

    /// Series this post belongs to, if part of a multi-post series.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_id: Option<SeriesId>,

    /// Generated post text.
    pub content: String,

    /// Tone the post was generated with.
    pub tone: Tone,

    /// Audience the post was written for.
    pub audience: Audience,

    /// Title of the source journal entry.
    pub source_title: String,

    /// Current lifecycle status.
    pub status: PostStatus,

    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl PostRecord {
    /// Create a new record with a fresh id, stamped with the current time.
    pub fn new(
        content: impl Into<String>,
        source_title: impl Into<String>,
        tone: Tone,
        audience: Audience,
    ) -> Self {
        Self {
            id: PostId::new(),
            series_id: None,
            content: content.into(),
            tone,
            audience,
            source_title: source_title.into(),
            status: PostStatus::Draft,
            created_at: Utc::now(),
        }
    }

    /// Attach a series id.
    pub fn in_series(mut self, series_id: SeriesId) -> Self {
        self.series_id = Some(series_id);
        self
    }

    /// Set the lifecycle status.
    pub fn with_status(mut self, status: PostStatus) -> Self {
        self.status = status;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_defaults() {
        let record = PostRecord::new("body", "Title", Tone::Casual, Audience::Developers);
        assert_eq!(record.status, PostStatus::Draft);
        assert!(record.series_id.is_none());
        assert!(!record.id.as_str().is_empty());
    }

    #[test]
    fn test_builder_chain() {
        let series = SeriesId::new();
        let record = PostRecord::new("body", "Title", Tone::Technical, Audience::General)
            .in_series(series.clone())
            .with_status(PostStatus::Approved);

        assert_eq!(record.series_id, Some(series));
        assert_eq!(record.status, PostStatus::Approved);
    }

    #[test]
    fn test_status_parse_roundtrip() {
        for status in [
            PostStatus::Draft,
            PostStatus::Approved,
            PostStatus::Rejected,
            PostStatus::Published,
        ] {
            assert_eq!(PostStatus::parse(&status.to_string()), Some(status));
        }
        assert_eq!(PostStatus::parse("archived"), None);
    }

    #[test]
    fn test_serde_roundtrip() {
        let record = PostRecord::new("body", "Title", Tone::Upbeat, Audience::Business);
        let json = serde_json::to_string(&record).unwrap();
        let parsed: PostRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
