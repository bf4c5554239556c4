//! Session state for one user's conversation with the bot.
//!
//! A session owns the ordered history of context items, the current draft,
//! and the scalar settings (tone, audience, series) that shape generation.
//! Exactly one session exists per chat at a time; the session store creates
//! it on first interaction and destroys it on timeout or completion.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::SeriesId;
use crate::item::ContextItem;

/// Maximum context items kept per session before the oldest are evicted.
pub const DEFAULT_HISTORY_CAP: usize = 200;

/// Writing tone applied to generated posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    /// Conversational, first-person voice.
    #[default]
    Casual,
    /// Polished, publication-ready voice.
    Professional,
    /// Deep-dive voice for developer readers.
    Technical,
    /// Short, punchy, enthusiastic voice.
    Upbeat,
}

impl Tone {
    /// Parse a tone from user input. Returns `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "casual" => Some(Self::Casual),
            "professional" => Some(Self::Professional),
            "technical" => Some(Self::Technical),
            "upbeat" => Some(Self::Upbeat),
            _ => None,
        }
    }

    /// All recognized tone names, for help text.
    pub fn names() -> &'static [&'static str] {
        &["casual", "professional", "technical", "upbeat"]
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Casual => write!(f, "casual"),
            Self::Professional => write!(f, "professional"),
            Self::Technical => write!(f, "technical"),
            Self::Upbeat => write!(f, "upbeat"),
        }
    }
}

/// Audience the generated post is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    /// Fellow developers.
    #[default]
    Developers,
    /// A general, non-technical readership.
    General,
    /// Founders, managers, and other business readers.
    Business,
}

impl Audience {
    /// Parse an audience from user input. Returns `None` for unknown values.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "developers" | "devs" => Some(Self::Developers),
            "general" => Some(Self::General),
            "business" => Some(Self::Business),
            _ => None,
        }
    }

    /// All recognized audience names, for help text.
    pub fn names() -> &'static [&'static str] {
        &["developers", "general", "business"]
    }
}

impl std::fmt::Display for Audience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Developers => write!(f, "developers"),
            Self::General => write!(f, "general"),
            Self::Business => write!(f, "business"),
        }
    }
}

/// An in-progress generated post awaiting user review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    /// Generated post text.
    pub content: String,

    /// Title of the journal entry the draft was generated from.
    pub source_title: String,

    /// Body of the journal entry, kept for regeneration.
    pub source_body: String,

    /// How many times this draft has been (re)generated.
    pub generation: u32,
}

impl Draft {
    /// Create a first-generation draft.
    pub fn new(
        content: impl Into<String>,
        source_title: impl Into<String>,
        source_body: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            source_title: source_title.into(),
            source_body: source_body.into(),
            generation: 1,
        }
    }

    /// Replace the content after a regeneration.
    pub fn regenerated(&self, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source_title: self.source_title.clone(),
            source_body: self.source_body.clone(),
            generation: self.generation + 1,
        }
    }
}

/// Bounded interaction state for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Ordered history of interactions, oldest first.
    history: Vec<ContextItem>,

    /// Cap on history length; the oldest item is evicted past it.
    history_cap: usize,

    /// The draft currently under review, if any.
    pub draft: Option<Draft>,

    /// Tone applied to generated posts.
    pub tone: Tone,

    /// Audience the posts are written for.
    pub audience: Audience,

    /// Active series, when the user is generating a multi-post series.
    pub series_id: Option<SeriesId>,

    /// Number of posts finalized in the active series.
    pub series_count: u32,

    /// When the session was created.
    pub created_at: DateTime<Utc>,

    /// Last time the session saw any interaction.
    pub last_activity: DateTime<Utc>,
}

impl Session {
    /// Create a new session with default settings.
    pub fn new() -> Self {
        Self::with_cap(DEFAULT_HISTORY_CAP)
    }

    /// Create a new session with a custom history cap (at least 1).
    pub fn with_cap(history_cap: usize) -> Self {
        let now = Utc::now();
        Self {
            history: Vec::new(),
            history_cap: history_cap.max(1),
            draft: None,
            tone: Tone::default(),
            audience: Audience::default(),
            series_id: None,
            series_count: 0,
            created_at: now,
            last_activity: now,
        }
    }

    /// Append an interaction, evicting the oldest item past the cap.
    pub fn record(&mut self, item: ContextItem) {
        self.last_activity = Utc::now();
        self.history.push(item);
        if self.history.len() > self.history_cap {
            let excess = self.history.len() - self.history_cap;
            self.history.drain(..excess);
        }
    }

    /// The full history, oldest first.
    pub fn history(&self) -> &[ContextItem] {
        &self.history
    }

    /// Bump the activity timestamp without recording an interaction.
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Whether the session has been idle longer than `timeout`.
    pub fn is_expired(&self, timeout: Duration) -> bool {
        Utc::now() - self.last_activity > timeout
    }

    /// Start a new series, returning its id.
    pub fn start_series(&mut self) -> SeriesId {
        let id = SeriesId::new();
        self.series_id = Some(id.clone());
        self.series_count = 0;
        id
    }

    /// Clear the active series.
    pub fn end_series(&mut self) {
        self.series_id = None;
        self.series_count = 0;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::InteractionKind;

    #[test]
    fn test_new_session_defaults() {
        let session = Session::new();
        assert!(session.history().is_empty());
        assert!(session.draft.is_none());
        assert_eq!(session.tone, Tone::Casual);
        assert_eq!(session.audience, Audience::Developers);
        assert!(session.series_id.is_none());
    }

    #[test]
    fn test_record_appends_in_order() {
        let mut session = Session::new();
        session.record(ContextItem::new(InteractionKind::Upload, "first"));
        session.record(ContextItem::new(InteractionKind::Text, "second"));

        let history = session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "first");
        assert_eq!(history[1].content, "second");
    }

    #[test]
    fn test_history_cap_evicts_oldest() {
        let mut session = Session::with_cap(3);
        for i in 0..5 {
            session.record(ContextItem::new(InteractionKind::Text, format!("msg {i}")));
        }

        let history = session.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].content, "msg 2");
        assert_eq!(history[2].content, "msg 4");
    }

    #[test]
    fn test_cap_is_at_least_one() {
        let mut session = Session::with_cap(0);
        session.record(ContextItem::new(InteractionKind::Text, "only"));
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_expiry() {
        let mut session = Session::new();
        assert!(!session.is_expired(Duration::minutes(30)));

        session.last_activity = Utc::now() - Duration::minutes(31);
        assert!(session.is_expired(Duration::minutes(30)));

        session.touch();
        assert!(!session.is_expired(Duration::minutes(30)));
    }

    #[test]
    fn test_series_lifecycle() {
        let mut session = Session::new();
        let id = session.start_series();
        assert_eq!(session.series_id.as_ref(), Some(&id));
        assert_eq!(session.series_count, 0);

        session.series_count += 1;
        session.end_series();
        assert!(session.series_id.is_none());
        assert_eq!(session.series_count, 0);
    }

    #[test]
    fn test_tone_and_audience_parsing() {
        assert_eq!(Tone::parse("Professional"), Some(Tone::Professional));
        assert_eq!(Tone::parse(" upbeat "), Some(Tone::Upbeat));
        assert_eq!(Tone::parse("angry"), None);

        assert_eq!(Audience::parse("devs"), Some(Audience::Developers));
        assert_eq!(Audience::parse("general"), Some(Audience::General));
        assert_eq!(Audience::parse("robots"), None);
    }

    #[test]
    fn test_draft_regeneration() {
        let draft = Draft::new("v1", "My Journal", "journal body");
        let next = draft.regenerated("v2");
        assert_eq!(next.content, "v2");
        assert_eq!(next.source_title, "My Journal");
        assert_eq!(next.source_body, "journal body");
        assert_eq!(next.generation, 2);
    }
}
