//! Shared state and the generation pipeline.
//!
//! `BotState` wires the session store, the context prioritizer, the LLM
//! client, and the write-through storage together and implements the
//! linear workflow: journal in, context selected, prompt built, draft
//! generated, review recorded, approved post written through.

use chrono::{Duration, Utc};
use tracing::{debug, info};

use postpilot_context::{ContextPrioritizer, Request};
use postpilot_core::JournalEntry;
use postpilot_llm::{ModelConfig, OpenRouterClient, PromptBuilder, PromptInput};
use postpilot_models::{
    Audience, ContextItem, Draft, InteractionKind, PostRecord, PostStatus, Session, SeriesId, Tone,
};
use postpilot_session::SessionStore;
use postpilot_storage::{PostStore, WriteThroughStore};

use crate::error::{BotError, Result};

/// Tunables for the bot pipeline.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Token budget for selected context per prompt.
    pub context_budget: usize,

    /// Idle minutes before a session is expired.
    pub session_timeout_mins: i64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            context_budget: 1500,
            session_timeout_mins: 60,
        }
    }
}

/// A review decision taken via inline buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    /// Accept the draft and write it through to storage.
    Approve,
    /// Generate a fresh draft from the same journal.
    Regenerate,
    /// Abandon the draft.
    Reject,
}

impl ReviewAction {
    /// Callback-data value for the inline button.
    pub fn callback_data(self) -> &'static str {
        match self {
            Self::Approve => "review:approve",
            Self::Regenerate => "review:regenerate",
            Self::Reject => "review:reject",
        }
    }

    /// Parse callback data back into an action.
    pub fn parse(data: &str) -> Option<Self> {
        match data {
            "review:approve" => Some(Self::Approve),
            "review:regenerate" => Some(Self::Regenerate),
            "review:reject" => Some(Self::Reject),
            _ => None,
        }
    }
}

/// Session summary for the `/status` command.
#[derive(Debug, Clone)]
pub struct StatusSummary {
    /// Current tone.
    pub tone: Tone,
    /// Current audience.
    pub audience: Audience,
    /// Number of recorded interactions.
    pub history_len: usize,
    /// Whether a draft is pending review.
    pub draft_pending: bool,
    /// Position in the active series, if one is running.
    pub series_position: Option<u32>,
}

/// Shared state for the Telegram bot, accessible across all handlers.
pub struct BotState {
    sessions: SessionStore,
    prioritizer: ContextPrioritizer,
    llm: OpenRouterClient,
    model: ModelConfig,
    prompts: PromptBuilder,
    store: WriteThroughStore,
    config: BotConfig,
}

impl BotState {
    /// Wire the pipeline together.
    pub fn new(
        sessions: SessionStore,
        prioritizer: ContextPrioritizer,
        llm: OpenRouterClient,
        model: ModelConfig,
        store: WriteThroughStore,
        config: BotConfig,
    ) -> Self {
        Self {
            sessions,
            prioritizer,
            llm,
            model,
            prompts: PromptBuilder::new(),
            store,
            config,
        }
    }

    /// The session store (used by the expiry sweeper).
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// The post store.
    pub fn store(&self) -> &WriteThroughStore {
        &self.store
    }

    /// Idle timeout for sessions.
    pub fn session_timeout(&self) -> Duration {
        Duration::minutes(self.config.session_timeout_mins)
    }

    /// Generate a draft post from a markdown journal.
    ///
    /// Records the upload as a context item, selects history context
    /// within the token budget, and stores the resulting draft on the
    /// session for review.
    pub async fn generate_from_journal(&self, chat_id: i64, markdown: &str) -> Result<String> {
        let entry = JournalEntry::parse(markdown)?;
        let session = self.sessions.open(chat_id).await;

        // Snapshot history and settings, then record the upload. One lock
        // scope keeps the snapshot and the append serialized.
        let (history, tone, audience, series_position) = {
            let mut s = session.lock().await;
            let history = s.history().to_vec();
            s.record(
                ContextItem::new(InteractionKind::Upload, entry.body.clone())
                    .with_tags(entry.tags.iter().cloned()),
            );
            (history, s.tone, s.audience, series_position_of(&s))
        };

        let content = self
            .generate(&history, &entry.title, &entry.body, tone, audience, series_position, None)
            .await?;

        let mut s = session.lock().await;
        s.draft = Some(Draft::new(content.clone(), &entry.title, &entry.body));
        info!(chat_id, title = %entry.title, "Draft generated");
        Ok(content)
    }

    /// Regenerate the pending draft, optionally with revision feedback.
    pub async fn regenerate(&self, chat_id: i64, feedback: Option<&str>) -> Result<String> {
        let session = self.sessions.open(chat_id).await;

        let (draft, history, tone, audience, series_position) = {
            let mut s = session.lock().await;
            let draft = s.draft.clone().ok_or(BotError::NoDraft)?;
            let history = s.history().to_vec();
            let item = match feedback {
                Some(text) => ContextItem::new(InteractionKind::Text, text.to_string()),
                None => ContextItem::new(InteractionKind::Button, "regenerate"),
            };
            s.record(item);
            (draft, history, s.tone, s.audience, series_position_of(&s))
        };

        let content = self
            .generate(
                &history,
                &draft.source_title,
                &draft.source_body,
                tone,
                audience,
                series_position,
                feedback,
            )
            .await?;

        let mut s = session.lock().await;
        s.draft = Some(draft.regenerated(content.clone()));
        info!(chat_id, generation = draft.generation + 1, "Draft regenerated");
        Ok(content)
    }

    /// Approve the pending draft: write it through to storage and record
    /// the approval in the session history.
    pub async fn approve(&self, chat_id: i64) -> Result<PostRecord> {
        let session = self.sessions.open(chat_id).await;

        let (draft, record) = {
            let mut s = session.lock().await;
            let draft = s.draft.take().ok_or(BotError::NoDraft)?;

            let mut record = PostRecord::new(
                draft.content.clone(),
                draft.source_title.clone(),
                s.tone,
                s.audience,
            )
            .with_status(PostStatus::Approved);

            if let Some(series_id) = s.series_id.clone() {
                record = record.in_series(series_id);
                s.series_count += 1;
            }
            (draft, record)
        };

        self.store.save(&record).await?;

        self.sessions
            .append(
                chat_id,
                ContextItem::new(
                    InteractionKind::Button,
                    format!("approved post: {}", draft.content),
                )
                .with_satisfaction(1.0),
            )
            .await;

        info!(chat_id, post_id = %record.id, "Post approved and stored");
        Ok(record)
    }

    /// Reject the pending draft and record the rejection.
    pub async fn reject(&self, chat_id: i64) -> Result<()> {
        let session = self.sessions.open(chat_id).await;
        let draft = {
            let mut s = session.lock().await;
            s.draft.take().ok_or(BotError::NoDraft)?
        };

        self.sessions
            .append(
                chat_id,
                ContextItem::new(
                    InteractionKind::Button,
                    format!("rejected post: {}", draft.content),
                )
                .with_satisfaction(0.0),
            )
            .await;

        debug!(chat_id, "Draft rejected");
        Ok(())
    }

    /// Record a 1-5 rating as a feedback context item. Returns the
    /// normalized satisfaction score.
    pub async fn record_rating(&self, chat_id: i64, rating: u8) -> Result<f64> {
        let rating = rating.clamp(1, 5);
        let satisfaction = f64::from(rating) / 5.0;

        self.sessions
            .append(
                chat_id,
                ContextItem::new(InteractionKind::Feedback, format!("rated {rating}/5"))
                    .with_satisfaction(satisfaction),
            )
            .await;

        debug!(chat_id, rating, "Rating recorded");
        Ok(satisfaction)
    }

    /// Set the session tone.
    pub async fn set_tone(&self, chat_id: i64, tone: Tone) {
        let session = self.sessions.open(chat_id).await;
        session.lock().await.tone = tone;
    }

    /// Set the session audience.
    pub async fn set_audience(&self, chat_id: i64, audience: Audience) {
        let session = self.sessions.open(chat_id).await;
        session.lock().await.audience = audience;
    }

    /// Start a series for the chat. Returns the series id.
    pub async fn start_series(&self, chat_id: i64) -> SeriesId {
        let session = self.sessions.open(chat_id).await;
        let id = session.lock().await.start_series();
        id
    }

    /// End the active series, if any. Returns how many posts it had.
    pub async fn end_series(&self, chat_id: i64) -> u32 {
        let session = self.sessions.open(chat_id).await;
        let mut s = session.lock().await;
        let count = s.series_count;
        s.end_series();
        count
    }

    /// Session summary for `/status`, if a session exists.
    pub async fn status(&self, chat_id: i64) -> Option<StatusSummary> {
        if !self.sessions.has_session(chat_id).await {
            return None;
        }
        self.sessions
            .with_session(chat_id, |s| StatusSummary {
                tone: s.tone,
                audience: s.audience,
                history_len: s.history().len(),
                draft_pending: s.draft.is_some(),
                series_position: series_position_of(s),
            })
            .await
            .ok()
    }

    /// End the chat's session. Returns `true` if one existed.
    pub async fn cancel(&self, chat_id: i64) -> bool {
        self.sessions.end(chat_id).await
    }

    /// Whether a draft is pending review for the chat.
    pub async fn has_pending_draft(&self, chat_id: i64) -> bool {
        self.sessions
            .with_session(chat_id, |s| s.draft.is_some())
            .await
            .unwrap_or(false)
    }

    /// Select context and run one generation.
    #[allow(clippy::too_many_arguments)]
    async fn generate(
        &self,
        history: &[ContextItem],
        title: &str,
        body: &str,
        tone: Tone,
        audience: Audience,
        series_position: Option<u32>,
        feedback: Option<&str>,
    ) -> Result<String> {
        let request = Request::new(body.to_string(), Utc::now());
        let selected =
            self.prioritizer
                .select_context(history, &request, self.config.context_budget)?;
        debug!(
            history = history.len(),
            selected = selected.len(),
            "Context selected for generation"
        );

        let input = PromptInput {
            title,
            body,
            tone,
            audience,
            series_position,
            feedback,
        };
        let system = self.prompts.system_prompt(tone, audience);
        let user = self.prompts.user_prompt(&selected, &input);

        let content = self.llm.complete(&self.model, system, user).await?;
        Ok(content)
    }
}

/// 1-based position the next post would take in the active series.
fn series_position_of(session: &Session) -> Option<u32> {
    session.series_id.as_ref().map(|_| session.series_count + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use postpilot_context::PrioritizerConfig;
    use postpilot_storage::SqliteCache;
    use std::sync::Arc;

    /// State with an in-memory store and a dummy API key; tests exercise
    /// every path that stops short of the network.
    fn state() -> BotState {
        let remote: Arc<dyn PostStore> = Arc::new(SqliteCache::in_memory().unwrap());
        BotState::new(
            SessionStore::new(),
            ContextPrioritizer::new(PrioritizerConfig::default()).unwrap(),
            OpenRouterClient::new("test-key"),
            ModelConfig::default(),
            WriteThroughStore::new(remote, None),
            BotConfig::default(),
        )
    }

    #[test]
    fn test_review_action_roundtrip() {
        for action in [
            ReviewAction::Approve,
            ReviewAction::Regenerate,
            ReviewAction::Reject,
        ] {
            assert_eq!(ReviewAction::parse(action.callback_data()), Some(action));
        }
        assert_eq!(ReviewAction::parse("rate:3"), None);
    }

    #[tokio::test]
    async fn test_settings_and_status() {
        let state = state();
        state.set_tone(1, Tone::Technical).await;
        state.set_audience(1, Audience::Business).await;

        let status = state.status(1).await.unwrap();
        assert_eq!(status.tone, Tone::Technical);
        assert_eq!(status.audience, Audience::Business);
        assert!(!status.draft_pending);
        assert!(status.series_position.is_none());
    }

    #[tokio::test]
    async fn test_status_without_session() {
        let state = state();
        assert!(state.status(99).await.is_none());
    }

    #[tokio::test]
    async fn test_approve_without_draft() {
        let state = state();
        assert!(matches!(state.approve(5).await, Err(BotError::NoDraft)));
    }

    #[tokio::test]
    async fn test_approve_writes_through_and_records_history() {
        let state = state();

        // Stage a draft as if generation had run.
        let session = state.sessions().open(7).await;
        session.lock().await.draft = Some(Draft::new("the post", "Title", "the journal"));

        let record = state.approve(7).await.unwrap();
        assert_eq!(record.status, PostStatus::Approved);
        assert_eq!(record.content, "the post");

        // Stored in the write-through store.
        let stored = state.store().get(&record.id).await.unwrap().unwrap();
        assert_eq!(stored.content, "the post");

        // Approval recorded as a satisfied button interaction.
        let history = state.sessions().get_history(7).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, InteractionKind::Button);
        assert_eq!(history[0].satisfaction, Some(1.0));

        // Draft is consumed.
        assert!(!state.has_pending_draft(7).await);
    }

    #[tokio::test]
    async fn test_approve_in_series_counts_posts() {
        let state = state();
        let series_id = state.start_series(3).await;

        let session = state.sessions().open(3).await;
        session.lock().await.draft = Some(Draft::new("post one", "T", "body"));

        let record = state.approve(3).await.unwrap();
        assert_eq!(record.series_id, Some(series_id));

        let status = state.status(3).await.unwrap();
        assert_eq!(status.series_position, Some(2), "next post is number two");

        assert_eq!(state.end_series(3).await, 1);
    }

    #[tokio::test]
    async fn test_reject_records_zero_satisfaction() {
        let state = state();
        let session = state.sessions().open(4).await;
        session.lock().await.draft = Some(Draft::new("meh", "T", "body"));

        state.reject(4).await.unwrap();

        let history = state.sessions().get_history(4).await.unwrap();
        assert_eq!(history[0].satisfaction, Some(0.0));
        assert!(!state.has_pending_draft(4).await);
    }

    #[tokio::test]
    async fn test_rating_is_clamped_and_normalized() {
        let state = state();
        assert_eq!(state.record_rating(1, 4).await.unwrap(), 0.8);
        assert_eq!(state.record_rating(1, 9).await.unwrap(), 1.0);
        assert_eq!(state.record_rating(1, 0).await.unwrap(), 0.2);

        let history = state.sessions().get_history(1).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].kind, InteractionKind::Feedback);
    }

    #[tokio::test]
    async fn test_cancel_ends_session() {
        let state = state();
        state.set_tone(2, Tone::Upbeat).await;
        assert!(state.cancel(2).await);
        assert!(!state.cancel(2).await);
        assert!(state.status(2).await.is_none());
    }
}
