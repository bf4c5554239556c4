//! The session store.
//!
//! A registry of per-chat sessions. The registry itself is guarded by an
//! async `RwLock`; each session sits behind its own `Arc<Mutex<_>>`, so
//! two chats never contend with each other and two writers to the same
//! chat are serialized rather than last-writer-wins.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use postpilot_models::{ContextItem, Session};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Errors raised by session-store operations.
#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    /// No session exists for the given chat.
    #[error("no active session for chat {0}")]
    NotFound(i64),
}

/// Result type for session-store operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Keyed store of active sessions.
///
/// Keys are Telegram chat ids. The store is cheap to clone-share via
/// `Arc` and safe for concurrent use across chats.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<i64, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the session for a chat, creating it on first interaction.
    pub async fn open(&self, chat_id: i64) -> Arc<Mutex<Session>> {
        if let Some(session) = self.sessions.read().await.get(&chat_id) {
            return Arc::clone(session);
        }

        let mut sessions = self.sessions.write().await;
        // Another task may have created it between the two locks.
        Arc::clone(sessions.entry(chat_id).or_insert_with(|| {
            info!(chat_id, "Session created");
            Arc::new(Mutex::new(Session::new()))
        }))
    }

    /// Whether a session exists for the chat.
    pub async fn has_session(&self, chat_id: i64) -> bool {
        self.sessions.read().await.contains_key(&chat_id)
    }

    /// Append an interaction to a chat's history, creating the session if
    /// needed. Appends to the same chat are serialized by the session's
    /// own mutex.
    pub async fn append(&self, chat_id: i64, item: ContextItem) {
        let session = self.open(chat_id).await;
        let mut session = session.lock().await;
        session.record(item);
        debug!(chat_id, history = session.history().len(), "Interaction recorded");
    }

    /// A snapshot of a chat's history, oldest first.
    pub async fn get_history(&self, chat_id: i64) -> Result<Vec<ContextItem>> {
        let session = {
            let sessions = self.sessions.read().await;
            sessions
                .get(&chat_id)
                .cloned()
                .ok_or(SessionError::NotFound(chat_id))?
        };
        let session = session.lock().await;
        Ok(session.history().to_vec())
    }

    /// Run a closure against a chat's session under its lock.
    pub async fn with_session<F, T>(&self, chat_id: i64, f: F) -> Result<T>
    where
        F: FnOnce(&mut Session) -> T,
    {
        let session = {
            let sessions = self.sessions.read().await;
            sessions
                .get(&chat_id)
                .cloned()
                .ok_or(SessionError::NotFound(chat_id))?
        };
        let mut session = session.lock().await;
        Ok(f(&mut session))
    }

    /// End a chat's session, removing it from the registry.
    ///
    /// Returns `true` if a session existed.
    pub async fn end(&self, chat_id: i64) -> bool {
        let removed = self.sessions.write().await.remove(&chat_id).is_some();
        if removed {
            info!(chat_id, "Session ended");
        }
        removed
    }

    /// Remove all sessions idle for longer than `timeout`.
    ///
    /// Returns the chat ids that were expired.
    pub async fn expire_idle(&self, timeout: Duration) -> Vec<i64> {
        let mut expired = Vec::new();
        {
            let sessions = self.sessions.read().await;
            for (&chat_id, session) in sessions.iter() {
                let session = session.lock().await;
                if session.is_expired(timeout) {
                    expired.push(chat_id);
                }
            }
        }

        if !expired.is_empty() {
            let mut sessions = self.sessions.write().await;
            for chat_id in &expired {
                sessions.remove(chat_id);
            }
            info!(count = expired.len(), "Idle sessions expired");
        }
        expired
    }

    /// Number of active sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether the store has no active sessions.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
