//! Local SQLite cache of post records.
//!
//! A plain mirror of the Airtable table, keyed by post id. The schema is
//! created on open; rows are upserted so repeated saves stay idempotent.
//! Queries are small single-row operations, so the connection sits behind
//! a synchronous mutex.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use postpilot_models::{Audience, PostId, PostRecord, PostStatus, SeriesId, Tone};

use crate::error::{Result, StorageError};
use crate::store::PostStore;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS posts (
    id            TEXT PRIMARY KEY,
    series_id     TEXT,
    content       TEXT NOT NULL,
    tone          TEXT NOT NULL,
    audience      TEXT NOT NULL,
    source_title  TEXT NOT NULL,
    status        TEXT NOT NULL,
    created_at    TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts (created_at DESC);
";

/// SQLite-backed post cache.
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Open (or create) the cache database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::Database(format!("create {}: {}", parent.display(), e)))?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        info!(path = %path.display(), "Post cache opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory cache (tests).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // A poisoned lock means a panic mid-query; the connection itself
        // is still usable for subsequent statements.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of cached records.
    pub fn count(&self) -> Result<usize> {
        let conn = self.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<(String, Option<String>, String, String, String, String, String, String)> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn decode_record(
    (id, series_id, content, tone, audience, source_title, status, created_at): (
        String,
        Option<String>,
        String,
        String,
        String,
        String,
        String,
        String,
    ),
) -> Result<PostRecord> {
    let tone = Tone::parse(&tone)
        .ok_or_else(|| StorageError::MalformedRecord(format!("unknown tone `{tone}`")))?;
    let audience = Audience::parse(&audience)
        .ok_or_else(|| StorageError::MalformedRecord(format!("unknown audience `{audience}`")))?;
    let status = PostStatus::parse(&status)
        .ok_or_else(|| StorageError::MalformedRecord(format!("unknown status `{status}`")))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| StorageError::MalformedRecord(format!("bad timestamp `{created_at}`: {e}")))?
        .with_timezone(&Utc);

    Ok(PostRecord {
        id: PostId::from_string(id),
        series_id: series_id.map(SeriesId::from_string),
        content,
        tone,
        audience,
        source_title,
        status,
        created_at,
    })
}

#[async_trait]
impl PostStore for SqliteCache {
    async fn save(&self, record: &PostRecord) -> Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO posts (id, series_id, content, tone, audience, source_title, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                 series_id = excluded.series_id,
                 content = excluded.content,
                 tone = excluded.tone,
                 audience = excluded.audience,
                 source_title = excluded.source_title,
                 status = excluded.status,
                 created_at = excluded.created_at",
            params![
                record.id.as_str(),
                record.series_id.as_ref().map(|s| s.as_str()),
                record.content,
                record.tone.to_string(),
                record.audience.to_string(),
                record.source_title,
                record.status.to_string(),
                record.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            ],
        )?;
        Ok(())
    }

    async fn update_status(&self, id: &PostId, status: PostStatus) -> Result<()> {
        let conn = self.lock();
        let changed = conn.execute(
            "UPDATE posts SET status = ?1 WHERE id = ?2",
            params![status.to_string(), id.as_str()],
        )?;
        if changed == 0 {
            return Err(StorageError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn get(&self, id: &PostId) -> Result<Option<PostRecord>> {
        let row = {
            let conn = self.lock();
            conn.query_row(
                "SELECT id, series_id, content, tone, audience, source_title, status, created_at
                 FROM posts WHERE id = ?1",
                params![id.as_str()],
                row_to_record,
            )
            .optional()?
        };
        row.map(decode_record).transpose()
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<PostRecord>> {
        let rows = {
            let conn = self.lock();
            let mut stmt = conn.prepare(
                "SELECT id, series_id, content, tone, audience, source_title, status, created_at
                 FROM posts ORDER BY created_at DESC LIMIT ?1",
            )?;
            let mapped = stmt.query_map(params![limit as i64], row_to_record)?;
            mapped.collect::<rusqlite::Result<Vec<_>>>()?
        };
        rows.into_iter().map(decode_record).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(content: &str) -> PostRecord {
        PostRecord::new(content, "Title", Tone::Casual, Audience::Developers)
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let cache = SqliteCache::in_memory().unwrap();
        let rec = record("cached post").in_series(SeriesId::from_string("s-1"));

        cache.save(&rec).await.unwrap();
        let loaded = cache.get(&rec.id).await.unwrap().unwrap();

        assert_eq!(loaded.content, "cached post");
        assert_eq!(loaded.series_id, Some(SeriesId::from_string("s-1")));
        assert_eq!(loaded.status, PostStatus::Draft);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let cache = SqliteCache::in_memory().unwrap();
        let missing = cache.get(&PostId::from_string("nope")).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_save_is_upsert() {
        let cache = SqliteCache::in_memory().unwrap();
        let mut rec = record("v1");

        cache.save(&rec).await.unwrap();
        rec.content = "v2".to_string();
        cache.save(&rec).await.unwrap();

        assert_eq!(cache.count().unwrap(), 1);
        let loaded = cache.get(&rec.id).await.unwrap().unwrap();
        assert_eq!(loaded.content, "v2");
    }

    #[tokio::test]
    async fn test_update_status() {
        let cache = SqliteCache::in_memory().unwrap();
        let rec = record("post");
        cache.save(&rec).await.unwrap();

        cache
            .update_status(&rec.id, PostStatus::Published)
            .await
            .unwrap();
        let loaded = cache.get(&rec.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, PostStatus::Published);
    }

    #[tokio::test]
    async fn test_update_status_missing_is_not_found() {
        let cache = SqliteCache::in_memory().unwrap();
        let result = cache
            .update_status(&PostId::from_string("ghost"), PostStatus::Approved)
            .await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_recent_orders_newest_first() {
        let cache = SqliteCache::in_memory().unwrap();

        let mut old = record("old");
        old.created_at = Utc::now() - Duration::days(2);
        let mut mid = record("mid");
        mid.created_at = Utc::now() - Duration::days(1);
        let new = record("new");

        for rec in [&old, &new, &mid] {
            cache.save(rec).await.unwrap();
        }

        let listed = cache.list_recent(2).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].content, "new");
        assert_eq!(listed[1].content, "mid");
    }

    #[tokio::test]
    async fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/cache/posts.db");

        let cache = SqliteCache::open(&path).unwrap();
        cache.save(&record("persisted")).await.unwrap();
        assert!(path.exists());

        // Reopening sees the same data.
        drop(cache);
        let reopened = SqliteCache::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
    }
}
