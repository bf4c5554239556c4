//! The `PostStore` trait and the write-through composition.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use postpilot_models::{PostId, PostRecord, PostStatus};

use crate::error::Result;

/// Trait for post storage backends.
///
/// Implementations must support create, status update, lookup, and a
/// recency-ordered listing. All operations are async to support both the
/// remote and local backends.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Persist a record. Saving an existing id updates it in place.
    async fn save(&self, record: &PostRecord) -> Result<()>;

    /// Update the lifecycle status of an existing record.
    async fn update_status(&self, id: &PostId, status: PostStatus) -> Result<()>;

    /// Fetch a record by id.
    async fn get(&self, id: &PostId) -> Result<Option<PostRecord>>;

    /// The most recent records, newest first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<PostRecord>>;
}

/// Write-through composition of a remote source of truth and a local cache.
///
/// Writes go to the remote first; only after the remote accepts them is
/// the cache updated, best-effort. Reads prefer the cache and fall back to
/// the remote. Cache failures are logged, never fatal.
pub struct WriteThroughStore {
    remote: Arc<dyn PostStore>,
    cache: Option<Arc<dyn PostStore>>,
}

impl WriteThroughStore {
    /// Compose a remote store with an optional cache.
    pub fn new(remote: Arc<dyn PostStore>, cache: Option<Arc<dyn PostStore>>) -> Self {
        Self { remote, cache }
    }

    /// Whether a cache is attached.
    pub fn has_cache(&self) -> bool {
        self.cache.is_some()
    }
}

#[async_trait]
impl PostStore for WriteThroughStore {
    async fn save(&self, record: &PostRecord) -> Result<()> {
        self.remote.save(record).await?;
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.save(record).await {
                warn!(post_id = %record.id, error = %e, "Cache write failed");
            }
        }
        Ok(())
    }

    async fn update_status(&self, id: &PostId, status: PostStatus) -> Result<()> {
        self.remote.update_status(id, status).await?;
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.update_status(id, status).await {
                warn!(post_id = %id, error = %e, "Cache status update failed");
            }
        }
        Ok(())
    }

    async fn get(&self, id: &PostId) -> Result<Option<PostRecord>> {
        if let Some(cache) = &self.cache {
            match cache.get(id).await {
                Ok(Some(record)) => {
                    debug!(post_id = %id, "Cache hit");
                    return Ok(Some(record));
                }
                Ok(None) => {}
                Err(e) => warn!(post_id = %id, error = %e, "Cache read failed"),
            }
        }
        self.remote.get(id).await
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<PostRecord>> {
        if let Some(cache) = &self.cache {
            match cache.list_recent(limit).await {
                Ok(records) if !records.is_empty() => return Ok(records),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Cache listing failed"),
            }
        }
        self.remote.list_recent(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use postpilot_models::{Audience, Tone};
    use tokio::sync::RwLock;

    /// In-memory implementation for testing compositions.
    #[derive(Default)]
    struct MemStore {
        records: RwLock<Vec<PostRecord>>,
        fail: bool,
    }

    impl MemStore {
        fn failing() -> Self {
            Self {
                records: RwLock::new(Vec::new()),
                fail: true,
            }
        }

        fn check(&self) -> Result<()> {
            if self.fail {
                Err(StorageError::Database("store offline".into()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl PostStore for MemStore {
        async fn save(&self, record: &PostRecord) -> Result<()> {
            self.check()?;
            let mut records = self.records.write().await;
            records.retain(|r| r.id != record.id);
            records.push(record.clone());
            Ok(())
        }

        async fn update_status(&self, id: &PostId, status: PostStatus) -> Result<()> {
            self.check()?;
            let mut records = self.records.write().await;
            let record = records
                .iter_mut()
                .find(|r| &r.id == id)
                .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
            record.status = status;
            Ok(())
        }

        async fn get(&self, id: &PostId) -> Result<Option<PostRecord>> {
            self.check()?;
            let records = self.records.read().await;
            Ok(records.iter().find(|r| &r.id == id).cloned())
        }

        async fn list_recent(&self, limit: usize) -> Result<Vec<PostRecord>> {
            self.check()?;
            let records = self.records.read().await;
            let mut sorted: Vec<PostRecord> = records.clone();
            sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            sorted.truncate(limit);
            Ok(sorted)
        }
    }

    fn record(content: &str) -> PostRecord {
        PostRecord::new(content, "Title", Tone::Casual, Audience::Developers)
    }

    #[tokio::test]
    async fn test_save_writes_both_layers() {
        let remote = Arc::new(MemStore::default());
        let cache = Arc::new(MemStore::default());
        let store = WriteThroughStore::new(remote.clone(), Some(cache.clone()));

        let rec = record("hello");
        store.save(&rec).await.unwrap();

        assert!(remote.get(&rec.id).await.unwrap().is_some());
        assert!(cache.get(&rec.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_remote_failure_is_fatal() {
        let remote = Arc::new(MemStore::failing());
        let cache = Arc::new(MemStore::default());
        let store = WriteThroughStore::new(remote, Some(cache.clone()));

        let rec = record("hello");
        assert!(store.save(&rec).await.is_err());
        // The cache must not contain a record the source of truth rejected.
        assert!(cache.get(&rec.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cache_failure_is_not_fatal() {
        let remote = Arc::new(MemStore::default());
        let cache = Arc::new(MemStore::failing());
        let store = WriteThroughStore::new(remote.clone(), Some(cache));

        let rec = record("hello");
        store.save(&rec).await.unwrap();
        assert!(remote.get(&rec.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_get_prefers_cache_and_falls_back() {
        let remote = Arc::new(MemStore::default());
        let cache = Arc::new(MemStore::default());

        // Record exists only in the remote.
        let rec = record("remote only");
        remote.save(&rec).await.unwrap();

        let store = WriteThroughStore::new(remote, Some(cache));
        let found = store.get(&rec.id).await.unwrap();
        assert_eq!(found.unwrap().content, "remote only");
    }

    #[tokio::test]
    async fn test_update_status_propagates() {
        let remote = Arc::new(MemStore::default());
        let cache = Arc::new(MemStore::default());
        let store = WriteThroughStore::new(remote.clone(), Some(cache.clone()));

        let rec = record("post");
        store.save(&rec).await.unwrap();
        store
            .update_status(&rec.id, PostStatus::Approved)
            .await
            .unwrap();

        assert_eq!(
            remote.get(&rec.id).await.unwrap().unwrap().status,
            PostStatus::Approved
        );
        assert_eq!(
            cache.get(&rec.id).await.unwrap().unwrap().status,
            PostStatus::Approved
        );
    }

    #[tokio::test]
    async fn test_no_cache_goes_straight_to_remote() {
        let remote = Arc::new(MemStore::default());
        let store = WriteThroughStore::new(remote.clone(), None);
        assert!(!store.has_cache());

        let rec = record("direct");
        store.save(&rec).await.unwrap();
        assert!(store.get(&rec.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_recent_falls_back_when_cache_empty() {
        let remote = Arc::new(MemStore::default());
        let cache = Arc::new(MemStore::default());

        let rec = record("older");
        remote.save(&rec).await.unwrap();

        let store = WriteThroughStore::new(remote, Some(cache));
        let listed = store.list_recent(10).await.unwrap();
        assert_eq!(listed.len(), 1);
    }
}
