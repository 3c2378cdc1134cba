use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use planbot_protocol::{AuditRecord, AuditUpdate};
use serde::{Deserialize, Serialize};

use crate::error::{ResponderError, Result};

/// Durable per-post record store: one upsert, then field-level updates.
/// Timestamps are assigned by the store, not the caller.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Create or replace the record for `id`, stamping `processed_timestamp`.
    async fn set(&self, id: &str, record: AuditRecord) -> Result<()>;

    /// Merge `update` into the existing record for `id`.
    async fn update(&self, id: &str, update: AuditUpdate) -> Result<()>;
}

fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

/// One JSON file per post id.
#[derive(Debug, Clone)]
pub struct JsonDirAuditStore {
    dir: PathBuf,
}

impl JsonDirAuditStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn record_path(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(ResponderError::Audit(format!("invalid record id '{id}'")));
        }
        Ok(self.dir.join(format!("{id}.json")))
    }

    /// Read back a stored record.
    pub async fn get(&self, id: &str) -> Result<Option<AuditRecord>> {
        let path = self.record_path(id)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn write(&self, path: &Path, record: &AuditRecord) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let bytes = serde_json::to_vec_pretty(record)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        if let Err(err) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(err.into());
        }
        Ok(())
    }
}

#[async_trait]
impl AuditStore for JsonDirAuditStore {
    async fn set(&self, id: &str, mut record: AuditRecord) -> Result<()> {
        let path = self.record_path(id)?;
        record.processed_timestamp = Some(now_millis());
        self.write(&path, &record).await
    }

    async fn update(&self, id: &str, update: AuditUpdate) -> Result<()> {
        let path = self.record_path(id)?;
        let mut record = self
            .get(id)
            .await?
            .ok_or_else(|| ResponderError::Audit(format!("no audit record for '{id}'")))?;
        record.apply(&update, now_millis());
        self.write(&path, &record).await
    }
}

/// A write as seen by [`MemoryAuditStore`], in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AuditWrite {
    Set { id: String, record: AuditRecord },
    Update { id: String, update: AuditUpdate },
}

#[derive(Debug, Default)]
struct MemoryState {
    records: HashMap<String, AuditRecord>,
    writes: Vec<AuditWrite>,
}

/// In-memory store; clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryAuditStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<AuditRecord> {
        self.lock().records.get(id).cloned()
    }

    #[must_use]
    pub fn writes(&self) -> Vec<AuditWrite> {
        self.lock().writes.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn set(&self, id: &str, mut record: AuditRecord) -> Result<()> {
        record.processed_timestamp = Some(now_millis());
        let mut state = self.lock();
        state.writes.push(AuditWrite::Set {
            id: id.to_string(),
            record: record.clone(),
        });
        state.records.insert(id.to_string(), record);
        Ok(())
    }

    async fn update(&self, id: &str, update: AuditUpdate) -> Result<()> {
        let mut state = self.lock();
        let record = state
            .records
            .get_mut(id)
            .ok_or_else(|| ResponderError::Audit(format!("no audit record for '{id}'")))?;
        record.apply(&update, now_millis());
        state.writes.push(AuditWrite::Update {
            id: id.to_string(),
            update,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planbot_protocol::{Post, ReplyType, ServerTimestamp};
    use tempfile::TempDir;

    fn replied_update() -> AuditUpdate {
        AuditUpdate {
            reply_type: Some(ReplyType::Plan),
            replied: true,
            reply_timestamp: Some(ServerTimestamp),
            ..AuditUpdate::default()
        }
    }

    #[tokio::test]
    async fn json_dir_store_sets_then_merges_updates() {
        let temp = TempDir::new().unwrap();
        let store = JsonDirAuditStore::new(temp.path().join("audit"));
        let post = Post::submission("abc123", Some("someone"), "!warrenplanbot taxes");

        let mut record = AuditRecord::for_post(&post);
        record.processed = true;
        store.set("abc123", record).await.unwrap();
        let stored = store.get("abc123").await.unwrap().unwrap();
        assert!(stored.processed_timestamp.is_some());
        assert!(!stored.replied);

        store.update("abc123", replied_update()).await.unwrap();
        let updated = store.get("abc123").await.unwrap().unwrap();
        assert!(updated.replied);
        assert_eq!(updated.reply_type, Some(ReplyType::Plan));
        assert!(updated.reply_timestamp.is_some());
        assert_eq!(updated.post_text, "!warrenplanbot taxes");
    }

    #[tokio::test]
    async fn update_without_record_fails() {
        let temp = TempDir::new().unwrap();
        let store = JsonDirAuditStore::new(temp.path());
        assert!(store.update("missing", replied_update()).await.is_err());
        assert!(MemoryAuditStore::new()
            .update("missing", replied_update())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn path_like_ids_are_rejected() {
        let temp = TempDir::new().unwrap();
        let store = JsonDirAuditStore::new(temp.path());
        let post = Post::submission("x", Some("a"), "t");
        assert!(store.set("../x", AuditRecord::for_post(&post)).await.is_err());
    }

    #[tokio::test]
    async fn memory_store_keeps_write_order() {
        let store = MemoryAuditStore::new();
        let shared = store.clone();
        let post = Post::submission("p1", Some("a"), "t");
        store.set("p1", AuditRecord::for_post(&post)).await.unwrap();
        store.update("p1", replied_update()).await.unwrap();

        let writes = shared.writes();
        assert_eq!(writes.len(), 2);
        assert!(matches!(writes[0], AuditWrite::Set { .. }));
        assert!(matches!(writes[1], AuditWrite::Update { .. }));
        assert!(shared.get("p1").unwrap().replied);
    }
}
