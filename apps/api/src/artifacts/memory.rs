use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream;
use tracing::{debug, info};
use uuid::Uuid;

use crate::artifacts::{consume_once, ArtifactStore, ArtifactStream, StoreError};

#[derive(Debug, Clone)]
struct AudioArtifact {
    bytes: Bytes,
    created_at: DateTime<Utc>,
}

/// Process-local store. Artifacts vanish on restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryArtifactStore {
    artifacts: Arc<Mutex<HashMap<Uuid, AudioArtifact>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, AudioArtifact>> {
        // A poisoned map still holds consistent entries: every mutation is a
        // single insert or remove.
        self.artifacts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
impl MemoryArtifactStore {
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn put(&self, bytes: Bytes) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        debug!("Stored audio artifact {id} ({} bytes) in memory", bytes.len());
        self.lock().insert(
            id,
            AudioArtifact {
                bytes,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn open(&self, id: Uuid) -> Result<ArtifactStream, StoreError> {
        let bytes = self
            .lock()
            .get(&id)
            .map(|artifact| artifact.bytes.clone())
            .ok_or(StoreError::NotFound(id))?;

        let artifacts = self.artifacts.clone();
        Ok(consume_once(
            stream::iter(vec![Ok(bytes)]),
            move || async move {
                let removed = artifacts
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .remove(&id);
                if removed.is_some() {
                    info!("Audio artifact {id} delivered and deleted");
                }
            },
        ))
    }

    async fn expire(&self, max_age: Duration) -> Result<usize, StoreError> {
        let cutoff = chrono::Duration::from_std(max_age)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age));
        let Some(cutoff) = cutoff else {
            return Ok(0);
        };

        let mut artifacts = self.lock();
        let before = artifacts.len();
        artifacts.retain(|_, artifact| artifact.created_at > cutoff);
        Ok(before - artifacts.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_read_once_then_not_found() {
        let store = MemoryArtifactStore::new();
        let id = store.put(Bytes::from_static(b"speech")).await.unwrap();

        let chunks: Vec<_> = store.open(id).await.unwrap().collect().await;
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].as_ref().unwrap(), &Bytes::from_static(b"speech"));
        assert!(store.is_empty());
        assert!(matches!(store.open(id).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unfinished_read_keeps_artifact() {
        let store = MemoryArtifactStore::new();
        let id = store.put(Bytes::from_static(b"speech")).await.unwrap();

        let mut stream = store.open(id).await.unwrap();
        assert!(stream.next().await.is_some());
        drop(stream);

        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_second_reader_loses_race_after_first_finishes() {
        let store = MemoryArtifactStore::new();
        let id = store.put(Bytes::from_static(b"speech")).await.unwrap();

        let first = store.open(id).await.unwrap();
        let second = store.open(id).await.unwrap();
        let _: Vec<_> = first.collect().await;

        // Both were opened before deletion; the second still drains cleanly.
        let _: Vec<_> = second.collect().await;
        assert!(matches!(store.open(id).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_expire_removes_old_artifacts_only() {
        let store = MemoryArtifactStore::new();
        store.put(Bytes::from_static(b"a")).await.unwrap();
        store.put(Bytes::from_static(b"b")).await.unwrap();

        assert_eq!(store.expire(Duration::from_secs(3600)).await.unwrap(), 0);
        assert_eq!(store.len(), 2);
        assert_eq!(store.expire(Duration::ZERO).await.unwrap(), 2);
        assert!(store.is_empty());
    }
}
