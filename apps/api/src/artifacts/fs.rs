use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use bytes::Bytes;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::artifacts::{consume_once, ArtifactStore, ArtifactStream, StoreError};

const EXTENSION: &str = "mp3";
const PARTIAL_EXTENSION: &str = "part";

/// One `<id>.mp3` file per artifact inside a dedicated directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    dir: PathBuf,
}

impl FsArtifactStore {
    /// Opens the store, creating `dir` if it does not exist yet.
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        info!("Audio artifacts stored in {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.{EXTENSION}"))
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put(&self, bytes: Bytes) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        let path = self.path_for(id);

        // Written under a temporary name so a half-written file is never served.
        let partial = path.with_extension(format!("{EXTENSION}.{PARTIAL_EXTENSION}"));
        tokio::fs::write(&partial, &bytes).await?;
        tokio::fs::rename(&partial, &path).await?;

        debug!("Stored audio artifact {id} ({} bytes)", bytes.len());
        Ok(id)
    }

    async fn open(&self, id: Uuid) -> Result<ArtifactStream, StoreError> {
        let path = self.path_for(id);
        let file = match tokio::fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(StoreError::NotFound(id)),
            Err(e) => return Err(StoreError::Io(e)),
        };

        Ok(consume_once(ReaderStream::new(file), move || async move {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => info!("Audio artifact {id} delivered and deleted"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("Audio artifact {id} was already deleted by another reader")
                }
                Err(e) => warn!("Failed to delete delivered audio artifact {id}: {e}"),
            }
        }))
    }

    async fn expire(&self, max_age: Duration) -> Result<usize, StoreError> {
        let now = SystemTime::now();
        let mut evicted = 0;
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let managed = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some(EXTENSION) | Some(PARTIAL_EXTENSION)
            );
            if !managed {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                // Deleted by a concurrent reader between listing and stat.
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StoreError::Io(e)),
            };

            let age = metadata
                .modified()
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .unwrap_or_default();
            if age < max_age {
                continue;
            }

            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!("Evicted orphaned audio artifact {}", path.display());
                    evicted += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to evict {}: {e}", path.display()),
            }
        }

        Ok(evicted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tempfile::tempdir;

    async fn read_all(mut stream: ArtifactStream) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_new_creates_missing_directory() {
        let dir = tempdir().expect("tempdir");
        let nested = dir.path().join("audio").join("out");
        let store = FsArtifactStore::new(&nested).await.unwrap();
        assert!(store.dir().is_dir());
    }

    #[tokio::test]
    async fn test_put_writes_file_named_by_id() {
        let dir = tempdir().expect("tempdir");
        let store = FsArtifactStore::new(dir.path()).await.unwrap();

        let id = store.put(Bytes::from_static(b"ID3audio")).await.unwrap();

        let written = std::fs::read(dir.path().join(format!("{id}.mp3"))).unwrap();
        assert_eq!(written, b"ID3audio");
    }

    #[tokio::test]
    async fn test_full_read_returns_bytes_then_deletes() {
        let dir = tempdir().expect("tempdir");
        let store = FsArtifactStore::new(dir.path()).await.unwrap();
        let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();

        let id = store.put(Bytes::from(payload.clone())).await.unwrap();
        let read = read_all(store.open(id).await.unwrap()).await;

        assert_eq!(read, payload);
        assert!(!dir.path().join(format!("{id}.mp3")).exists());
        assert!(matches!(store.open(id).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_abandoned_read_keeps_artifact() {
        let dir = tempdir().expect("tempdir");
        let store = FsArtifactStore::new(dir.path()).await.unwrap();
        let id = store.put(Bytes::from(vec![7u8; 100_000])).await.unwrap();

        let mut stream = store.open(id).await.unwrap();
        assert!(stream.next().await.is_some());
        drop(stream);

        assert!(dir.path().join(format!("{id}.mp3")).exists());
        let read = read_all(store.open(id).await.unwrap()).await;
        assert_eq!(read.len(), 100_000);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let dir = tempdir().expect("tempdir");
        let store = FsArtifactStore::new(dir.path()).await.unwrap();
        assert!(matches!(
            store.open(Uuid::new_v4()).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_expire_removes_old_artifacts_only() {
        let dir = tempdir().expect("tempdir");
        let store = FsArtifactStore::new(dir.path()).await.unwrap();
        store.put(Bytes::from_static(b"a")).await.unwrap();
        store.put(Bytes::from_static(b"b")).await.unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"unrelated").unwrap();

        assert_eq!(store.expire(Duration::from_secs(3600)).await.unwrap(), 0);
        assert_eq!(store.expire(Duration::ZERO).await.unwrap(), 2);
        assert!(dir.path().join("notes.txt").exists());
    }
}
