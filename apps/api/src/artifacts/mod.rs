//! Audio Artifact Store: synthesized speech held between creation and its
//! single download.
//!
//! Lifecycle of an artifact:
//! 1. `put` stores the bytes under a fresh UUID.
//! 2. `open` streams them back; the artifact is deleted only once the stream
//!    reaches a clean end. A read error leaves it in place.
//! 3. Artifacts never fetched are reclaimed by `expire` (see [`sweeper`]).
//!
//! There is no locking. The first reader to finish deletes the artifact and
//! every later `open` gets `NotFound`.

use std::future::Future;
use std::io;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use thiserror::Error;
use uuid::Uuid;

pub mod fs;
pub mod memory;
pub mod sweeper;

pub use fs::FsArtifactStore;
pub use memory::MemoryArtifactStore;

/// Audio bytes as they are handed to the HTTP body.
pub type ArtifactStream = BoxStream<'static, io::Result<Bytes>>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("audio artifact {0} not found")]
    NotFound(Uuid),

    #[error("audio artifact I/O error: {0}")]
    Io(#[from] io::Error),
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persists `bytes` under a newly generated id.
    async fn put(&self, bytes: Bytes) -> Result<Uuid, StoreError>;

    /// Streams an artifact; it is deleted after the last chunk is yielded.
    async fn open(&self, id: Uuid) -> Result<ArtifactStream, StoreError>;

    /// Deletes every artifact older than `max_age` and returns how many went.
    async fn expire(&self, max_age: Duration) -> Result<usize, StoreError>;
}

/// Wraps `chunks` so `on_complete` runs once the stream ends cleanly.
///
/// On the first error the stream yields it and stops without running
/// `on_complete`; a dropped stream never runs it either.
pub(crate) fn consume_once<S, F, Fut>(chunks: S, on_complete: F) -> ArtifactStream
where
    S: Stream<Item = io::Result<Bytes>> + Send + Unpin + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    stream::unfold(
        (Some(chunks), Some(on_complete)),
        |(chunks, on_complete)| async move {
            let mut chunks = match chunks {
                Some(chunks) => chunks,
                None => return None,
            };
            match chunks.next().await {
                Some(Ok(chunk)) => Some((Ok(chunk), (Some(chunks), on_complete))),
                Some(Err(e)) => Some((Err(e), (None, None))),
                None => {
                    if let Some(on_complete) = on_complete {
                        on_complete().await;
                    }
                    None
                }
            }
        },
    )
    .boxed()
}
