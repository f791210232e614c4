//! Background eviction of audio nobody came back for.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::artifacts::ArtifactStore;

/// Runs `store.expire(ttl)` every `every` until `cancel_token` fires.
pub fn spawn_sweeper(
    store: Arc<dyn ArtifactStore>,
    ttl: Duration,
    every: Duration,
    cancel_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Audio sweeper started (ttl {}s, every {}s)",
            ttl.as_secs(),
            every.as_secs()
        );

        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match store.expire(ttl).await {
                Ok(0) => debug!("Audio sweep found nothing to evict"),
                Ok(evicted) => info!("Evicted {evicted} orphaned audio artifact(s)"),
                Err(e) => warn!("Audio sweep failed: {e}"),
            }
        }

        info!("Audio sweeper stopped");
    })
}
