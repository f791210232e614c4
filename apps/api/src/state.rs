use std::sync::Arc;

use crate::artifacts::ArtifactStore;
use crate::config::Config;
use crate::provider::SpeechTextProvider;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable provider. Default: OpenAiProvider built from `config.provider`.
    pub provider: Arc<dyn SpeechTextProvider>,
    /// Where synthesized audio waits for its single download.
    pub artifacts: Arc<dyn ArtifactStore>,
    pub config: Config,
}
