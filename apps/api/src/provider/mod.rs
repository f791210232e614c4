/// Speech/Text provider: the single boundary to the generative-AI API.
///
/// Every outbound call (completion, text-to-speech, transcription) goes
/// through a `SpeechTextProvider`. Calls are billed and non-idempotent
/// upstream, so nothing here retries.
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::models::conversation::Message;

pub mod openai;
pub mod speech;

pub use openai::OpenAiProvider;

/// Persona used when a completion request arrives without a system prompt.
pub const DEFAULT_ASSISTANT_PERSONA: &str = "You are Fernanda, an expert recruiter at DevClub. \
    You specialize in career transitions and help programmers land jobs. \
    Be professional but friendly.";

/// Explicit provider settings, injected at construction.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub base_url: String,
    pub completion_model: String,
    pub tts_model: String,
    pub tts_voice: String,
    pub transcription_model: String,
    pub transcription_language: String,
    pub request_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to reach the AI provider: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI provider returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("malformed AI provider response: {0}")]
    Malformed(String),

    #[error("unrecognized speech response shape: {0}")]
    UnrecognizedSpeechShape(String),

    #[error("temporary audio file error: {0}")]
    TempFile(#[from] std::io::Error),
}

/// Text completion, text-to-speech and speech-to-text, each one network call.
#[async_trait]
pub trait SpeechTextProvider: Send + Sync {
    /// Prepends the system prompt (or [`DEFAULT_ASSISTANT_PERSONA`] when blank)
    /// and returns the model's reply.
    async fn generate_reply(
        &self,
        conversation: &[Message],
        system_prompt: &str,
    ) -> Result<Message, ProviderError>;

    async fn synthesize_speech(&self, text: &str) -> Result<Bytes, ProviderError>;

    async fn transcribe_speech(&self, audio: Bytes) -> Result<String, ProviderError>;
}

/// Resolves the system prompt actually sent upstream.
pub fn effective_system_prompt(system_prompt: &str) -> &str {
    if system_prompt.trim().is_empty() {
        DEFAULT_ASSISTANT_PERSONA
    } else {
        system_prompt
    }
}
