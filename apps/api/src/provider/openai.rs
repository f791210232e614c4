//! OpenAI-compatible implementation of [`SpeechTextProvider`].

use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, Client, Response};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::models::conversation::{Message, Role};
use crate::provider::speech::SpeechPayload;
use crate::provider::{effective_system_prompt, ProviderConfig, ProviderError, SpeechTextProvider};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize, PartialEq)]
struct ChatMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    role: Role,
    content: Option<String>,
}

/// Compatible upstreams often report only part of this, e.g. `total_tokens`.
#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    config: ProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn completion_model(&self) -> &str {
        &self.config.completion_model
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path)
    }

    /// Transcribes `audio` through a temporary file created inside `dir`.
    /// The file is gone when this returns, whatever the outcome.
    async fn transcribe_in(&self, dir: &Path, audio: Bytes) -> Result<String, ProviderError> {
        let temp = tempfile::Builder::new()
            .prefix("interview-answer-")
            .suffix(".webm")
            .tempfile_in(dir)?;
        tokio::fs::write(temp.path(), &audio).await?;

        let result = self.send_transcription(temp.path()).await;

        // Cleanup problems are logged; the caller sees the transcription outcome.
        if let Err(e) = temp.close() {
            warn!("Failed to remove temporary transcription file: {e}");
        }

        result
    }

    async fn send_transcription(&self, path: &Path) -> Result<String, ProviderError> {
        let file = tokio::fs::File::open(path).await?;
        let part = multipart::Part::stream(reqwest::Body::wrap_stream(ReaderStream::new(file)))
            .file_name("answer.webm")
            .mime_str("audio/webm")?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("model", self.config.transcription_model.clone())
            .text("language", self.config.transcription_language.clone());

        let response = self
            .client
            .post(self.endpoint("audio/transcriptions"))
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .await?;

        let transcription: TranscriptionResponse = check_status(response).await?.json().await?;
        Ok(transcription.text)
    }
}

#[async_trait]
impl SpeechTextProvider for OpenAiProvider {
    async fn generate_reply(
        &self,
        conversation: &[Message],
        system_prompt: &str,
    ) -> Result<Message, ProviderError> {
        let request = ChatRequest {
            model: &self.config.completion_model,
            messages: chat_messages(conversation, system_prompt),
        };

        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let chat: ChatResponse = check_status(response).await?.json().await?;
        if let Some(usage) = &chat.usage {
            debug!(
                "Completion succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        extract_reply(chat)
    }

    async fn synthesize_speech(&self, text: &str) -> Result<Bytes, ProviderError> {
        let request = SpeechRequest {
            model: &self.config.tts_model,
            voice: &self.config.tts_voice,
            input: text,
            response_format: "mp3",
        };

        let response = self
            .client
            .post(self.endpoint("audio/speech"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let payload = SpeechPayload::from_response(check_status(response).await?).await?;
        debug!("Speech response classified as {payload:?}");

        let audio = payload.into_bytes().await?;
        debug!("Synthesized {} bytes of speech", audio.len());
        Ok(audio)
    }

    async fn transcribe_speech(&self, audio: Bytes) -> Result<String, ProviderError> {
        self.transcribe_in(&std::env::temp_dir(), audio).await
    }
}

/// Builds the upstream message list: one system message, then the history.
fn chat_messages<'a>(conversation: &'a [Message], system_prompt: &'a str) -> Vec<ChatMessage<'a>> {
    std::iter::once(ChatMessage {
        role: Role::System,
        content: effective_system_prompt(system_prompt),
    })
    .chain(conversation.iter().map(|m| ChatMessage {
        role: m.role,
        content: &m.content,
    }))
    .collect()
}

fn extract_reply(chat: ChatResponse) -> Result<Message, ProviderError> {
    let choice = chat
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::Malformed("completion returned no choices".to_string()))?;

    let content = choice
        .message
        .content
        .ok_or_else(|| ProviderError::Malformed("completion choice has no content".to_string()))?;

    Ok(Message {
        role: choice.message.role,
        content,
    })
}

/// Passes 2xx responses through; turns anything else into `ProviderError::Api`.
async fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!("AI provider returned {}: {}", status, body);
    let message = serde_json::from_str::<OpenAiError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);

    Err(ProviderError::Api {
        status: status.as_u16(),
        message,
    })
}
