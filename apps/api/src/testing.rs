//! In-process provider double shared by unit and router tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use crate::models::conversation::Message;
use crate::provider::{ProviderError, SpeechTextProvider};

/// Answers every completion with a fixed reply and records what it was sent.
pub struct ScriptedProvider {
    reply: String,
    fail_completion: bool,
    fail_speech: bool,
    completions: Mutex<Vec<(Vec<Message>, String)>>,
    speech_calls: AtomicUsize,
    transcription_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            fail_completion: false,
            fail_speech: false,
            completions: Mutex::new(Vec::new()),
            speech_calls: AtomicUsize::new(0),
            transcription_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_completion(mut self) -> Self {
        self.fail_completion = true;
        self
    }

    pub fn failing_speech(mut self) -> Self {
        self.fail_speech = true;
        self
    }

    /// The audio this double "synthesizes" for `text`.
    pub fn speech_for(text: &str) -> Vec<u8> {
        let mut audio = b"ID3".to_vec();
        audio.extend_from_slice(text.as_bytes());
        audio
    }

    pub fn completion_calls(&self) -> Vec<(Vec<Message>, String)> {
        self.completions.lock().unwrap().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.completions.lock().unwrap().len()
            + self.speech_calls.load(Ordering::SeqCst)
            + self.transcription_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechTextProvider for ScriptedProvider {
    async fn generate_reply(
        &self,
        conversation: &[Message],
        system_prompt: &str,
    ) -> Result<Message, ProviderError> {
        self.completions
            .lock()
            .unwrap()
            .push((conversation.to_vec(), system_prompt.to_string()));
        if self.fail_completion {
            return Err(ProviderError::Api {
                status: 503,
                message: "completion unavailable".to_string(),
            });
        }
        Ok(Message::assistant(self.reply.clone()))
    }

    async fn synthesize_speech(&self, text: &str) -> Result<Bytes, ProviderError> {
        self.speech_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_speech {
            return Err(ProviderError::Api {
                status: 500,
                message: "speech unavailable".to_string(),
            });
        }
        Ok(Bytes::from(Self::speech_for(text)))
    }

    async fn transcribe_speech(&self, audio: Bytes) -> Result<String, ProviderError> {
        self.transcription_calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("transcript of {} bytes", audio.len()))
    }
}
