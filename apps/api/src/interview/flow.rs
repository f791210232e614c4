//! Interview Flow Controller.
//!
//! Flow per turn: validate → extend conversation → generate reply →
//! synthesize speech → store artifact → return.
//!
//! Stateless: the system prompt and conversation travel with every request,
//! and the only thing left behind is the stored audio. The artifact is
//! written only after both provider calls succeeded, so a failed turn leaves
//! nothing behind.

use bytes::Bytes;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::artifacts::ArtifactStore;
use crate::errors::AppError;
use crate::interview::prompts::{resolve_system_prompt, FEEDBACK_INSTRUCTION, OPENING_REQUEST};
use crate::models::conversation::{Conversation, Message};
use crate::provider::SpeechTextProvider;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Request body for starting an interview.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartInterviewRequest {
    #[serde(rename = "type")]
    pub interview_type: Option<String>,
    pub custom_requirements: Option<String>,
    pub system_prompt: Option<String>,
}

/// Request body for one candidate turn.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondRequest {
    pub user_response: Option<String>,
    pub conversation: Option<Vec<Message>>,
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StartedInterview {
    pub message: String,
    pub audio_id: Uuid,
    pub interview_type: String,
    pub system_prompt: String,
}

#[derive(Debug, Clone)]
pub struct ProcessedTurn {
    pub message: String,
    pub audio_id: Uuid,
    pub conversation: Conversation,
}

// ────────────────────────────────────────────────────────────────────────────
// Operations
// ────────────────────────────────────────────────────────────────────────────

/// Opens an interview: resolves the system prompt and voices the first question.
pub async fn start_interview(
    provider: &dyn SpeechTextProvider,
    artifacts: &dyn ArtifactStore,
    request: StartInterviewRequest,
) -> Result<StartedInterview, AppError> {
    let interview_type = required(request.interview_type, "Interview type is required")?;

    let system_prompt = resolve_system_prompt(
        request.system_prompt.as_deref(),
        request.custom_requirements.as_deref(),
    );

    info!("Starting '{interview_type}' interview");

    let reply = provider
        .generate_reply(&[Message::user(OPENING_REQUEST)], &system_prompt)
        .await?;
    let audio_id = voice(provider, artifacts, &reply.content).await?;

    Ok(StartedInterview {
        message: reply.content,
        audio_id,
        interview_type,
        system_prompt,
    })
}

/// Processes one candidate answer.
///
/// The returned conversation is the submitted one plus, in order, the
/// candidate's answer, the feedback instruction and the interviewer's reply.
pub async fn process_response(
    provider: &dyn SpeechTextProvider,
    artifacts: &dyn ArtifactStore,
    request: RespondRequest,
) -> Result<ProcessedTurn, AppError> {
    const INCOMPLETE: &str = "userResponse, conversation and systemPrompt are required";

    let user_response = required(request.user_response, INCOMPLETE)?;
    let conversation = request
        .conversation
        .ok_or_else(|| AppError::Validation(INCOMPLETE.to_string()))?;
    let system_prompt = required(request.system_prompt, INCOMPLETE)?;

    let prompt_history = Conversation::from_client(conversation)
        .append(Message::user(user_response))
        .append(Message::user(FEEDBACK_INSTRUCTION));

    let reply = provider
        .generate_reply(prompt_history.messages(), &system_prompt)
        .await?;
    let audio_id = voice(provider, artifacts, &reply.content).await?;

    let message = reply.content.clone();
    let conversation = prompt_history.append(reply);
    info!(
        "Processed candidate turn, conversation now has {} messages",
        conversation.len()
    );

    Ok(ProcessedTurn {
        message,
        audio_id,
        conversation,
    })
}

/// Transcribes a recorded candidate answer.
pub async fn transcribe_answer(
    provider: &dyn SpeechTextProvider,
    audio: Option<Bytes>,
) -> Result<String, AppError> {
    let audio = audio
        .filter(|a| !a.is_empty())
        .ok_or_else(|| AppError::Validation("An 'audio' file is required".to_string()))?;

    info!("Transcribing {} bytes of candidate audio", audio.len());
    Ok(provider.transcribe_speech(audio).await?)
}

/// Synthesizes `text` and stores the audio, returning its artifact id.
async fn voice(
    provider: &dyn SpeechTextProvider,
    artifacts: &dyn ArtifactStore,
    text: &str,
) -> Result<Uuid, AppError> {
    let audio = provider.synthesize_speech(text).await?;
    Ok(artifacts.put(audio).await?)
}

fn required(value: Option<String>, message: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Validation(message.to_string()))
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
