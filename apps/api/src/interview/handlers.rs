//! Axum route handlers for the Interview API.

use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, FromRequest, Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::flow::{
    process_response, start_interview, transcribe_answer, RespondRequest, StartInterviewRequest,
};
use crate::models::conversation::Conversation;
use crate::state::AppState;

/// Multipart field carrying the recorded answer.
const AUDIO_FIELD: &str = "audio";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// JSON extractor whose rejections use the `{success, message}` envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartInterviewResponse {
    pub success: bool,
    pub message: String,
    pub audio_id: Uuid,
    #[serde(rename = "type")]
    pub interview_type: String,
    pub system_prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondResponse {
    pub success: bool,
    pub message: String,
    pub audio_id: Uuid,
    pub conversation: Conversation,
}

#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub success: bool,
    pub text: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/interview/start
pub async fn handle_start(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<StartInterviewRequest>,
) -> Result<Json<StartInterviewResponse>, AppError> {
    let started =
        start_interview(state.provider.as_ref(), state.artifacts.as_ref(), request).await?;

    Ok(Json(StartInterviewResponse {
        success: true,
        message: started.message,
        audio_id: started.audio_id,
        interview_type: started.interview_type,
        system_prompt: started.system_prompt,
    }))
}

/// POST /api/interview/respond
pub async fn handle_respond(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RespondRequest>,
) -> Result<Json<RespondResponse>, AppError> {
    let turn =
        process_response(state.provider.as_ref(), state.artifacts.as_ref(), request).await?;

    Ok(Json(RespondResponse {
        success: true,
        message: turn.message,
        audio_id: turn.audio_id,
        conversation: turn.conversation,
    }))
}

/// POST /api/interview/transcribe
///
/// Accepts a multipart form with the recorded answer in the `audio` field.
pub async fn handle_transcribe(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<TranscribeResponse>, AppError> {
    let mut multipart = multipart?;
    let mut audio: Option<Bytes> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(AUDIO_FIELD) {
            audio = Some(field.bytes().await?);
            break;
        }
    }

    let text = transcribe_answer(state.provider.as_ref(), audio).await?;
    Ok(Json(TranscribeResponse {
        success: true,
        text,
    }))
}

/// GET /api/interview/audio/:id
///
/// Streams the artifact as `audio/mpeg`. It is deleted once the body has been
/// fully sent; an id that is not a UUID is reported the same as an unknown one.
pub async fn handle_get_audio(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = Uuid::parse_str(&id).map_err(|_| AppError::NotFound("Audio not found".to_string()))?;

    let stream = state.artifacts.open(id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "audio/mpeg"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}
