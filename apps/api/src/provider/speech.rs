//! Normalization of text-to-speech responses.
//!
//! Upstream speech endpoints (and the proxies placed in front of them) do not
//! agree on a single response shape. Every accepted shape is listed in
//! [`SpeechShape`]; anything else is rejected instead of guessed at.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::{Bytes, BytesMut};
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;

use crate::provider::ProviderError;

/// The closed set of response shapes a speech call may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechShape {
    /// Binary audio with a known length, read in one go.
    Buffered,
    /// Binary audio of unknown length, read chunk by chunk until EOF.
    Streamed,
    /// JSON envelope carrying base64 audio under `audio` or `data`.
    Base64Json,
}

/// A speech response after classification but before it is read.
pub enum SpeechPayload {
    Buffered(Bytes),
    Streamed(BoxStream<'static, Result<Bytes, ProviderError>>),
    Base64Json(Value),
}

impl std::fmt::Debug for SpeechPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpeechPayload::Buffered(b) => write!(f, "Buffered({} bytes)", b.len()),
            SpeechPayload::Streamed(_) => write!(f, "Streamed(..)"),
            SpeechPayload::Base64Json(_) => write!(f, "Base64Json(..)"),
        }
    }
}

/// Decides which shape a response has from its headers alone.
pub fn classify(
    content_type: Option<&str>,
    content_length: Option<u64>,
) -> Result<SpeechShape, ProviderError> {
    let mime = content_type
        .map(|ct| ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .unwrap_or_default();

    if mime.starts_with("audio/") || mime == "application/octet-stream" {
        return Ok(match content_length {
            Some(_) => SpeechShape::Buffered,
            None => SpeechShape::Streamed,
        });
    }

    if mime == "application/json" {
        return Ok(SpeechShape::Base64Json);
    }

    Err(ProviderError::UnrecognizedSpeechShape(if mime.is_empty() {
        "missing content type".to_string()
    } else {
        format!("content type '{mime}'")
    }))
}

impl SpeechPayload {
    /// Classifies an HTTP response and wraps its body in the matching variant.
    pub async fn from_response(response: reqwest::Response) -> Result<Self, ProviderError> {
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        match classify(content_type.as_deref(), response.content_length())? {
            SpeechShape::Buffered => Ok(SpeechPayload::Buffered(response.bytes().await?)),
            SpeechShape::Streamed => Ok(SpeechPayload::Streamed(
                response
                    .bytes_stream()
                    .map(|chunk| chunk.map_err(ProviderError::from))
                    .boxed(),
            )),
            SpeechShape::Base64Json => Ok(SpeechPayload::Base64Json(response.json().await?)),
        }
    }

    /// Collapses any shape into one contiguous audio buffer.
    pub async fn into_bytes(self) -> Result<Bytes, ProviderError> {
        let bytes = match self {
            SpeechPayload::Buffered(bytes) => bytes,
            SpeechPayload::Streamed(mut stream) => {
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                buf.freeze()
            }
            SpeechPayload::Base64Json(value) => {
                let encoded = ["audio", "data"]
                    .iter()
                    .find_map(|key| value.get(*key).and_then(Value::as_str))
                    .ok_or_else(|| {
                        ProviderError::UnrecognizedSpeechShape(
                            "JSON body without an 'audio' or 'data' string".to_string(),
                        )
                    })?;
                STANDARD
                    .decode(encoded.trim())
                    .map(Bytes::from)
                    .map_err(|e| ProviderError::Malformed(format!("invalid base64 audio: {e}")))?
            }
        };

        if bytes.is_empty() {
            return Err(ProviderError::Malformed(
                "speech response contained no audio".to_string(),
            ));
        }
        Ok(bytes)
    }
}
