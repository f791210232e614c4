#![allow(dead_code)]

use serde::{Deserialize, Serialize};

/// Who authored a message in the prompt history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One entry of the interview transcript. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered, append-only message log owned by the client.
///
/// Serializes as a plain JSON array so it round-trips through the client
/// unchanged. The server keeps no copy between requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation(Vec<Message>);

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a conversation from a client payload.
    ///
    /// System messages are injected by the provider on every call, so any the
    /// client echoes back are dropped here to keep exactly one per request.
    pub fn from_client(messages: Vec<Message>) -> Self {
        let before = messages.len();
        let kept: Vec<Message> = messages
            .into_iter()
            .filter(|m| m.role != Role::System)
            .collect();
        if kept.len() != before {
            tracing::debug!(
                "Dropped {} client-supplied system message(s) from conversation",
                before - kept.len()
            );
        }
        Self(kept)
    }

    /// Returns the conversation extended by `message`.
    #[must_use]
    pub fn append(mut self, message: Message) -> Self {
        self.0.push(message);
        self
    }

    pub fn messages(&self) -> &[Message] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.0.last()
    }
}
