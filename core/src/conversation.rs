//! Chat history as it is forwarded to providers.
//!
//! [`ConversationHistory`] can only be built through [`ConversationHistory::sanitize`],
//! so every history an adapter sees already respects the configured
//! [`HistoryLimits`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agents::config::HistoryLimits;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }

    /// Lenient conversion of one client supplied entry. Unknown roles become
    /// `user`, non-string content becomes empty.
    pub fn from_value(value: &Value, max_chars: usize) -> Self {
        let role = match value.get("role").and_then(Value::as_str) {
            Some("assistant") => ChatRole::Assistant,
            _ => ChatRole::User,
        };
        let content = value
            .get("content")
            .and_then(Value::as_str)
            .map(|text| truncate_chars(text, max_chars))
            .unwrap_or_default();
        Self { role, content }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationHistory {
    messages: Vec<ChatMessage>,
}

impl ConversationHistory {
    /// Keep the most recent `max_messages` entries, cap each at
    /// `max_message_chars` characters and drop the ones left empty.
    pub fn sanitize(raw: &[Value], limits: HistoryLimits) -> Self {
        let start = raw.len().saturating_sub(limits.max_messages);
        let messages = raw[start..]
            .iter()
            .map(|value| ChatMessage::from_value(value, limits.max_message_chars))
            .filter(|msg| !msg.content.is_empty())
            .collect();
        Self { messages }
    }

    /// Same as [`Self::sanitize`] for already typed messages.
    pub fn from_messages(messages: Vec<ChatMessage>, limits: HistoryLimits) -> Self {
        let start = messages.len().saturating_sub(limits.max_messages);
        let messages = messages
            .into_iter()
            .skip(start)
            .map(|msg| ChatMessage {
                role: msg.role,
                content: truncate_chars(&msg.content, limits.max_message_chars),
            })
            .filter(|msg| !msg.content.is_empty())
            .collect();
        Self { messages }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Content of the most recent user turn, or an empty string.
    pub fn last_user_question(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }
}

pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
