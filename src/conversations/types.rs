//! Data model for conversations and messages.
//!
//! The wire format is camelCase JSON with RFC 3339 date strings, identical
//! for the storage slot and for export files, so exported documents can be
//! re-imported as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Localized default title for a conversation with no derivable title.
pub const DEFAULT_TITLE: &str = "Cuộc trò chuyện mới";

/// Localized placeholder preview for an empty conversation.
pub const EMPTY_PREVIEW: &str = "Cuộc trò chuyện trống";

/// Maximum derived title length in characters.
pub const TITLE_MAX_CHARS: usize = 50;

/// Maximum preview length in characters.
pub const PREVIEW_MAX_CHARS: usize = 100;

/// Who authored a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The human user.
    User,
    /// The assistant.
    Assistant,
}

/// A single chat message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Unique message id.
    pub id: String,
    /// Author role, serialized as the `type` wire tag.
    #[serde(rename = "type")]
    pub role: MessageRole,
    /// Free-text content.
    pub content: String,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a message with a fresh id, stamped at the current time.
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Convenience constructor for a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Convenience constructor for an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// A titled, ordered sequence of messages with derived display metadata,
/// owned by one identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Opaque unique id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Ordered messages; replaced wholesale on update, never edited in place.
    pub messages: Vec<Message>,
    /// Fixed at creation.
    pub created_at: DateTime<Utc>,
    /// Refreshed on every mutation.
    pub updated_at: DateTime<Utc>,
    /// Derived: most recent message content, truncated for list views.
    pub preview: String,
    /// Derived: always equals `messages.len()`.
    pub message_count: usize,
    /// User-toggleable favorite flag.
    #[serde(default)]
    pub is_favorite: bool,
    /// Optional categorization tags, matched by search.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Conversation {
    /// Build a conversation at `now` with derived metadata already computed.
    #[must_use]
    pub fn new(
        id: String,
        title: Option<String>,
        messages: Vec<Message>,
        now: DateTime<Utc>,
    ) -> Self {
        let preview = derive_preview(&messages);
        let message_count = messages.len();
        Self {
            id,
            title: title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            messages,
            created_at: now,
            updated_at: now,
            preview,
            message_count,
            is_favorite: false,
            tags: Vec::new(),
        }
    }

    /// Recompute `preview` and `message_count` after `messages` changed.
    pub fn refresh_derived(&mut self) {
        self.preview = derive_preview(&self.messages);
        self.message_count = self.messages.len();
    }

    /// Case-insensitive substring match over title, preview, every
    /// message's content, and tags. `needle_lower` must already be
    /// lowercased.
    #[must_use]
    pub fn matches(&self, needle_lower: &str) -> bool {
        self.title.to_lowercase().contains(needle_lower)
            || self.preview.to_lowercase().contains(needle_lower)
            || self
                .messages
                .iter()
                .any(|m| m.content.to_lowercase().contains(needle_lower))
            || self
                .tags
                .iter()
                .any(|t| t.to_lowercase().contains(needle_lower))
    }
}

/// Derive a title from the first user message, if any.
#[must_use]
pub fn derive_title(messages: &[Message]) -> Option<String> {
    messages
        .iter()
        .find(|m| m.role == MessageRole::User)
        .map(|m| truncate_chars(&m.content, TITLE_MAX_CHARS))
}

/// Derive the list-view preview from the most recent message, or the
/// empty-state placeholder when there are no messages.
#[must_use]
pub fn derive_preview(messages: &[Message]) -> String {
    messages.last().map_or_else(
        || EMPTY_PREVIEW.to_string(),
        |m| truncate_chars(&m.content, PREVIEW_MAX_CHARS),
    )
}

/// Truncate to `max` characters, appending `...` when content was cut.
/// Character-based so multi-byte Vietnamese text is never split.
fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}
