//! Single source of truth for one identity's conversation list.
//!
//! Every mutating operation applies in-memory first, then writes the full
//! serialized list through to the identity's storage slot. A failed
//! write-through never rolls back the in-memory change: it is logged and
//! recorded so callers can surface it (see
//! [`ConversationStore::last_persist_error`]), and the in-memory state stays
//! authoritative for the rest of the session.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, Utc};
use tracing::{debug, warn};

use crate::identity::Identity;
use crate::storage::StorageSlot;

use super::error::StoreResult;
use super::export;
use super::id::next_conversation_id;
use super::stats::ConversationStats;
use super::types::{Conversation, DEFAULT_TITLE, Message, derive_title};

/// Conversation list store scoped to one identity.
pub struct ConversationStore {
    identity: Identity,
    slot: Arc<dyn StorageSlot>,
    conversations: Vec<Conversation>,
    active_id: Option<String>,
    persist_failures: u64,
    last_persist_error: Option<String>,
}

impl ConversationStore {
    /// Load the identity's conversation list from its storage slot.
    ///
    /// A missing slot yields an empty list. A corrupt or unreadable slot is
    /// logged and treated as empty rather than failing the session.
    #[must_use]
    pub fn load(identity: Identity, slot: Arc<dyn StorageSlot>) -> Self {
        let key = identity.storage_key();
        let conversations = match slot.read(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<Conversation>>(&raw) {
                Ok(list) => list,
                Err(e) => {
                    warn!(key = %key, error = %e, "stored conversation list is corrupt; starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(key = %key, error = %e, "failed to read conversation slot; starting empty");
                Vec::new()
            }
        };
        debug!(key = %key, count = conversations.len(), "loaded conversation list");

        Self {
            identity,
            slot,
            conversations,
            active_id: None,
            persist_failures: 0,
            last_persist_error: None,
        }
    }

    /// The identity owning this store.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// All conversations, most recently created first.
    #[must_use]
    pub fn list(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Number of conversations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Create a conversation, optionally seeded with a first message, and
    /// return its id. Without an explicit title the title is derived from
    /// the seed's user message, falling back to the localized default. New
    /// conversations are prepended so the list stays most-recent-first.
    pub fn create(&mut self, title: Option<String>, first_message: Option<Message>) -> String {
        let id = next_conversation_id();
        let messages: Vec<Message> = first_message.into_iter().collect();
        let title = title.or_else(|| derive_title(&messages));
        let conversation = Conversation::new(id.clone(), title, messages, Utc::now());
        self.conversations.insert(0, conversation);
        self.persist();
        debug!(id = %id, "created conversation");
        id
    }

    /// Replace a conversation's messages wholesale and refresh the derived
    /// metadata. While the title is still the auto-generated default it is
    /// re-derived from the first user message. No-op for an unknown id.
    pub fn update_messages(&mut self, id: &str, messages: Vec<Message>) {
        let Some(conversation) = self.conversations.iter_mut().find(|c| c.id == id) else {
            return;
        };
        if conversation.title == DEFAULT_TITLE && !messages.is_empty() {
            if let Some(title) = derive_title(&messages) {
                conversation.title = title;
            }
        }
        conversation.messages = messages;
        conversation.refresh_derived();
        conversation.updated_at = Utc::now();
        self.persist();
    }

    /// Set a conversation's title verbatim. No-op for an unknown id.
    pub fn rename(&mut self, id: &str, title: impl Into<String>) {
        let Some(conversation) = self.conversations.iter_mut().find(|c| c.id == id) else {
            return;
        };
        conversation.title = title.into();
        conversation.updated_at = Utc::now();
        self.persist();
    }

    /// Flip a conversation's favorite flag. No-op for an unknown id.
    pub fn toggle_favorite(&mut self, id: &str) {
        let Some(conversation) = self.conversations.iter_mut().find(|c| c.id == id) else {
            return;
        };
        conversation.is_favorite = !conversation.is_favorite;
        conversation.updated_at = Utc::now();
        self.persist();
    }

    /// Delete a conversation, clearing the active pointer when it matched.
    /// Idempotent: deleting an absent id changes nothing.
    pub fn delete(&mut self, id: &str) {
        let before = self.conversations.len();
        self.conversations.retain(|c| c.id != id);
        if self.conversations.len() == before {
            return;
        }
        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
        }
        self.persist();
        debug!(id = %id, "deleted conversation");
    }

    /// Delete every conversation in `ids` in a single persisted write,
    /// clearing the active pointer when it fell inside the set. Absent ids
    /// are ignored.
    pub fn bulk_delete(&mut self, ids: &[String]) {
        let before = self.conversations.len();
        self.conversations.retain(|c| !ids.contains(&c.id));
        let removed = before - self.conversations.len();
        if removed == 0 {
            return;
        }
        if let Some(active) = &self.active_id
            && ids.contains(active)
        {
            self.active_id = None;
        }
        self.persist();
        debug!(removed, "bulk-deleted conversations");
    }

    /// Pure lookup by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    /// Set or clear the active-conversation pointer. In-memory only; the
    /// pointer is never persisted.
    pub fn set_active(&mut self, id: Option<String>) {
        self.active_id = id;
    }

    /// The conversation currently displayed by the chat view, if any.
    #[must_use]
    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    /// Case-insensitive substring search over title, preview, every
    /// message's content, and tags. A blank query returns the full list in
    /// its original order. Scans all messages of all conversations, so the
    /// cost is linear in total message count.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<Conversation> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.conversations.clone();
        }
        self.conversations
            .iter()
            .filter(|c| c.matches(&needle))
            .cloned()
            .collect()
    }

    /// Aggregate stats over the live list, recomputed on every call.
    #[must_use]
    pub fn stats(&self) -> ConversationStats {
        ConversationStats::calculate(&self.conversations, Local::now())
    }

    /// Serialize the full list as indented JSON.
    ///
    /// # Errors
    /// Returns an error when serialization fails.
    pub fn export_json(&self) -> StoreResult<String> {
        export::to_export_json(&self.conversations)
    }

    /// Write the export file into `dir` and return its path. The file name
    /// embeds the current date.
    ///
    /// # Errors
    /// Returns an error when serialization or the file write fails.
    pub fn export_to_dir(&self, dir: &Path) -> StoreResult<PathBuf> {
        export::write_export(&self.conversations, dir)
    }

    /// Append conversations parsed from `raw` and persist the merged list.
    /// Returns how many entries were appended. Imported ids are not
    /// deduplicated against existing ones.
    ///
    /// # Errors
    /// Returns an error and leaves the list untouched when the payload is
    /// rejected.
    pub fn import_json(&mut self, raw: &str) -> StoreResult<usize> {
        let imported = export::parse_import(raw)?;
        let count = imported.len();
        self.conversations.extend(imported);
        self.persist();
        debug!(count, "imported conversations");
        Ok(count)
    }

    /// Most recent write-through failure, cleared by the next successful
    /// write.
    #[must_use]
    pub fn last_persist_error(&self) -> Option<&str> {
        self.last_persist_error.as_deref()
    }

    /// Total write-through failures this session.
    #[must_use]
    pub fn persist_failures(&self) -> u64 {
        self.persist_failures
    }

    /// Write the full list through to the storage slot.
    fn persist(&mut self) {
        let key = self.identity.storage_key();
        let payload = match serde_json::to_string(&self.conversations) {
            Ok(payload) => payload,
            Err(e) => {
                self.record_persist_failure(&key, &e.to_string());
                return;
            }
        };
        match self.slot.write(&key, &payload) {
            Ok(()) => self.last_persist_error = None,
            Err(e) => self.record_persist_failure(&key, &e.to_string()),
        }
    }

    fn record_persist_failure(&mut self, key: &str, error: &str) {
        self.persist_failures += 1;
        self.last_persist_error = Some(error.to_string());
        warn!(key = %key, error = %error, "conversation write-through failed; in-memory state retained");
    }
}
