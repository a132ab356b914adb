//! Import and export of conversation lists as JSON documents.
//!
//! Export produces the full live list as indented JSON, written to a file
//! named with the export date. Import accepts arbitrary JSON text, keeps
//! only entries with the minimal `{id, title, messages}` shape,
//! reconstitutes date fields from their string form, and defaults the
//! optional flags. Imported entries are appended with no id dedup.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::error::{StoreError, StoreResult};
use super::types::{Conversation, Message};

/// File-name prefix for export files.
const EXPORT_PREFIX: &str = "conversations_export";

/// Name of the export file for the given date.
#[must_use]
pub fn export_file_name(date: NaiveDate) -> String {
    format!("{EXPORT_PREFIX}_{}.json", date.format("%Y-%m-%d"))
}

/// Serialize `conversations` as indented JSON.
///
/// # Errors
/// Returns an error when serialization fails.
pub fn to_export_json(conversations: &[Conversation]) -> StoreResult<String> {
    Ok(serde_json::to_string_pretty(conversations)?)
}

/// Write the export document into `dir`, named with today's date.
///
/// # Errors
/// Returns an error when serialization or the file write fails.
pub fn write_export(conversations: &[Conversation], dir: &Path) -> StoreResult<PathBuf> {
    let path = dir.join(export_file_name(Local::now().date_naive()));
    fs::write(&path, to_export_json(conversations)?)?;
    Ok(path)
}

/// Lenient shape for imported entries: only `id`, `title` and `messages`
/// are required; dates and flags are reconstituted or defaulted.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportedConversation {
    id: String,
    title: String,
    messages: Vec<Message>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    is_favorite: bool,
    #[serde(default)]
    tags: Vec<String>,
}

/// Parse an import payload into conversations ready to append.
///
/// # Errors
/// Rejects the whole payload when it is not a JSON array or when no entry
/// has the minimal shape; the caller must leave its state untouched in
/// that case.
pub fn parse_import(raw: &str) -> StoreResult<Vec<Conversation>> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| StoreError::ImportRejected(format!("not valid JSON: {e}")))?;
    let Value::Array(entries) = value else {
        return Err(StoreError::ImportRejected(
            "payload is not an array".to_string(),
        ));
    };

    let mut imported = Vec::new();
    for entry in entries {
        match serde_json::from_value::<ImportedConversation>(entry) {
            Ok(conv) if !conv.id.is_empty() && !conv.title.is_empty() => {
                imported.push(normalize(conv));
            }
            Ok(_) => debug!("skipping import entry with blank id or title"),
            Err(e) => debug!(error = %e, "skipping import entry with invalid shape"),
        }
    }

    if imported.is_empty() {
        return Err(StoreError::ImportRejected(
            "no valid conversations in payload".to_string(),
        ));
    }
    Ok(imported)
}

/// Rebuild a full conversation from a lenient import entry, recomputing
/// the derived fields so the store invariants hold from the first read.
fn normalize(entry: ImportedConversation) -> Conversation {
    let now = Utc::now();
    let created_at = entry.created_at.unwrap_or(now);
    let mut conversation = Conversation {
        id: entry.id,
        title: entry.title,
        messages: entry.messages,
        created_at,
        updated_at: entry.updated_at.unwrap_or(created_at),
        preview: String::new(),
        message_count: 0,
        is_favorite: entry.is_favorite,
        tags: entry.tags,
    };
    conversation.refresh_derived();
    conversation
}
