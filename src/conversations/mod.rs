//! Conversation list management.
//!
//! Types, id generation, the per-identity store, and JSON import/export.

pub mod error;
pub mod export;
pub mod id;
pub mod stats;
pub mod store;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use stats::ConversationStats;
pub use store::ConversationStore;
pub use types::{Conversation, Message, MessageRole};
