//! Conversation persistence core for the "AI Tra cứu Luật" legal-assistant
//! chat service.
//!
//! The crate owns the per-identity conversation list: durable storage slots,
//! derived display metadata, search, stats, import/export, and the simulated
//! assistant responder that the chat surface consumes.

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Simulated assistant responder with cancellable delayed replies.
pub mod assistant;
/// Conversation list management: types, ids, the store, import/export.
pub mod conversations;
/// Signed-in identity scoping the persisted conversation list.
pub mod identity;
/// HTTP server and API routes.
pub mod server;
/// Entry helpers to start the Lexviet agent.
pub mod start_lexviet_agent;
/// Durable key-value slots backing conversation persistence.
pub mod storage;
