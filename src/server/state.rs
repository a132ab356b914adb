//! Application state shared across all request handlers.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;

use crate::assistant::{ReplyHandle, SimulatedAssistant};
use crate::conversations::ConversationStore;
use crate::identity::Identity;
use crate::storage::StorageSlot;

/// Shared application state.
pub struct AppState {
    /// Durable backend shared by every identity's store.
    slot: Arc<dyn StorageSlot>,
    /// One store per identity slot key, constructed on first use.
    stores: DashMap<String, Arc<RwLock<ConversationStore>>>,
    /// Simulated responder.
    pub assistant: SimulatedAssistant,
    /// Pending simulated replies keyed by owner slot key and conversation
    /// id, so one identity can never cancel another's reply. Cancelled when
    /// the conversation is deleted or a newer message supersedes them.
    pending_replies: DashMap<(String, String), ReplyHandle>,
}

impl AppState {
    /// Create state over the given storage backend.
    #[must_use]
    pub fn new(slot: Arc<dyn StorageSlot>) -> Arc<Self> {
        Arc::new(Self {
            slot,
            stores: DashMap::new(),
            assistant: SimulatedAssistant::new(),
            pending_replies: DashMap::new(),
        })
    }

    /// Create state with a custom assistant. Used by tests to shrink the
    /// typing delay.
    #[must_use]
    pub fn with_assistant(slot: Arc<dyn StorageSlot>, assistant: SimulatedAssistant) -> Arc<Self> {
        Arc::new(Self {
            slot,
            stores: DashMap::new(),
            assistant,
            pending_replies: DashMap::new(),
        })
    }

    /// Store for `identity`, loading it from storage on first access.
    /// Repeated calls for the same identity share one instance.
    #[must_use]
    pub fn store_for(&self, identity: &Identity) -> Arc<RwLock<ConversationStore>> {
        let key = identity.storage_key();
        self.stores
            .entry(key)
            .or_insert_with(|| {
                Arc::new(RwLock::new(ConversationStore::load(
                    identity.clone(),
                    Arc::clone(&self.slot),
                )))
            })
            .clone()
    }

    /// Register the pending reply for one of `identity`'s conversations,
    /// cancelling any previous one for the same conversation. Entries whose
    /// task already finished are pruned here, so the registry stays bounded
    /// by the number of replies actually in flight.
    pub fn track_pending_reply(
        &self,
        identity: &Identity,
        conversation_id: String,
        handle: ReplyHandle,
    ) {
        self.pending_replies.retain(|_, pending| !pending.is_finished());
        let key = (identity.storage_key(), conversation_id);
        if let Some(previous) = self.pending_replies.insert(key, handle) {
            previous.cancel();
        }
    }

    /// Cancel and drop the pending reply for one of `identity`'s
    /// conversations, if any. Other identities' replies are untouched even
    /// when they share a conversation id.
    pub fn cancel_pending_reply(&self, identity: &Identity, conversation_id: &str) {
        let key = (identity.storage_key(), conversation_id.to_string());
        if let Some((_, handle)) = self.pending_replies.remove(&key) {
            handle.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::conversations::Message;
    use crate::storage::MemorySlotStore;

    fn fast_state(delay_ms: std::ops::Range<u64>) -> Arc<AppState> {
        AppState::with_assistant(
            Arc::new(MemorySlotStore::new()),
            SimulatedAssistant::new().with_delay_ms(delay_ms),
        )
    }

    #[tokio::test]
    async fn test_same_identity_shares_one_store() {
        let state = AppState::new(Arc::new(MemorySlotStore::new()));
        let identity = Identity::user("u1");

        let id = state
            .store_for(&identity)
            .write()
            .await
            .create(Some("chia sẻ".to_string()), None);
        let again = state.store_for(&identity);
        assert!(again.read().await.get(&id).is_some());
    }

    #[tokio::test]
    async fn test_identities_get_separate_stores() {
        let state = AppState::new(Arc::new(MemorySlotStore::new()));

        state
            .store_for(&Identity::user("u1"))
            .write()
            .await
            .create(Some("của u1".to_string()), None);

        let u2 = state.store_for(&Identity::user("u2"));
        assert!(u2.read().await.is_empty());

        let guest = state.store_for(&Identity::Guest);
        assert!(guest.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_owner_cancel_stops_the_pending_reply() {
        let state = fast_state(100..101);
        let owner = Identity::user("u1");
        let store = state.store_for(&owner);
        let id = store.write().await.create(None, Some(Message::user("hỏi")));

        let handle = state.assistant.spawn_reply(store.clone(), id.clone(), "hỏi");
        state.track_pending_reply(&owner, id.clone(), handle);
        state.cancel_pending_reply(&owner, &id);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(store.read().await.get(&id).unwrap().message_count, 1);
    }

    #[tokio::test]
    async fn test_cancel_is_scoped_to_the_requesting_identity() {
        let state = fast_state(20..21);
        let owner = Identity::user("u1");
        let store = state.store_for(&owner);
        let id = store.write().await.create(None, Some(Message::user("hỏi")));

        let handle = state.assistant.spawn_reply(store.clone(), id.clone(), "hỏi");
        state.track_pending_reply(&owner, id.clone(), handle);

        // Another identity naming the same conversation id must not reach
        // the owner's pending reply.
        state.cancel_pending_reply(&Identity::Guest, &id);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(store.read().await.get(&id).unwrap().message_count, 2);
    }

    #[tokio::test]
    async fn test_finished_replies_are_pruned_on_insert() {
        let state = fast_state(1..2);
        let owner = Identity::user("u1");
        let store = state.store_for(&owner);

        let first = store.write().await.create(None, Some(Message::user("một")));
        let handle = state.assistant.spawn_reply(store.clone(), first.clone(), "một");
        state.track_pending_reply(&owner, first, handle);

        // Let the first reply land, then register a second one; the stale
        // entry must not linger alongside it.
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = store.write().await.create(None, Some(Message::user("hai")));
        let handle = state.assistant.spawn_reply(store.clone(), second.clone(), "hai");
        state.track_pending_reply(&owner, second, handle);

        assert_eq!(state.pending_replies.len(), 1);
    }
}
