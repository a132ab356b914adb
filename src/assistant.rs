//! Simulated assistant responder.
//!
//! There is no model behind the chat: replies are canned legal-assistant
//! responses picked at random and delivered after a randomized typing
//! delay. The delayed append runs as a cancellable task, so a consumer
//! that is torn down before the delay elapses cancels the pending reply
//! instead of mutating state it no longer owns.

use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::conversations::{ConversationStore, Message};

/// Canned responses of the legal assistant.
const RESPONSES: [&str; 4] = [
    "Tôi có thể giúp bạn tra cứu thông tin pháp luật này. Để cung cấp câu trả lời chính xác nhất, bạn có thể cho tôi biết thêm chi tiết về vấn đề cụ thể không?",
    "Dựa trên câu hỏi của bạn, tôi sẽ tham khảo các văn bản pháp luật liên quan và đưa ra phản hồi phù hợp.",
    "Đây là một câu hỏi hay về pháp luật. Tôi sẽ phân tích và cung cấp thông tin chi tiết từ cơ sở dữ liệu pháp luật Việt Nam.",
    "Cảm ơn bạn đã sử dụng AI Tra cứu Luật. Tôi sẽ hỗ trợ bạn tìm hiểu về vấn đề này một cách tốt nhất.",
];

/// Default typing-delay range in milliseconds.
const DEFAULT_DELAY_MS: Range<u64> = 1500..3500;

/// Picks canned replies and spawns delayed append tasks.
#[derive(Clone)]
pub struct SimulatedAssistant {
    delay_ms: Range<u64>,
}

impl Default for SimulatedAssistant {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_DELAY_MS,
        }
    }
}

impl SimulatedAssistant {
    /// Assistant with the default 1.5–3.5 s typing delay.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the typing-delay range in milliseconds.
    #[must_use]
    pub fn with_delay_ms(mut self, delay_ms: Range<u64>) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Produce a reply for the given user message.
    ///
    /// The input is accepted for interface stability; today every reply is
    /// a random pick from the canned set.
    #[must_use]
    pub fn respond_to(&self, _user_content: &str) -> String {
        let idx = rand::thread_rng().gen_range(0..RESPONSES.len());
        RESPONSES[idx].to_string()
    }

    /// Randomized typing delay.
    #[must_use]
    pub fn typing_delay(&self) -> Duration {
        let ms = rand::thread_rng().gen_range(self.delay_ms.clone());
        Duration::from_millis(ms)
    }

    /// Append a delayed reply to `conversation_id`.
    ///
    /// Cancelling the returned handle before the delay elapses prevents the
    /// append entirely. The task also re-checks that the conversation still
    /// exists once the delay is over, so a reply never lands in a deleted
    /// conversation.
    pub fn spawn_reply(
        &self,
        store: Arc<RwLock<ConversationStore>>,
        conversation_id: String,
        user_content: &str,
    ) -> ReplyHandle {
        let token = CancellationToken::new();
        let task_token = token.clone();
        let reply = self.respond_to(user_content);
        let delay = self.typing_delay();

        let join = tokio::spawn(async move {
            tokio::select! {
                () = task_token.cancelled() => {
                    debug!(conversation_id = %conversation_id, "simulated reply cancelled");
                }
                () = tokio::time::sleep(delay) => {
                    let mut store = store.write().await;
                    let Some(conversation) = store.get(&conversation_id) else {
                        debug!(conversation_id = %conversation_id, "conversation gone before the reply landed");
                        return;
                    };
                    let mut messages = conversation.messages.clone();
                    messages.push(Message::assistant(reply));
                    store.update_messages(&conversation_id, messages);
                }
            }
        });

        ReplyHandle { token, join }
    }
}

/// Handle to a pending simulated reply.
pub struct ReplyHandle {
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl ReplyHandle {
    /// Cancel the pending reply if it has not fired yet.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the reply task has finished, by delivery or cancellation.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the task to finish.
    pub async fn join(self) {
        let _ = self.join.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversations::MessageRole;
    use crate::identity::Identity;
    use crate::storage::MemorySlotStore;

    fn shared_store_with_conversation() -> (Arc<RwLock<ConversationStore>>, String) {
        let mut store =
            ConversationStore::load(Identity::Guest, Arc::new(MemorySlotStore::new()));
        let id = store.create(None, Some(Message::user("Thuế nhập khẩu?")));
        (Arc::new(RwLock::new(store)), id)
    }

    #[test]
    fn test_replies_come_from_the_canned_set() {
        let assistant = SimulatedAssistant::new();
        for _ in 0..20 {
            let reply = assistant.respond_to("bất kỳ");
            assert!(RESPONSES.contains(&reply.as_str()));
        }
    }

    #[test]
    fn test_typing_delay_stays_in_range() {
        let assistant = SimulatedAssistant::new();
        for _ in 0..20 {
            let delay = assistant.typing_delay();
            assert!(delay >= Duration::from_millis(1500));
            assert!(delay < Duration::from_millis(3500));
        }
    }

    #[tokio::test]
    async fn test_delayed_reply_is_appended() {
        let (store, id) = shared_store_with_conversation();
        let assistant = SimulatedAssistant::new().with_delay_ms(1..2);

        let handle = assistant.spawn_reply(store.clone(), id.clone(), "Thuế nhập khẩu?");
        handle.join().await;

        let store = store.read().await;
        let conversation = store.get(&id).unwrap();
        assert_eq!(conversation.message_count, 2);
        assert_eq!(conversation.messages[1].role, MessageRole::Assistant);
        assert_eq!(conversation.preview, conversation.messages[1].content);
    }

    #[tokio::test]
    async fn test_cancelled_reply_never_appends() {
        let (store, id) = shared_store_with_conversation();
        let assistant = SimulatedAssistant::new().with_delay_ms(200..201);

        let handle = assistant.spawn_reply(store.clone(), id.clone(), "Thuế nhập khẩu?");
        handle.cancel();
        handle.join().await;

        let store = store.read().await;
        assert_eq!(store.get(&id).unwrap().message_count, 1);
    }

    #[tokio::test]
    async fn test_reply_to_deleted_conversation_is_dropped() {
        let (store, id) = shared_store_with_conversation();
        let assistant = SimulatedAssistant::new().with_delay_ms(30..31);

        let handle = assistant.spawn_reply(store.clone(), id.clone(), "Thuế nhập khẩu?");
        store.write().await.delete(&id);
        handle.join().await;

        let store = store.read().await;
        assert!(store.get(&id).is_none());
        assert!(store.is_empty());
    }
}
