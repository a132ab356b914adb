//! HTTP route handlers for the Lexviet conversation API.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::conversations::export::export_file_name;
use crate::conversations::{Conversation, ConversationStats, Message, MessageRole};
use crate::identity::Identity;

use super::state::AppState;

/// Header carrying the identity id supplied by the external provider.
/// Absent or blank means the guest identity.
const USER_ID_HEADER: &str = "x-user-id";

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/conversations",
            get(list_conversations).post(create_conversation),
        )
        .route("/api/conversations/search", get(search_conversations))
        .route("/api/conversations/bulk-delete", post(bulk_delete_conversations))
        .route(
            "/api/conversations/{id}",
            get(get_conversation).delete(delete_conversation),
        )
        .route("/api/conversations/{id}/messages", put(update_messages))
        .route("/api/conversations/{id}/title", put(rename_conversation))
        .route("/api/conversations/{id}/favorite", post(toggle_favorite))
        .route("/api/active", get(get_active).put(set_active))
        .route("/api/stats", get(conversation_stats))
        .route("/api/export", get(export_conversations))
        .route("/api/import", post(import_conversations))
        .route("/api/chat", post(send_chat_message))
        .with_state(state)
}

/// Identity from the request headers; guest when the header is absent.
fn request_identity(headers: &HeaderMap) -> Identity {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|uid| !uid.is_empty())
        .map_or(Identity::Guest, Identity::user)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "lexviet-agent",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// List all conversations, most recently created first.
async fn list_conversations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<Vec<Conversation>> {
    let store = state.store_for(&request_identity(&headers));
    let list = store.read().await.list().to_vec();
    Json(list)
}

/// Incoming message body for create/chat requests.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingMessage {
    /// Author role (`user` or `assistant`).
    #[serde(rename = "type")]
    pub role: MessageRole,
    /// Message content.
    pub content: String,
}

/// Create conversation request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    /// Optional explicit title.
    pub title: Option<String>,
    /// Optional seed message.
    pub first_message: Option<IncomingMessage>,
}

/// Create conversation response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationResponse {
    /// Id of the new conversation.
    pub id: String,
}

/// Create a new conversation.
async fn create_conversation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<CreateConversationRequest>,
) -> Json<CreateConversationResponse> {
    let store = state.store_for(&request_identity(&headers));
    let seed = request
        .first_message
        .map(|m| Message::new(m.role, m.content));
    let id = store.write().await.create(request.title, seed);
    Json(CreateConversationResponse { id })
}

/// Fetch one conversation by id.
async fn get_conversation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Conversation>, (StatusCode, String)> {
    let store = state.store_for(&request_identity(&headers));
    store.read().await.get(&id).cloned().map(Json).ok_or((
        StatusCode::NOT_FOUND,
        format!("conversation not found: {id}"),
    ))
}

/// Replace-messages request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMessagesRequest {
    /// Full replacement message array.
    pub messages: Vec<Message>,
}

/// Replace a conversation's messages wholesale.
async fn update_messages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<UpdateMessagesRequest>,
) -> StatusCode {
    let store = state.store_for(&request_identity(&headers));
    store.write().await.update_messages(&id, request.messages);
    StatusCode::NO_CONTENT
}

/// Rename request.
#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    /// New title, set verbatim.
    pub title: String,
}

/// Rename a conversation.
async fn rename_conversation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<RenameRequest>,
) -> StatusCode {
    let store = state.store_for(&request_identity(&headers));
    store.write().await.rename(&id, request.title);
    StatusCode::NO_CONTENT
}

/// Flip a conversation's favorite flag.
async fn toggle_favorite(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> StatusCode {
    let store = state.store_for(&request_identity(&headers));
    store.write().await.toggle_favorite(&id);
    StatusCode::NO_CONTENT
}

/// Delete a conversation and cancel its pending reply, if any.
async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> StatusCode {
    let identity = request_identity(&headers);
    state.cancel_pending_reply(&identity, &id);
    let store = state.store_for(&identity);
    store.write().await.delete(&id);
    StatusCode::NO_CONTENT
}

/// Bulk delete request.
#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    /// Ids to remove; absent ids are ignored.
    pub ids: Vec<String>,
}

/// Delete several conversations in one persisted write.
async fn bulk_delete_conversations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<BulkDeleteRequest>,
) -> StatusCode {
    let identity = request_identity(&headers);
    for id in &request.ids {
        state.cancel_pending_reply(&identity, id);
    }
    let store = state.store_for(&identity);
    store.write().await.bulk_delete(&request.ids);
    StatusCode::NO_CONTENT
}

/// Search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Substring to match; blank returns the full list.
    #[serde(default)]
    pub q: String,
}

/// Search conversations by substring.
async fn search_conversations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Json<Vec<Conversation>> {
    let store = state.store_for(&request_identity(&headers));
    let results = store.read().await.search(&params.q);
    Json(results)
}

/// Active-pointer request/response body.
#[derive(Debug, Deserialize, Serialize)]
pub struct ActiveConversation {
    /// Active conversation id; `null` clears the pointer.
    pub id: Option<String>,
}

/// Read the active-conversation pointer.
async fn get_active(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Json<ActiveConversation> {
    let store = state.store_for(&request_identity(&headers));
    let id = store.read().await.active_id().map(str::to_string);
    Json(ActiveConversation { id })
}

/// Set or clear the active-conversation pointer.
async fn set_active(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<ActiveConversation>,
) -> StatusCode {
    let store = state.store_for(&request_identity(&headers));
    store.write().await.set_active(request.id);
    StatusCode::NO_CONTENT
}

/// Aggregate stats over the identity's conversations.
async fn conversation_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<ConversationStats> {
    let store = state.store_for(&request_identity(&headers));
    let stats = store.read().await.stats();
    Json(stats)
}

/// Download the full conversation list as an indented JSON document.
async fn export_conversations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let store = state.store_for(&request_identity(&headers));
    let body = store
        .read()
        .await
        .export_json()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("export error: {e}")))?;

    let file_name = export_file_name(Local::now().date_naive());
    let disposition = format!("attachment; filename=\"{file_name}\"");
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// Import response.
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    /// Number of conversations appended.
    pub imported: usize,
}

/// Merge a conversation export into the identity's list.
async fn import_conversations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<ImportResponse>, (StatusCode, String)> {
    let store = state.store_for(&request_identity(&headers));
    let imported = store
        .write()
        .await
        .import_json(&body)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    Ok(Json(ImportResponse { imported }))
}

/// Chat request: append a user message and schedule the simulated reply.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Target conversation; omitted means a new conversation is created.
    pub conversation_id: Option<String>,
    /// The user's message.
    pub content: String,
}

/// Chat response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    /// Conversation the message landed in.
    pub conversation_id: String,
    /// The appended user message.
    pub message: Message,
}

/// Append a user message and spawn the delayed simulated reply.
async fn send_chat_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, String)> {
    let identity = request_identity(&headers);
    let store = state.store_for(&identity);
    let user_message = Message::user(&request.content);

    let conversation_id = {
        let mut guard = store.write().await;
        let id = match request.conversation_id {
            Some(id) => {
                let Some(conversation) = guard.get(&id) else {
                    return Err((
                        StatusCode::NOT_FOUND,
                        format!("conversation not found: {id}"),
                    ));
                };
                let mut messages = conversation.messages.clone();
                messages.push(user_message.clone());
                guard.update_messages(&id, messages);
                id
            }
            None => guard.create(None, Some(user_message.clone())),
        };
        guard.set_active(Some(id.clone()));
        id
    };

    let handle =
        state
            .assistant
            .spawn_reply(store, conversation_id.clone(), &request.content);
    state.track_pending_reply(&identity, conversation_id.clone(), handle);

    Ok(Json(ChatResponse {
        conversation_id,
        message: user_message,
    }))
}
