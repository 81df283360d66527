// Customer chat, office inbox and bot reply handlers

use axum::{extract::State, response::Json};
use serde::Deserialize;
use tower_sessions::Session;

use super::common::{api_error, ok, ApiResult};
use crate::database::{BotReplyRecord, ChatMessage, ConversationRecord};
use crate::services::chat_service::BotReplyRequest;
use crate::web::middleware::OfficeKey;
use crate::web::session::CustomerSession;
use crate::web::AppState;

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SendMessageRequest {
    pub text: String,
    pub image_url: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct OfficeReplyRequest {
    pub conv_id: Option<String>,
    pub text: String,
    pub image_url: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ArchiveRequest {
    pub conv_id: Option<String>,
}

pub async fn send_message(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<SendMessageRequest>,
) -> ApiResult<Vec<ChatMessage>> {
    let customer_id = CustomerSession::new(&session)
        .require_customer()
        .await
        .map_err(api_error)?;

    let messages = state
        .chat
        .send_customer_message(&customer_id, &request.text, &request.image_url)
        .await
        .map_err(api_error)?;
    ok(messages)
}

pub async fn chat_history(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Vec<ChatMessage>> {
    let customer_id = CustomerSession::new(&session)
        .require_customer()
        .await
        .map_err(api_error)?;

    let messages = state.chat.history(&customer_id).await.map_err(api_error)?;
    ok(messages)
}

pub async fn list_conversations(
    _office: OfficeKey,
    State(state): State<AppState>,
) -> ApiResult<Vec<ConversationRecord>> {
    let conversations = state
        .chat
        .active_conversations()
        .await
        .map_err(api_error)?;
    ok(conversations)
}

pub async fn office_reply(
    _office: OfficeKey,
    State(state): State<AppState>,
    Json(request): Json<OfficeReplyRequest>,
) -> ApiResult<Vec<ChatMessage>> {
    let messages = state
        .chat
        .office_reply(
            request.conv_id.as_deref(),
            &request.text,
            &request.image_url,
        )
        .await
        .map_err(api_error)?;
    ok(messages)
}

pub async fn archive_conversation(
    _office: OfficeKey,
    State(state): State<AppState>,
    Json(request): Json<ArchiveRequest>,
) -> ApiResult<()> {
    state
        .chat
        .archive(request.conv_id.as_deref())
        .await
        .map_err(api_error)?;
    ok(())
}

pub async fn list_bot_replies(
    _office: OfficeKey,
    State(state): State<AppState>,
) -> ApiResult<Vec<BotReplyRecord>> {
    let replies = state.chat.bot_replies().await.map_err(api_error)?;
    ok(replies)
}

pub async fn save_bot_reply(
    _office: OfficeKey,
    State(state): State<AppState>,
    Json(request): Json<BotReplyRequest>,
) -> ApiResult<BotReplyRecord> {
    let reply = state
        .chat
        .save_bot_reply(request)
        .await
        .map_err(api_error)?;
    ok(reply)
}
