// WebSocket hub and the worker relay endpoint

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use super::common::{api_error, ok, ApiResult};
use crate::errors::{ChatError, LuberError};
use crate::services::HubEvent;
use crate::web::middleware::OfficeKey;
use crate::web::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayOutcome {
    pub conversation_id: String,
    pub subscribers: usize,
}

pub async fn websocket(
    _office: OfficeKey,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn send_event(socket: &mut WebSocket, event: &HubEvent) -> bool {
    match serde_json::to_string(event) {
        Ok(text) => socket.send(Message::Text(text.into())).await.is_ok(),
        Err(e) => {
            warn!("Could not encode hub event: {}", e);
            true
        }
    }
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    // Subscribe before the snapshot so no update is lost in between
    let mut events = state.hub.subscribe();
    info!("Office dashboard connected");

    match state.chat.active_conversations().await {
        Ok(conversations) => match HubEvent::conversation_list(&conversations) {
            Ok(event) => {
                if !send_event(&mut socket, &event).await {
                    return;
                }
            }
            Err(e) => warn!("Could not build conversation list: {}", e),
        },
        Err(e) => warn!("Could not load conversations for socket: {}", e),
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if !send_event(&mut socket, &event).await {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Socket lagged, {} conversation event(s) skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("Socket receive error: {}", e);
                    break;
                }
            },
        }
    }

    info!("Office dashboard disconnected");
}

/// Broadcasts the stored conversation of a customer. Used by the workers.
pub async fn relay_conversation(
    _office: OfficeKey,
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
) -> ApiResult<RelayOutcome> {
    let conversation = state
        .database
        .get_conversation_by_customer(&customer_id)
        .await
        .map_err(|e| api_error(e.into()))?
        .ok_or_else(|| {
            api_error(LuberError::from(ChatError::ConversationNotFound {
                conversation_id: customer_id.clone(),
            }))
        })?;

    let event = HubEvent::conversation_update(&conversation).map_err(|e| api_error(e.into()))?;
    let subscribers = state.hub.broadcast(event);
    debug!(
        "Relayed conversation {} to {} subscriber(s)",
        conversation.id, subscribers
    );

    ok(RelayOutcome {
        conversation_id: conversation.id,
        subscribers,
    })
}
