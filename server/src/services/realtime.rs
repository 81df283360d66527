//! Conversation hub.
//!
//! The API server owns a broadcast channel of conversation events that every
//! WebSocket subscriber listens to. Code running inside the server publishes
//! straight into it; the workers publish through the server's relay endpoint.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::constants::{chat, http};
use crate::database::ConversationRecord;

#[derive(Debug, Clone, Serialize)]
pub struct HubEvent {
    pub event: String,
    pub data: serde_json::Value,
}

impl HubEvent {
    pub fn conversation_update(conversation: &ConversationRecord) -> Result<Self> {
        Ok(Self {
            event: chat::CONVERSATION_UPDATE_EVENT.to_string(),
            data: serde_json::to_value(conversation)?,
        })
    }

    pub fn conversation_list(conversations: &[ConversationRecord]) -> Result<Self> {
        Ok(Self {
            event: chat::CONVERSATION_LIST_EVENT.to_string(),
            data: serde_json::to_value(conversations)?,
        })
    }
}

#[derive(Clone)]
pub struct ConversationHub {
    sender: broadcast::Sender<HubEvent>,
}

impl Default for ConversationHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(chat::HUB_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of subscribers that received the event
    pub fn broadcast(&self, event: HubEvent) -> usize {
        // No subscribers is not an error
        self.sender.send(event).unwrap_or(0)
    }
}

#[async_trait]
pub trait ConversationPublisher: Send + Sync {
    async fn publish(&self, conversation: &ConversationRecord) -> Result<()>;
}

/// Publishes into the hub of the running server
pub struct HubPublisher {
    hub: ConversationHub,
}

impl HubPublisher {
    pub fn new(hub: ConversationHub) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl ConversationPublisher for HubPublisher {
    async fn publish(&self, conversation: &ConversationRecord) -> Result<()> {
        let delivered = self
            .hub
            .broadcast(HubEvent::conversation_update(conversation)?);
        debug!(
            "Conversation {} broadcast to {} subscriber(s)",
            conversation.id, delivered
        );
        Ok(())
    }
}

/// Asks a remote server to broadcast the stored conversation
pub struct RelayPublisher {
    client: Client,
    hub_url: String,
    api_key: String,
}

impl RelayPublisher {
    pub fn new(hub_url: &str, api_key: &str) -> Result<Self> {
        let client = Client::builder().timeout(http::RELAY_TIMEOUT).build()?;
        Ok(Self {
            client,
            hub_url: hub_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn relay_url(&self, customer_id: &str) -> String {
        format!(
            "{}/api/realtime/conversations/{}",
            self.hub_url, customer_id
        )
    }
}

#[async_trait]
impl ConversationPublisher for RelayPublisher {
    async fn publish(&self, conversation: &ConversationRecord) -> Result<()> {
        let response = self
            .client
            .post(self.relay_url(&conversation.customer_id))
            .bearer_auth(&self.api_key)
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => {
                debug!("Relayed conversation {} to hub", conversation.id);
                Ok(())
            }
            Ok(response) => {
                warn!(
                    "Hub relay returned status {} for conversation {}",
                    response.status(),
                    conversation.id
                );
                Err(anyhow!("hub relay returned {}", response.status()))
            }
            Err(e) => {
                warn!("Hub relay failed for conversation {}: {}", conversation.id, e);
                Err(e.into())
            }
        }
    }
}
