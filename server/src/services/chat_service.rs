use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::database::{
    BotReplyRecord, ChatMessage, ConversationRecord, Database, MatchType, Sender,
};
use crate::errors::{ChatError, LuberError};
use crate::services::bot;
use crate::services::notifier::ChatNotifier;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BotReplyRequest {
    pub question: Option<String>,
    pub answer: Option<String>,
    #[serde(rename = "type")]
    pub match_type: Option<MatchType>,
}

#[derive(Clone)]
pub struct ChatService {
    database: Arc<Database>,
    notifier: ChatNotifier,
}

fn required(value: Option<&str>, field: &str) -> Result<String, LuberError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| LuberError::validation(field, "is required"))
}

impl ChatService {
    pub fn new(database: Arc<Database>, notifier: ChatNotifier) -> Self {
        Self { database, notifier }
    }

    /// Stores a customer message, then lets the bot answer. Returns the
    /// conversation messages as they were right after the customer message.
    pub async fn send_customer_message(
        &self,
        customer_id: &str,
        text: &str,
        image_url: &str,
    ) -> Result<Vec<ChatMessage>, LuberError> {
        let conversation = self
            .database
            .append_customer_conversation_message(customer_id, Sender::Customer, text, image_url)
            .await?;
        self.notifier.publish(&conversation).await;

        let replies = self.database.list_bot_replies().await?;
        let first_message = conversation.customer_message_count() == 1;

        if let Some(reply) = bot::auto_reply(&replies, text, first_message) {
            debug!("Bot answering customer {}", customer_id);
            let updated = self
                .database
                .append_customer_conversation_message(customer_id, Sender::Office, &reply, "")
                .await?;
            self.notifier.publish(&updated).await;
        }

        Ok(conversation.messages)
    }

    pub async fn history(&self, customer_id: &str) -> Result<Vec<ChatMessage>, LuberError> {
        Ok(self
            .database
            .get_conversation_by_customer(customer_id)
            .await?
            .map(|c| c.messages)
            .unwrap_or_default())
    }

    pub async fn active_conversations(&self) -> Result<Vec<ConversationRecord>, LuberError> {
        Ok(self.database.list_active_conversations().await?)
    }

    pub async fn office_reply(
        &self,
        conversation_id: Option<&str>,
        text: &str,
        image_url: &str,
    ) -> Result<Vec<ChatMessage>, LuberError> {
        let conversation_id = required(conversation_id, "convId")?;

        let conversation = self
            .database
            .append_conversation_message(&conversation_id, Sender::Office, text, image_url)
            .await?
            .ok_or_else(|| ChatError::ConversationNotFound {
                conversation_id: conversation_id.clone(),
            })?;
        self.notifier.publish(&conversation).await;

        Ok(conversation.messages)
    }

    pub async fn archive(&self, conversation_id: Option<&str>) -> Result<(), LuberError> {
        let conversation_id = required(conversation_id, "convId")?;

        let conversation = self
            .database
            .archive_conversation(&conversation_id)
            .await?
            .ok_or_else(|| ChatError::ConversationNotFound {
                conversation_id: conversation_id.clone(),
            })?;
        self.notifier.publish(&conversation).await;

        info!("Conversation {} archived", conversation_id);
        Ok(())
    }

    pub async fn bot_replies(&self) -> Result<Vec<BotReplyRecord>, LuberError> {
        Ok(self.database.list_bot_replies().await?)
    }

    pub async fn save_bot_reply(&self, request: BotReplyRequest) -> Result<BotReplyRecord, LuberError> {
        let reply = BotReplyRecord {
            question: required(request.question.as_deref(), "question")?.to_lowercase(),
            answer: required(request.answer.as_deref(), "answer")?,
            match_type: request.match_type.unwrap_or_default(),
        };

        self.database.upsert_bot_reply(&reply).await?;
        info!(
            "Saved {} bot reply for '{}'",
            reply.match_type.as_str(),
            reply.question
        );
        Ok(reply)
    }
}
