use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::database::{ConversationRecord, Database, Sender};
use crate::messages::EmailContent;
use crate::services::mailer::{Mailer, SentEmail};
use crate::services::realtime::ConversationPublisher;

/// Posts office messages into customer conversations and pushes the result
/// to the conversation hub.
#[derive(Clone)]
pub struct ChatNotifier {
    database: Arc<Database>,
    publisher: Arc<dyn ConversationPublisher>,
}

impl ChatNotifier {
    pub fn new(database: Arc<Database>, publisher: Arc<dyn ConversationPublisher>) -> Self {
        Self {
            database,
            publisher,
        }
    }

    pub async fn post_office_message(
        &self,
        customer_id: &str,
        text: &str,
    ) -> Result<ConversationRecord> {
        let conversation = self
            .database
            .append_customer_conversation_message(customer_id, Sender::Office, text, "")
            .await?;
        self.publish(&conversation).await;
        debug!("Office message posted to customer {}", customer_id);
        Ok(conversation)
    }

    /// Publish failures only delay the live update; the message is already stored
    pub async fn publish(&self, conversation: &ConversationRecord) {
        if let Err(e) = self.publisher.publish(conversation).await {
            warn!(
                "Could not publish conversation {} for customer {}: {}",
                conversation.id, conversation.customer_id, e
            );
        }
    }
}

/// Sends an email when a recipient is known; failures are logged and reported
/// as `None`.
pub async fn deliver_email(
    mailer: &dyn Mailer,
    to: Option<&str>,
    email: &EmailContent,
) -> Option<SentEmail> {
    let to = to.map(str::trim).filter(|to| !to.is_empty())?;
    match mailer.send(to, email).await {
        Ok(sent) => Some(sent),
        Err(e) => {
            warn!("Email '{}' to {} failed: {}", email.subject, to, e);
            None
        }
    }
}
