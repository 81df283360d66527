//! Recording implementations of the mailer and conversation publisher

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use server::database::{ConversationRecord, Database};
use server::messages::EmailContent;
use server::services::{ConversationPublisher, Mailer, SentEmail};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Captures every published conversation
#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<ConversationRecord>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text of the last message of every published conversation, in order
    pub async fn last_texts(&self) -> Vec<String> {
        self.published
            .lock()
            .await
            .iter()
            .filter_map(|c| c.messages.last().map(|m| m.text.clone()))
            .collect()
    }

    pub async fn count(&self) -> usize {
        self.published.lock().await.len()
    }
}

#[async_trait]
impl ConversationPublisher for RecordingPublisher {
    async fn publish(&self, conversation: &ConversationRecord) -> Result<()> {
        self.published.lock().await.push(conversation.clone());
        Ok(())
    }
}

/// Captured email
#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub email: EmailContent,
}

/// Captures every email; optionally fails every send
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
    failing: bool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub async fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, email: &EmailContent) -> Result<SentEmail> {
        if self.failing {
            return Err(anyhow!("smtp connection refused"));
        }
        let mut sent = self.sent.lock().await;
        sent.push(SentMail {
            to: to.to_string(),
            email: email.clone(),
        });
        Ok(SentEmail {
            message_id: format!("<test-{}@luber>", sent.len()),
        })
    }
}

/// Marks the given schedules paid while sending, like a PayPal capture that
/// completes in the middle of a worker pass
pub struct CapturingMailer {
    database: Arc<Database>,
    schedule_ids: Vec<String>,
    sent: Mutex<Vec<String>>,
}

impl CapturingMailer {
    pub fn new(database: Arc<Database>, schedule_ids: Vec<String>) -> Self {
        Self {
            database,
            schedule_ids,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub async fn recipients(&self) -> Vec<String> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send(&self, to: &str, _email: &EmailContent) -> Result<SentEmail> {
        for id in &self.schedule_ids {
            self.database.mark_schedule_paid(id).await?;
        }
        let mut sent = self.sent.lock().await;
        sent.push(to.to_string());
        Ok(SentEmail {
            message_id: format!("<capture-{}@luber>", sent.len()),
        })
    }
}
