//! Recording implementations of the conversation publisher

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use server::database::ConversationRecord;
use server::services::ConversationPublisher;
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

    pub async fn published(&self) -> Vec<ConversationRecord> {
        self.published.lock().await.clone()
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

/// Publisher whose hub is always unreachable
pub struct FailingPublisher;

#[async_trait]
impl ConversationPublisher for FailingPublisher {
    async fn publish(&self, _conversation: &ConversationRecord) -> Result<()> {
        Err(anyhow!("hub unreachable"))
    }
}
