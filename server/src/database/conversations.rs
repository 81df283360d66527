//! Conversation, chat message and bot reply database operations.

use anyhow::{anyhow, Result};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;
use uuid::Uuid;

use super::records::{BotReplyRecord, ChatMessage, ConversationRecord, MatchType, Sender};
use super::Database;

const CONVERSATION_SELECT: &str = r#"
    SELECT c.id, c.customer_id, c.archived, c.created_at, c.updated_at,
           cu.full_name AS customer_name, cu.email AS customer_email
    FROM conversations c
    LEFT JOIN customers cu ON cu.id = c.customer_id
"#;

fn conversation_from_row(row: &SqliteRow) -> Result<ConversationRecord> {
    Ok(ConversationRecord {
        id: row.try_get("id")?,
        customer_id: row.try_get("customer_id")?,
        customer_name: row.try_get("customer_name")?,
        customer_email: row.try_get("customer_email")?,
        archived: row.try_get("archived")?,
        messages: Vec::new(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl Database {
    /// Creates the customer's conversation when missing and returns its id
    pub async fn ensure_conversation(&self, customer_id: &str) -> Result<String> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO conversations (id, customer_id, archived, created_at, updated_at)
            VALUES (?, ?, 0, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(customer_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let id: String = sqlx::query_scalar("SELECT id FROM conversations WHERE customer_id = ?")
            .bind(customer_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }

    async fn load_messages(&self, conversation_id: &str) -> Result<Vec<ChatMessage>> {
        let rows = sqlx::query(
            r#"
            SELECT sender, text, image_url, at
            FROM conversation_messages
            WHERE conversation_id = ?
            ORDER BY id
            "#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let sender: String = row.try_get("sender")?;
                Ok(ChatMessage {
                    sender: Sender::parse(&sender),
                    text: row.try_get("text")?,
                    image_url: row.try_get("image_url")?,
                    at: row.try_get("at")?,
                })
            })
            .collect()
    }

    async fn with_messages(&self, mut conversation: ConversationRecord) -> Result<ConversationRecord> {
        conversation.messages = self.load_messages(&conversation.id).await?;
        Ok(conversation)
    }

    pub async fn get_conversation(&self, conversation_id: &str) -> Result<Option<ConversationRecord>> {
        let sql = format!("{} WHERE c.id = ?", CONVERSATION_SELECT);
        let row = sqlx::query(&sql)
            .bind(conversation_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.with_messages(conversation_from_row(&row)?).await?)),
            None => Ok(None),
        }
    }

    pub async fn get_conversation_by_customer(
        &self,
        customer_id: &str,
    ) -> Result<Option<ConversationRecord>> {
        let sql = format!("{} WHERE c.customer_id = ?", CONVERSATION_SELECT);
        let row = sqlx::query(&sql)
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(self.with_messages(conversation_from_row(&row)?).await?)),
            None => Ok(None),
        }
    }

    /// Non-archived conversations with customer name and email, most recent activity first
    pub async fn list_active_conversations(&self) -> Result<Vec<ConversationRecord>> {
        let sql = format!(
            "{} WHERE c.archived = 0 ORDER BY c.updated_at DESC",
            CONVERSATION_SELECT
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let mut conversations = Vec::with_capacity(rows.len());
        for row in &rows {
            conversations.push(self.with_messages(conversation_from_row(row)?).await?);
        }
        Ok(conversations)
    }

    /// Appends a message to the customer's conversation, creating it on first
    /// use. Customer messages also un-archive the conversation.
    pub async fn append_customer_conversation_message(
        &self,
        customer_id: &str,
        sender: Sender,
        text: &str,
        image_url: &str,
    ) -> Result<ConversationRecord> {
        let conversation_id = self.ensure_conversation(customer_id).await?;
        self.insert_message(&conversation_id, sender, text, image_url)
            .await?;

        if sender == Sender::Customer {
            sqlx::query("UPDATE conversations SET archived = 0 WHERE id = ?")
                .bind(&conversation_id)
                .execute(&self.pool)
                .await?;
        }

        self.get_conversation(&conversation_id)
            .await?
            .ok_or_else(|| anyhow!("Conversation {} vanished after update", conversation_id))
    }

    /// Appends a message to an existing conversation; None when it does not exist
    pub async fn append_conversation_message(
        &self,
        conversation_id: &str,
        sender: Sender,
        text: &str,
        image_url: &str,
    ) -> Result<Option<ConversationRecord>> {
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM conversations WHERE id = ?")
            .bind(conversation_id)
            .fetch_one(&self.pool)
            .await?;
        if exists == 0 {
            return Ok(None);
        }

        self.insert_message(conversation_id, sender, text, image_url)
            .await?;
        self.get_conversation(conversation_id).await
    }

    async fn insert_message(
        &self,
        conversation_id: &str,
        sender: Sender,
        text: &str,
        image_url: &str,
    ) -> Result<()> {
        let now = Utc::now();
        debug!(
            "Appending {} message to conversation {}",
            sender.as_str(),
            conversation_id
        );

        sqlx::query(
            r#"
            INSERT INTO conversation_messages (conversation_id, sender, text, image_url, at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(conversation_id)
        .bind(sender.as_str())
        .bind(text)
        .bind(image_url)
        .bind(now)
        .execute(&self.pool)
        .await?;

        sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(conversation_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn archive_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Option<ConversationRecord>> {
        sqlx::query("UPDATE conversations SET archived = 1, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(conversation_id)
            .execute(&self.pool)
            .await?;
        self.get_conversation(conversation_id).await
    }

    // ------------------------------------------------------------------------
    // Bot replies
    // ------------------------------------------------------------------------

    /// Bot replies in the order they were first stored
    pub async fn list_bot_replies(&self) -> Result<Vec<BotReplyRecord>> {
        let rows = sqlx::query("SELECT question, answer, match_type FROM bot_replies ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let match_type: String = row.try_get("match_type")?;
                Ok(BotReplyRecord {
                    question: row.try_get("question")?,
                    answer: row.try_get("answer")?,
                    match_type: MatchType::parse(&match_type),
                })
            })
            .collect()
    }

    /// Inserts or replaces the answer for `question`, keeping its original position
    pub async fn upsert_bot_reply(&self, reply: &BotReplyRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO bot_replies (question, answer, match_type)
            VALUES (?, ?, ?)
            ON CONFLICT(question) DO UPDATE SET
                answer = excluded.answer,
                match_type = excluded.match_type
            "#,
        )
        .bind(&reply.question)
        .bind(&reply.answer)
        .bind(reply.match_type.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
