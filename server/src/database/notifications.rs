//! Login log and welcome-email log database operations.

use anyhow::Result;
use sqlx::Row;
use tracing::debug;

use super::records::{AccountType, CustomerRecord, LoginLogRecord, WelcomeNotificationRecord};
use super::Database;

impl Database {
    pub async fn insert_login_log(&self, entry: &LoginLogRecord) -> Result<()> {
        debug!("Logging login of customer {} from {}", entry.customer_id, entry.ip);

        sqlx::query(
            r#"
            INSERT INTO login_log (customer_id, full_name, email, account_type, ip, at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.customer_id)
        .bind(&entry.full_name)
        .bind(&entry.email)
        .bind(entry.account_type.as_str())
        .bind(&entry.ip)
        .bind(entry.at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_login_log(&self, customer_id: &str) -> Result<Vec<LoginLogRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT customer_id, full_name, email, account_type, ip, at
            FROM login_log
            WHERE customer_id = ?
            ORDER BY at DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let account_type: String = row.try_get("account_type")?;
                Ok(LoginLogRecord {
                    customer_id: row.try_get("customer_id")?,
                    full_name: row.try_get("full_name")?,
                    email: row.try_get("email")?,
                    account_type: AccountType::parse(&account_type),
                    ip: row.try_get("ip")?,
                    at: row.try_get("at")?,
                })
            })
            .collect()
    }

    /// Customers that have not been sent a welcome email yet
    pub async fn customers_without_welcome(&self) -> Result<Vec<CustomerRecord>> {
        let ids: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT c.id FROM customers c
            WHERE NOT EXISTS (
                SELECT 1 FROM welcome_notifications w WHERE w.customer_id = c.id
            )
            ORDER BY c.created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut customers = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(customer) = self.get_customer_by_id(&id).await? {
                customers.push(customer);
            }
        }
        Ok(customers)
    }

    pub async fn insert_welcome_notification(
        &self,
        entry: &WelcomeNotificationRecord,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO welcome_notifications (
                customer_id, email, full_name, subject, sent_at, message_id
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.customer_id)
        .bind(&entry.email)
        .bind(&entry.full_name)
        .bind(&entry.subject)
        .bind(entry.sent_at)
        .bind(&entry.message_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Welcome log, newest first
    pub async fn list_welcome_notifications(&self) -> Result<Vec<WelcomeNotificationRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT customer_id, email, full_name, subject, sent_at, message_id
            FROM welcome_notifications
            ORDER BY sent_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(WelcomeNotificationRecord {
                    customer_id: row.try_get("customer_id")?,
                    email: row.try_get("email")?,
                    full_name: row.try_get("full_name")?,
                    subject: row.try_get("subject")?,
                    sent_at: row.try_get("sent_at")?,
                    message_id: row.try_get("message_id")?,
                })
            })
            .collect()
    }
}
