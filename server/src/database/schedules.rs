//! Schedule database operations: live appointments, lifecycle flag updates
//! and the completed-schedule archive.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, error, info};

use super::records::{AccountType, CompletedScheduleRecord, ScheduleRecord};
use super::{json_column, Database};

const SCHEDULE_COLUMNS: &str = "id, customer_id, account_type, customer_name, email, date, time, \
     total, client_address, offer_price, secured, reserved, vehicles, confirmed, paid, \
     processed, completed, completed_at, completed_by, service_milage, invoice_id, \
     paypal_order_id, fleet_notified, fleet_processed_notified, invoice_sent_notified, \
     confirmation_notified, created_at, updated_at";

/// Notification flags set by the workers once a message went out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationFlag {
    FleetNotified,
    FleetProcessedNotified,
    InvoiceSentNotified,
    ConfirmationNotified,
}

impl NotificationFlag {
    fn column(&self) -> &'static str {
        match self {
            NotificationFlag::FleetNotified => "fleet_notified",
            NotificationFlag::FleetProcessedNotified => "fleet_processed_notified",
            NotificationFlag::InvoiceSentNotified => "invoice_sent_notified",
            NotificationFlag::ConfirmationNotified => "confirmation_notified",
        }
    }
}

fn schedule_from_row(row: &SqliteRow) -> Result<ScheduleRecord> {
    let account_type: String = row.try_get("account_type")?;
    Ok(ScheduleRecord {
        id: row.try_get("id")?,
        customer_id: row.try_get("customer_id")?,
        account_type: AccountType::parse(&account_type),
        customer_name: row.try_get("customer_name")?,
        email: row.try_get("email")?,
        date: row.try_get("date")?,
        time: row.try_get("time")?,
        total: row.try_get("total")?,
        client_address: row.try_get("client_address")?,
        offer_price: json_column(row, "offer_price")?,
        secured: row.try_get("secured")?,
        reserved: row.try_get("reserved")?,
        vehicles: json_column(row, "vehicles")?,
        confirmed: row.try_get("confirmed")?,
        paid: row.try_get("paid")?,
        processed: row.try_get("processed")?,
        completed: row.try_get("completed")?,
        completed_at: row.try_get("completed_at")?,
        completed_by: row.try_get("completed_by")?,
        service_milage: row.try_get("service_milage")?,
        invoice_id: row.try_get("invoice_id")?,
        paypal_order_id: row.try_get("paypal_order_id")?,
        fleet_notified: row.try_get("fleet_notified")?,
        fleet_processed_notified: row.try_get("fleet_processed_notified")?,
        invoice_sent_notified: row.try_get("invoice_sent_notified")?,
        confirmation_notified: row.try_get("confirmation_notified")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl Database {
    pub async fn insert_schedule(&self, schedule: &ScheduleRecord) -> Result<()> {
        debug!(
            "Storing schedule {} for customer {}",
            schedule.id, schedule.customer_id
        );

        let sql = format!(
            "INSERT INTO schedules ({}) VALUES ({})",
            SCHEDULE_COLUMNS,
            vec!["?"; 28].join(", ")
        );

        match bind_schedule(sqlx::query(&sql), schedule)?
            .execute(&self.pool)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("Failed to store schedule {}: {}", schedule.id, e);
                Err(e.into())
            }
        }
    }

    pub async fn get_schedule(&self, schedule_id: &str) -> Result<Option<ScheduleRecord>> {
        let sql = format!("SELECT {} FROM schedules WHERE id = ?", SCHEDULE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(schedule_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(schedule_from_row).transpose()
    }

    pub async fn list_schedules_for_customer(
        &self,
        customer_id: &str,
    ) -> Result<Vec<ScheduleRecord>> {
        let sql = format!(
            "SELECT {} FROM schedules WHERE customer_id = ? ORDER BY date, created_at",
            SCHEDULE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(schedule_from_row).collect()
    }

    pub async fn list_schedules_by_account_type(
        &self,
        account_type: AccountType,
    ) -> Result<Vec<ScheduleRecord>> {
        let sql = format!(
            "SELECT {} FROM schedules WHERE account_type = ? ORDER BY created_at",
            SCHEDULE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(account_type.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(schedule_from_row).collect()
    }

    /// Fleet schedules, newest first, with the customer's current name
    pub async fn list_fleet_schedules_with_customer(&self) -> Result<Vec<ScheduleRecord>> {
        let columns: Vec<String> = SCHEDULE_COLUMNS
            .split(',')
            .map(|c| c.trim())
            .map(|c| {
                if c == "customer_name" {
                    "COALESCE(c.full_name, s.customer_name) AS customer_name".to_string()
                } else {
                    format!("s.{}", c)
                }
            })
            .collect();

        let sql = format!(
            "SELECT {} FROM schedules s LEFT JOIN customers c ON c.id = s.customer_id \
             WHERE s.account_type = ? ORDER BY s.created_at DESC",
            columns.join(", ")
        );
        let rows = sqlx::query(&sql)
            .bind(AccountType::Fleet.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(schedule_from_row).collect()
    }

    pub async fn list_completed_schedules(&self) -> Result<Vec<ScheduleRecord>> {
        let sql = format!(
            "SELECT {} FROM schedules WHERE completed = 1 ORDER BY completed_at",
            SCHEDULE_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(schedule_from_row).collect()
    }

    /// Slot labels the customer already booked on `date`
    pub async fn booked_times(&self, customer_id: &str, date: &str) -> Result<Vec<String>> {
        let times = sqlx::query_scalar("SELECT time FROM schedules WHERE customer_id = ? AND date = ?")
            .bind(customer_id)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;
        Ok(times)
    }

    // ------------------------------------------------------------------------
    // Lifecycle updates
    // ------------------------------------------------------------------------

    async fn update_schedule(&self, schedule_id: &str, assignments: &str) -> Result<bool> {
        let sql = format!(
            "UPDATE schedules SET {}, updated_at = ? WHERE id = ?",
            assignments
        );
        let result = sqlx::query(&sql)
            .bind(Utc::now())
            .bind(schedule_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_notification_flag(
        &self,
        schedule_id: &str,
        flag: NotificationFlag,
    ) -> Result<bool> {
        debug!("Setting {} on schedule {}", flag.column(), schedule_id);
        self.update_schedule(schedule_id, &format!("{} = 1", flag.column()))
            .await
    }

    pub async fn mark_schedule_confirmed(&self, schedule_id: &str) -> Result<bool> {
        self.update_schedule(schedule_id, "confirmed = 1").await
    }

    pub async fn mark_schedule_processed(&self, schedule_id: &str) -> Result<bool> {
        self.update_schedule(schedule_id, "processed = 1").await
    }

    /// Marks the schedule paid and confirmed, as a captured payment does
    pub async fn mark_schedule_paid(&self, schedule_id: &str) -> Result<bool> {
        self.update_schedule(schedule_id, "paid = 1, confirmed = 1").await
    }

    pub async fn set_schedule_invoice(&self, schedule_id: &str, invoice_id: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE schedules SET invoice_id = ?, updated_at = ? WHERE id = ?")
            .bind(invoice_id)
            .bind(Utc::now())
            .bind(schedule_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_schedule_paypal_order(&self, schedule_id: &str, order_id: &str) -> Result<bool> {
        let result =
            sqlx::query("UPDATE schedules SET paypal_order_id = ?, updated_at = ? WHERE id = ?")
                .bind(order_id)
                .bind(Utc::now())
                .bind(schedule_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn mark_schedule_completed(
        &self,
        schedule_id: &str,
        completed_by: &str,
        service_milage: Option<i64>,
        completed_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE schedules
            SET completed = 1, completed_at = ?, completed_by = ?,
                service_milage = COALESCE(?, service_milage), updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(completed_at)
        .bind(completed_by)
        .bind(service_milage)
        .bind(Utc::now())
        .bind(schedule_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_schedule(&self, schedule_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = ?")
            .bind(schedule_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Deletes the listed schedules that are still unpaid, uncompleted customer
    /// bookings. A schedule captured after it was listed stays in place.
    pub async fn delete_unpaid_customer_schedules(&self, schedule_ids: &[String]) -> Result<u64> {
        if schedule_ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; schedule_ids.len()].join(", ");
        let sql = format!(
            "DELETE FROM schedules WHERE id IN ({}) \
             AND paid = 0 AND completed = 0 AND account_type = ?",
            placeholders
        );
        let mut query = sqlx::query(&sql);
        for id in schedule_ids {
            query = query.bind(id);
        }
        query = query.bind(AccountType::Customer.as_str());
        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    // ------------------------------------------------------------------------
    // Completed archive
    // ------------------------------------------------------------------------

    /// Copies the schedule into the archive (unless already there) and removes
    /// it from the live table in one transaction. Returns true when a new
    /// archive row was written.
    pub async fn move_to_completed(
        &self,
        schedule: &ScheduleRecord,
        moved_at: DateTime<Utc>,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT OR IGNORE INTO schedules_completed ({}, moved_at) VALUES ({})",
            SCHEDULE_COLUMNS,
            vec!["?"; 29].join(", ")
        );
        let inserted = bind_schedule(sqlx::query(&sql), schedule)?
            .bind(moved_at)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        sqlx::query("DELETE FROM schedules WHERE id = ?")
            .bind(&schedule.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if inserted {
            info!("Archived completed schedule {}", schedule.id);
        } else {
            debug!(
                "Schedule {} was already archived, removed live copy",
                schedule.id
            );
        }
        Ok(inserted)
    }

    pub async fn list_archived_schedules(&self) -> Result<Vec<CompletedScheduleRecord>> {
        let sql = format!(
            "SELECT {}, moved_at FROM schedules_completed ORDER BY moved_at",
            SCHEDULE_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                Ok(CompletedScheduleRecord {
                    schedule: schedule_from_row(row)?,
                    moved_at: row.try_get("moved_at")?,
                })
            })
            .collect()
    }
}

fn bind_schedule<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    schedule: &'q ScheduleRecord,
) -> Result<sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>> {
    Ok(query
        .bind(&schedule.id)
        .bind(&schedule.customer_id)
        .bind(schedule.account_type.as_str())
        .bind(&schedule.customer_name)
        .bind(&schedule.email)
        .bind(&schedule.date)
        .bind(&schedule.time)
        .bind(schedule.total)
        .bind(&schedule.client_address)
        .bind(serde_json::to_string(&schedule.offer_price)?)
        .bind(schedule.secured)
        .bind(schedule.reserved)
        .bind(serde_json::to_string(&schedule.vehicles)?)
        .bind(schedule.confirmed)
        .bind(schedule.paid)
        .bind(schedule.processed)
        .bind(schedule.completed)
        .bind(schedule.completed_at)
        .bind(&schedule.completed_by)
        .bind(schedule.service_milage)
        .bind(&schedule.invoice_id)
        .bind(&schedule.paypal_order_id)
        .bind(schedule.fleet_notified)
        .bind(schedule.fleet_processed_notified)
        .bind(schedule.invoice_sent_notified)
        .bind(schedule.confirmation_notified)
        .bind(schedule.created_at)
        .bind(schedule.updated_at))
}
