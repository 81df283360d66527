//! Service catalogue database operations.

use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use super::records::ServiceRecord;
use super::Database;

fn service_from_row(row: &SqliteRow) -> Result<ServiceRecord> {
    Ok(ServiceRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        description2: row.try_get("description2")?,
        details: row.try_get("details")?,
        notes: row.try_get("notes")?,
        price_from: row.try_get("price_from")?,
        price_to: row.try_get("price_to")?,
        oil_capacity_from: row.try_get("oil_capacity_from")?,
        oil_capacity_to: row.try_get("oil_capacity_to")?,
        category: row.try_get("category")?,
        image_path: row.try_get("image_path")?,
        created_at: row.try_get("created_at")?,
    })
}

impl Database {
    pub async fn insert_service(&self, service: &ServiceRecord) -> Result<()> {
        debug!("Storing service: {} ({})", service.name, service.id);

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO services (
                id, name, description, description2, details, notes,
                price_from, price_to, oil_capacity_from, oil_capacity_to,
                category, image_path, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&service.id)
        .bind(&service.name)
        .bind(&service.description)
        .bind(&service.description2)
        .bind(&service.details)
        .bind(&service.notes)
        .bind(service.price_from)
        .bind(service.price_to)
        .bind(service.oil_capacity_from)
        .bind(service.oil_capacity_to)
        .bind(&service.category)
        .bind(&service.image_path)
        .bind(service.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_services(&self) -> Result<Vec<ServiceRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, description2, details, notes,
                   price_from, price_to, oil_capacity_from, oil_capacity_to,
                   category, image_path, created_at
            FROM services
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(service_from_row).collect()
    }

    pub async fn get_service_name(&self, service_id: &str) -> Result<Option<String>> {
        let name = sqlx::query_scalar("SELECT name FROM services WHERE id = ?")
            .bind(service_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(name)
    }
}
