//! Customer, vehicle, cancellation and oil-change database operations.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, error};

use super::records::{
    AccountType, CancellationRecord, CancelledVehicle, CustomerRecord, OilChangeRecord,
    VehicleRecord,
};
use super::{json_column, optional_json_column, Database};

const CUSTOMER_COLUMNS: &str = "id, account_type, full_name, address, phone, office_phone, \
     email, password_hash, profile_picture_url, created_at";

const VEHICLE_COLUMNS: &str = "id, customer_id, brand, year, model, engine, color, plate_last3, \
     vin, vin_image_url, vehicle_image_url, service_intervals, service_interval, \
     base_interval, milage";

fn customer_from_row(row: &SqliteRow) -> Result<CustomerRecord> {
    let account_type: String = row.try_get("account_type")?;
    Ok(CustomerRecord {
        id: row.try_get("id")?,
        account_type: AccountType::parse(&account_type),
        full_name: row.try_get("full_name")?,
        address: row.try_get("address")?,
        phone: row.try_get("phone")?,
        office_phone: row.try_get("office_phone")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        profile_picture_url: row.try_get("profile_picture_url")?,
        created_at: row.try_get("created_at")?,
    })
}

fn vehicle_from_row(row: &SqliteRow) -> Result<VehicleRecord> {
    Ok(VehicleRecord {
        id: row.try_get("id")?,
        customer_id: row.try_get("customer_id")?,
        brand: row.try_get("brand")?,
        year: row.try_get("year")?,
        model: row.try_get("model")?,
        engine: row.try_get("engine")?,
        color: row.try_get("color")?,
        plate_last3: row.try_get("plate_last3")?,
        vin: row.try_get("vin")?,
        vin_image_url: row.try_get("vin_image_url")?,
        vehicle_image_url: row.try_get("vehicle_image_url")?,
        service_intervals: json_column(row, "service_intervals")?,
        interval: row.try_get("service_interval")?,
        base_interval: row.try_get("base_interval")?,
        milage: row.try_get("milage")?,
    })
}

impl Database {
    pub async fn insert_customer(&self, customer: &CustomerRecord) -> Result<()> {
        debug!("Storing customer: {}", customer.id);

        match sqlx::query(
            r#"
            INSERT INTO customers (
                id, account_type, full_name, address, phone, office_phone,
                email, password_hash, profile_picture_url, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&customer.id)
        .bind(customer.account_type.as_str())
        .bind(&customer.full_name)
        .bind(&customer.address)
        .bind(&customer.phone)
        .bind(&customer.office_phone)
        .bind(&customer.email)
        .bind(&customer.password_hash)
        .bind(&customer.profile_picture_url)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("Failed to store customer {}: {}", customer.id, e);
                Err(e.into())
            }
        }
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    pub async fn get_customer_by_id(&self, customer_id: &str) -> Result<Option<CustomerRecord>> {
        let sql = format!("SELECT {} FROM customers WHERE id = ?", CUSTOMER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(customer_from_row).transpose()
    }

    pub async fn get_customer_by_email(&self, email: &str) -> Result<Option<CustomerRecord>> {
        let sql = format!("SELECT {} FROM customers WHERE email = ?", CUSTOMER_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(customer_from_row).transpose()
    }

    pub async fn list_customers(&self) -> Result<Vec<CustomerRecord>> {
        let sql = format!(
            "SELECT {} FROM customers ORDER BY created_at DESC",
            CUSTOMER_COLUMNS
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.iter().map(customer_from_row).collect()
    }

    // ------------------------------------------------------------------------
    // Vehicles
    // ------------------------------------------------------------------------

    pub async fn insert_vehicle(&self, vehicle: &VehicleRecord) -> Result<()> {
        debug!(
            "Storing vehicle {} for customer {}",
            vehicle.id, vehicle.customer_id
        );

        sqlx::query(
            r#"
            INSERT INTO vehicles (
                id, customer_id, brand, year, model, engine, color, plate_last3,
                vin, vin_image_url, vehicle_image_url, service_intervals,
                service_interval, base_interval, milage, position
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                (SELECT COALESCE(MAX(position), -1) + 1 FROM vehicles WHERE customer_id = ?))
            "#,
        )
        .bind(&vehicle.id)
        .bind(&vehicle.customer_id)
        .bind(&vehicle.brand)
        .bind(vehicle.year)
        .bind(&vehicle.model)
        .bind(&vehicle.engine)
        .bind(&vehicle.color)
        .bind(&vehicle.plate_last3)
        .bind(&vehicle.vin)
        .bind(&vehicle.vin_image_url)
        .bind(&vehicle.vehicle_image_url)
        .bind(serde_json::to_string(&vehicle.service_intervals)?)
        .bind(vehicle.interval)
        .bind(vehicle.base_interval)
        .bind(vehicle.milage)
        .bind(&vehicle.customer_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_vehicles(&self, customer_id: &str) -> Result<Vec<VehicleRecord>> {
        let sql = format!(
            "SELECT {} FROM vehicles WHERE customer_id = ? ORDER BY position",
            VEHICLE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(vehicle_from_row).collect()
    }

    /// Returns false when the vehicle does not exist or belongs to another customer
    pub async fn update_vehicle_milage(
        &self,
        customer_id: &str,
        vehicle_id: &str,
        milage: i64,
    ) -> Result<bool> {
        let result =
            sqlx::query("UPDATE vehicles SET milage = ? WHERE id = ? AND customer_id = ?")
                .bind(milage)
                .bind(vehicle_id)
                .bind(customer_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    // ------------------------------------------------------------------------
    // Cancellations
    // ------------------------------------------------------------------------

    pub async fn insert_cancellation(
        &self,
        customer_id: &str,
        cancellation: &CancellationRecord,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cancellations (
                customer_id, date, service_name, brand, model, plate_last3, archived
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(customer_id)
        .bind(cancellation.date)
        .bind(&cancellation.service_name)
        .bind(&cancellation.vehicle_info.brand)
        .bind(&cancellation.vehicle_info.model)
        .bind(&cancellation.vehicle_info.plate_last3)
        .bind(cancellation.archived)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_cancellations(&self, customer_id: &str) -> Result<Vec<CancellationRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT date, service_name, brand, model, plate_last3, archived
            FROM cancellations
            WHERE customer_id = ?
            ORDER BY id
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(CancellationRecord {
                    date: row.try_get("date")?,
                    service_name: row.try_get("service_name")?,
                    vehicle_info: CancelledVehicle {
                        brand: row.try_get("brand")?,
                        model: row.try_get("model")?,
                        plate_last3: row.try_get("plate_last3")?,
                    },
                    archived: row.try_get("archived")?,
                })
            })
            .collect()
    }

    /// Flips the archived flag of the first cancellation recorded at `date`.
    /// Returns the new flag, or None when no such cancellation exists.
    pub async fn toggle_cancellation_archive(
        &self,
        customer_id: &str,
        date: DateTime<Utc>,
    ) -> Result<Option<bool>> {
        let row = sqlx::query(
            r#"
            SELECT id, archived FROM cancellations
            WHERE customer_id = ? AND date = ?
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(customer_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            debug!("No cancellation at {} for customer {}", date, customer_id);
            return Ok(None);
        };

        let id: i64 = row.try_get("id")?;
        let archived: bool = row.try_get("archived")?;

        sqlx::query("UPDATE cancellations SET archived = ? WHERE id = ?")
            .bind(!archived)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(Some(!archived))
    }

    // ------------------------------------------------------------------------
    // Oil changes
    // ------------------------------------------------------------------------

    pub async fn has_oil_change(&self, customer_id: &str, schedule_id: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM oil_changes WHERE customer_id = ? AND schedule_id = ?",
        )
        .bind(customer_id)
        .bind(schedule_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    /// Returns false when the entry already existed
    pub async fn insert_oil_change(&self, entry: &OilChangeRecord) -> Result<bool> {
        let vehicle = entry
            .vehicle
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO oil_changes (
                customer_id, schedule_id, date, time, total, offer_price,
                client_address, completed_at, completed_by, service_milage,
                vehicle, recorded_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.customer_id)
        .bind(&entry.schedule_id)
        .bind(&entry.date)
        .bind(&entry.time)
        .bind(entry.total)
        .bind(serde_json::to_string(&entry.offer_price)?)
        .bind(&entry.client_address)
        .bind(entry.completed_at)
        .bind(&entry.completed_by)
        .bind(entry.service_milage)
        .bind(vehicle)
        .bind(entry.recorded_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_oil_changes(&self, customer_id: &str) -> Result<Vec<OilChangeRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT customer_id, schedule_id, date, time, total, offer_price,
                   client_address, completed_at, completed_by, service_milage,
                   vehicle, recorded_at
            FROM oil_changes
            WHERE customer_id = ?
            ORDER BY id
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(OilChangeRecord {
                    customer_id: row.try_get("customer_id")?,
                    schedule_id: row.try_get("schedule_id")?,
                    date: row.try_get("date")?,
                    time: row.try_get("time")?,
                    total: row.try_get("total")?,
                    offer_price: json_column(row, "offer_price")?,
                    client_address: row.try_get("client_address")?,
                    completed_at: row.try_get("completed_at")?,
                    completed_by: row.try_get("completed_by")?,
                    service_milage: row.try_get("service_milage")?,
                    vehicle: optional_json_column(row, "vehicle")?,
                    recorded_at: row.try_get("recorded_at")?,
                })
            })
            .collect()
    }
}
