//! Test database utilities for in-memory SQLite testing

use anyhow::Result;
use server::database::{AccountType, CustomerRecord, Database, ScheduleRecord, VehicleRecord};
use std::sync::Arc;

use super::test_data::{sample_customer, sample_schedule, sample_vehicle};

/// Test database wrapper for in-memory SQLite
pub struct TestDatabase {
    database: Arc<Database>,
}

impl TestDatabase {
    /// Create a new in-memory test database with every table in place
    pub async fn new() -> Result<Self> {
        Ok(Self {
            database: Arc::new(Database::in_memory().await?),
        })
    }

    pub fn database(&self) -> Arc<Database> {
        self.database.clone()
    }

    pub async fn seed_customer(&self, account_type: AccountType) -> Result<CustomerRecord> {
        let customer = sample_customer(account_type);
        self.database.insert_customer(&customer).await?;
        Ok(customer)
    }

    pub async fn seed_vehicle(&self, customer_id: &str) -> Result<VehicleRecord> {
        let vehicle = sample_vehicle(customer_id);
        self.database.insert_vehicle(&vehicle).await?;
        Ok(vehicle)
    }

    /// Customer with one vehicle and one untouched schedule
    pub async fn seed_booking(
        &self,
        account_type: AccountType,
    ) -> Result<(CustomerRecord, ScheduleRecord)> {
        let customer = self.seed_customer(account_type).await?;
        let vehicle = self.seed_vehicle(&customer.id).await?;
        let schedule = sample_schedule(&customer, &vehicle);
        self.database.insert_schedule(&schedule).await?;
        Ok((customer, schedule))
    }

    pub async fn count(&self, table: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(self.database.pool())
            .await?;
        Ok(count)
    }
}
