//! Worker context over an in-memory database with recording seams

use anyhow::Result;
use server::config::Config;
use server::database::{AccountType, CustomerRecord, Database, ScheduleRecord};
use std::sync::Arc;
use workers::WorkerContext;

use super::recording::{RecordingMailer, RecordingPublisher};
use super::test_data::{sample_customer, sample_schedule, OFFICE_KEY};

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.office_api_key = OFFICE_KEY.to_string();
    config.unpaid_grace_minutes = 30;
    config
}

pub struct TestContext {
    pub context: WorkerContext,
    pub publisher: Arc<RecordingPublisher>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestContext {
    pub async fn new() -> Result<Self> {
        Self::with(test_config(), RecordingMailer::new()).await
    }

    pub async fn with(config: Config, mailer: RecordingMailer) -> Result<Self> {
        let database = Arc::new(Database::in_memory().await?);
        let publisher = Arc::new(RecordingPublisher::new());
        let mailer = Arc::new(mailer);
        let context = WorkerContext::new(
            Arc::new(config),
            database,
            publisher.clone(),
            mailer.clone(),
        )?;
        Ok(Self {
            context,
            publisher,
            mailer,
        })
    }

    pub fn database(&self) -> Arc<Database> {
        self.context.database.clone()
    }

    pub async fn seed_customer(&self, account_type: AccountType) -> Result<CustomerRecord> {
        let customer = sample_customer(account_type);
        self.context.database.insert_customer(&customer).await?;
        Ok(customer)
    }

    /// Inserts a schedule for a new customer after `adjust` has shaped it
    pub async fn seed_schedule<F>(
        &self,
        account_type: AccountType,
        adjust: F,
    ) -> Result<(CustomerRecord, ScheduleRecord)>
    where
        F: FnOnce(ScheduleRecord) -> ScheduleRecord,
    {
        let customer = self.seed_customer(account_type).await?;
        let schedule = adjust(sample_schedule(&customer));
        self.context.database.insert_schedule(&schedule).await?;
        Ok((customer, schedule))
    }
}
