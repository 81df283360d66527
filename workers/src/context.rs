use anyhow::Result;
use chrono_tz::Tz;
use server::config::Config;
use server::database::Database;
use server::services::{build_mailer, ChatNotifier, ConversationPublisher, Mailer, RelayPublisher};
use std::sync::Arc;

use crate::history::MovedHistory;

/// Shared handles every worker pass runs against
#[derive(Clone)]
pub struct WorkerContext {
    pub config: Arc<Config>,
    pub database: Arc<Database>,
    pub notifier: ChatNotifier,
    pub mailer: Arc<dyn Mailer>,
    pub history: MovedHistory,
    pub timezone: Tz,
}

impl WorkerContext {
    pub fn new(
        config: Arc<Config>,
        database: Arc<Database>,
        publisher: Arc<dyn ConversationPublisher>,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Self> {
        let timezone = config.business_timezone()?;
        Ok(Self {
            notifier: ChatNotifier::new(database.clone(), publisher),
            config,
            database,
            mailer,
            history: MovedHistory::new(),
            timezone,
        })
    }

    /// Chat updates go through the API server's relay endpoint
    pub fn from_config(config: Arc<Config>, database: Arc<Database>) -> Result<Self> {
        let publisher = Arc::new(RelayPublisher::new(
            &config.realtime.hub_url,
            &config.office_api_key,
        )?);
        let mailer = build_mailer(&config.email)?;
        Self::new(config, database, publisher, mailer)
    }
}
