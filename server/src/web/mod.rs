pub mod handlers;
pub mod middleware;
pub mod server;
pub mod session;

pub use server::{create_router, session_layer, start_web_server};

use anyhow::Result;
use std::sync::Arc;

use crate::config::Config;
use crate::database::Database;
use crate::services::{
    AccountService, ChatNotifier, ChatService, ConversationHub, HubPublisher, PayPalClient,
    ScheduleService,
};

// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub database: Arc<Database>,
    pub accounts: Arc<AccountService>,
    pub schedules: Arc<ScheduleService>,
    pub chat: Arc<ChatService>,
    pub hub: ConversationHub,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        database: Arc<Database>,
        accounts: Arc<AccountService>,
        schedules: Arc<ScheduleService>,
        chat: Arc<ChatService>,
        hub: ConversationHub,
    ) -> Self {
        Self {
            config,
            database,
            accounts,
            schedules,
            chat,
            hub,
        }
    }

    /// Wires every service around one database and an in-process hub
    pub fn build(config: Arc<Config>, database: Arc<Database>) -> Result<Self> {
        let hub = ConversationHub::new();
        let notifier = ChatNotifier::new(
            database.clone(),
            Arc::new(HubPublisher::new(hub.clone())),
        );
        let paypal = PayPalClient::new(&config.paypal, &config.public_base_url)?;

        let accounts = Arc::new(AccountService::new(
            database.clone(),
            notifier.clone(),
            config.password_cost,
        ));
        let schedules = Arc::new(ScheduleService::new(
            database.clone(),
            paypal,
            notifier.clone(),
            config.business_timezone()?,
        ));
        let chat = Arc::new(ChatService::new(database.clone(), notifier));

        Ok(Self::new(
            config, database, accounts, schedules, chat, hub,
        ))
    }
}
