//! Database layer shared by the API server and the workers.
//!
//! This module provides SQLite persistence for:
//! - Customer accounts, vehicles, cancellations and oil-change history
//! - Schedules and the completed-schedule archive
//! - Conversations and bot replies
//! - Login and welcome-email logs
//!
//! The module is organized into submodules:
//! - `records` - All record types (entities)
//! - `customers` - Accounts, vehicles, cancellations, oil changes
//! - `catalog` - Service catalogue
//! - `schedules` - Live schedules, lifecycle flag updates, archive
//! - `conversations` - Chat conversations and bot replies
//! - `notifications` - Login log and welcome-email log

mod catalog;
mod conversations;
mod customers;
mod notifications;
mod records;
mod schedules;

pub use schedules::NotificationFlag;

pub use records::*;

use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;
use std::str::FromStr;
use tracing::{error, info};

const TABLES: &[(&str, &str)] = &[
    (
        "customers",
        r#"
        CREATE TABLE IF NOT EXISTS customers (
            id TEXT PRIMARY KEY,
            account_type TEXT NOT NULL,
            full_name TEXT NOT NULL,
            address TEXT NOT NULL DEFAULT '',
            phone TEXT NOT NULL DEFAULT '',
            office_phone TEXT NOT NULL DEFAULT '',
            email TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            profile_picture_url TEXT NOT NULL DEFAULT '',
            created_at DATETIME NOT NULL
        )
        "#,
    ),
    (
        "vehicles",
        r#"
        CREATE TABLE IF NOT EXISTS vehicles (
            id TEXT PRIMARY KEY,
            customer_id TEXT NOT NULL REFERENCES customers(id),
            brand TEXT NOT NULL DEFAULT '',
            year INTEGER NOT NULL DEFAULT 0,
            model TEXT NOT NULL DEFAULT '',
            engine TEXT NOT NULL DEFAULT '',
            color TEXT NOT NULL DEFAULT '',
            plate_last3 TEXT NOT NULL DEFAULT '',
            vin TEXT NOT NULL DEFAULT '',
            vin_image_url TEXT NOT NULL DEFAULT '',
            vehicle_image_url TEXT NOT NULL DEFAULT '',
            service_intervals TEXT NOT NULL DEFAULT '[]',
            service_interval INTEGER NOT NULL DEFAULT 0,
            base_interval INTEGER NOT NULL DEFAULT 0,
            milage INTEGER NOT NULL DEFAULT 0,
            position INTEGER NOT NULL DEFAULT 0
        )
        "#,
    ),
    (
        "cancellations",
        r#"
        CREATE TABLE IF NOT EXISTS cancellations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id TEXT NOT NULL REFERENCES customers(id),
            date DATETIME NOT NULL,
            service_name TEXT NOT NULL,
            brand TEXT NOT NULL DEFAULT '',
            model TEXT NOT NULL DEFAULT '',
            plate_last3 TEXT NOT NULL DEFAULT '',
            archived BOOLEAN NOT NULL DEFAULT 0
        )
        "#,
    ),
    (
        "oil_changes",
        r#"
        CREATE TABLE IF NOT EXISTS oil_changes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id TEXT NOT NULL REFERENCES customers(id),
            schedule_id TEXT NOT NULL,
            date TEXT NOT NULL,
            time TEXT NOT NULL,
            total REAL NOT NULL DEFAULT 0,
            offer_price TEXT NOT NULL DEFAULT '[]',
            client_address TEXT NOT NULL DEFAULT '',
            completed_at DATETIME,
            completed_by TEXT,
            service_milage INTEGER,
            vehicle TEXT,
            recorded_at DATETIME NOT NULL,
            UNIQUE (customer_id, schedule_id)
        )
        "#,
    ),
    (
        "services",
        r#"
        CREATE TABLE IF NOT EXISTS services (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            description2 TEXT NOT NULL DEFAULT '',
            details TEXT NOT NULL DEFAULT '',
            notes TEXT NOT NULL DEFAULT '',
            price_from REAL NOT NULL DEFAULT 0,
            price_to REAL NOT NULL DEFAULT 0,
            oil_capacity_from REAL NOT NULL DEFAULT 0,
            oil_capacity_to REAL NOT NULL DEFAULT 0,
            category TEXT NOT NULL DEFAULT '',
            image_path TEXT NOT NULL DEFAULT '',
            created_at DATETIME NOT NULL
        )
        "#,
    ),
    (
        "schedules",
        r#"
        CREATE TABLE IF NOT EXISTS schedules (
            id TEXT PRIMARY KEY,
            customer_id TEXT NOT NULL,
            account_type TEXT NOT NULL,
            customer_name TEXT NOT NULL DEFAULT '',
            email TEXT,
            date TEXT NOT NULL,
            time TEXT NOT NULL,
            total REAL NOT NULL DEFAULT 0,
            client_address TEXT NOT NULL DEFAULT '',
            offer_price TEXT NOT NULL DEFAULT '[]',
            secured BOOLEAN NOT NULL DEFAULT 0,
            reserved BOOLEAN NOT NULL DEFAULT 0,
            vehicles TEXT NOT NULL DEFAULT '[]',
            confirmed BOOLEAN NOT NULL DEFAULT 0,
            paid BOOLEAN NOT NULL DEFAULT 0,
            processed BOOLEAN NOT NULL DEFAULT 0,
            completed BOOLEAN NOT NULL DEFAULT 0,
            completed_at DATETIME,
            completed_by TEXT,
            service_milage INTEGER,
            invoice_id TEXT,
            paypal_order_id TEXT,
            fleet_notified BOOLEAN NOT NULL DEFAULT 0,
            fleet_processed_notified BOOLEAN NOT NULL DEFAULT 0,
            invoice_sent_notified BOOLEAN NOT NULL DEFAULT 0,
            confirmation_notified BOOLEAN NOT NULL DEFAULT 0,
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL
        )
        "#,
    ),
    (
        "schedules_completed",
        r#"
        CREATE TABLE IF NOT EXISTS schedules_completed (
            id TEXT PRIMARY KEY,
            customer_id TEXT NOT NULL,
            account_type TEXT NOT NULL,
            customer_name TEXT NOT NULL DEFAULT '',
            email TEXT,
            date TEXT NOT NULL,
            time TEXT NOT NULL,
            total REAL NOT NULL DEFAULT 0,
            client_address TEXT NOT NULL DEFAULT '',
            offer_price TEXT NOT NULL DEFAULT '[]',
            secured BOOLEAN NOT NULL DEFAULT 0,
            reserved BOOLEAN NOT NULL DEFAULT 0,
            vehicles TEXT NOT NULL DEFAULT '[]',
            confirmed BOOLEAN NOT NULL DEFAULT 0,
            paid BOOLEAN NOT NULL DEFAULT 0,
            processed BOOLEAN NOT NULL DEFAULT 0,
            completed BOOLEAN NOT NULL DEFAULT 0,
            completed_at DATETIME,
            completed_by TEXT,
            service_milage INTEGER,
            invoice_id TEXT,
            paypal_order_id TEXT,
            fleet_notified BOOLEAN NOT NULL DEFAULT 0,
            fleet_processed_notified BOOLEAN NOT NULL DEFAULT 0,
            invoice_sent_notified BOOLEAN NOT NULL DEFAULT 0,
            confirmation_notified BOOLEAN NOT NULL DEFAULT 0,
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL,
            moved_at DATETIME NOT NULL
        )
        "#,
    ),
    (
        "conversations",
        r#"
        CREATE TABLE IF NOT EXISTS conversations (
            id TEXT PRIMARY KEY,
            customer_id TEXT UNIQUE NOT NULL,
            archived BOOLEAN NOT NULL DEFAULT 0,
            created_at DATETIME NOT NULL,
            updated_at DATETIME NOT NULL
        )
        "#,
    ),
    (
        "conversation_messages",
        r#"
        CREATE TABLE IF NOT EXISTS conversation_messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            conversation_id TEXT NOT NULL REFERENCES conversations(id),
            sender TEXT NOT NULL,
            text TEXT NOT NULL DEFAULT '',
            image_url TEXT NOT NULL DEFAULT '',
            at DATETIME NOT NULL
        )
        "#,
    ),
    (
        "bot_replies",
        r#"
        CREATE TABLE IF NOT EXISTS bot_replies (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            question TEXT UNIQUE NOT NULL,
            answer TEXT NOT NULL,
            match_type TEXT NOT NULL DEFAULT 'partial'
        )
        "#,
    ),
    (
        "login_log",
        r#"
        CREATE TABLE IF NOT EXISTS login_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id TEXT NOT NULL,
            full_name TEXT NOT NULL,
            email TEXT NOT NULL,
            account_type TEXT NOT NULL,
            ip TEXT NOT NULL DEFAULT '',
            at DATETIME NOT NULL
        )
        "#,
    ),
    (
        "welcome_notifications",
        r#"
        CREATE TABLE IF NOT EXISTS welcome_notifications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id TEXT UNIQUE NOT NULL,
            email TEXT NOT NULL,
            full_name TEXT NOT NULL,
            subject TEXT NOT NULL,
            sent_at DATETIME NOT NULL,
            message_id TEXT NOT NULL
        )
        "#,
    ),
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_vehicles_customer ON vehicles(customer_id, position)",
    "CREATE INDEX IF NOT EXISTS idx_cancellations_customer ON cancellations(customer_id)",
    "CREATE INDEX IF NOT EXISTS idx_schedules_customer_date ON schedules(customer_id, date)",
    "CREATE INDEX IF NOT EXISTS idx_schedules_account_type ON schedules(account_type, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_messages_conversation ON conversation_messages(conversation_id, id)",
];

pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Expose pool for the session store and integration test queries
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn new(database_path: &str) -> Result<Self> {
        info!("=== Starting database initialization ===");
        info!("Database path: {}", database_path);

        if let Some(parent) = Path::new(database_path).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    error!("FAILED to create parent directory {:?}: {}", parent, e);
                    return Err(e.into());
                }
            }
        }

        // The server and the workers open the same file concurrently
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", database_path))?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5));

        let pool = match SqlitePoolOptions::new().connect_with(options).await {
            Ok(pool) => {
                info!("Successfully connected to SQLite database");
                pool
            }
            Err(e) => {
                error!("FAILED to connect to database {}: {}", database_path, e);
                return Err(e.into());
            }
        };

        let database = Self { pool };
        database.initialize_tables().await?;
        database.test_database().await?;

        info!("=== Database initialization completed successfully ===");
        Ok(database)
    }

    /// Private in-memory database, used by tests and throwaway runs
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let database = Self { pool };
        database.initialize_tables().await?;
        Ok(database)
    }

    async fn initialize_tables(&self) -> Result<()> {
        for (step, (name, sql)) in TABLES.iter().enumerate() {
            info!("Step {}: Creating {} table...", step + 1, name);
            if let Err(e) = sqlx::query(sql).execute(&self.pool).await {
                error!("FAILED to create {} table: {}", name, e);
                return Err(e.into());
            }
        }

        for sql in INDEXES {
            if let Err(e) = sqlx::query(sql).execute(&self.pool).await {
                error!("FAILED to create index: {}", e);
                error!("SQL was: {}", sql);
                return Err(e.into());
            }
        }

        info!("All database tables and indexes created successfully");
        Ok(())
    }

    async fn test_database(&self) -> Result<()> {
        let names: Vec<&str> = TABLES.iter().map(|(name, _)| *name).collect();
        let tables: Vec<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type='table'")
                .fetch_all(&self.pool)
                .await?;

        let missing: Vec<&&str> = names
            .iter()
            .filter(|name| !tables.iter().any(|t| t == *name))
            .collect();

        if !missing.is_empty() {
            error!("Missing tables after initialization: {:?}", missing);
            return Err(anyhow!("Database tables not properly created"));
        }

        info!("All {} required tables exist", names.len());
        Ok(())
    }
}

pub(crate) fn json_column<T: DeserializeOwned>(row: &SqliteRow, column: &str) -> Result<T> {
    let raw: String = row.try_get(column)?;
    serde_json::from_str(&raw)
        .map_err(|e| anyhow!("Corrupt JSON in column '{}': {}", column, e))
}

pub(crate) fn optional_json_column<T: DeserializeOwned>(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<T>> {
    let raw: Option<String> = row.try_get(column)?;
    match raw {
        Some(raw) => Ok(Some(serde_json::from_str(&raw).map_err(|e| {
            anyhow!("Corrupt JSON in column '{}': {}", column, e)
        })?)),
        None => Ok(None),
    }
}
