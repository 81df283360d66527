pub mod manager;
pub mod secrets;

use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::defaults;

pub use manager::ConfigManager;
pub use secrets::SecretsLoader;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    // Shared secret for back-office routes and the worker relay
    #[serde(default)]
    pub office_api_key: String,
    #[serde(default = "default_password_cost")]
    pub password_cost: u32,
    #[serde(default = "default_unpaid_grace_minutes")]
    pub unpaid_grace_minutes: i64,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub paypal: PayPalConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub workers: WorkersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayPalConfig {
    #[serde(default = "default_paypal_mode")]
    pub mode: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub secret: String,
    // Replaces the live/sandbox endpoint, used against local mocks
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_email_from")]
    pub from: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    #[serde(default = "default_public_base_url")]
    pub hub_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkersConfig {
    #[serde(default = "default_workers_port")]
    pub port: u16,
    #[serde(default = "completed_mover_job")]
    pub completed_mover: JobConfig,
    #[serde(default = "fleet_notifier_job")]
    pub fleet_notifier: JobConfig,
    #[serde(default = "unpaid_remover_job")]
    pub unpaid_remover: JobConfig,
    #[serde(default = "oil_changes_job")]
    pub oil_changes: JobConfig,
    #[serde(default = "welcome_mailer_job")]
    pub welcome_mailer: JobConfig,
    #[serde(default = "confirmation_notifier_job")]
    pub confirmation_notifier: JobConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub schedule: String,
}

impl JobConfig {
    fn every(schedule: &str) -> Self {
        Self {
            enabled: true,
            schedule: schedule.to_string(),
        }
    }
}

fn default_host() -> String {
    defaults::HOST.to_string()
}

fn default_port() -> u16 {
    defaults::PORT
}

fn default_database_path() -> String {
    defaults::DATABASE_PATH.to_string()
}

fn default_public_base_url() -> String {
    defaults::PUBLIC_BASE_URL.to_string()
}

fn default_cors_origin() -> String {
    defaults::CORS_ORIGIN.to_string()
}

fn default_password_cost() -> u32 {
    defaults::PASSWORD_COST
}

fn default_unpaid_grace_minutes() -> i64 {
    defaults::UNPAID_GRACE_MINUTES
}

fn default_timezone() -> String {
    defaults::TIMEZONE.to_string()
}

fn default_paypal_mode() -> String {
    "sandbox".to_string()
}

fn default_smtp_port() -> u16 {
    defaults::SMTP_PORT
}

fn default_email_from() -> String {
    "Luber <no-reply@luber.local>".to_string()
}

fn default_workers_port() -> u16 {
    defaults::WORKERS_PORT
}

fn default_enabled() -> bool {
    true
}

fn completed_mover_job() -> JobConfig {
    JobConfig::every(defaults::COMPLETED_MOVER_SCHEDULE)
}

fn fleet_notifier_job() -> JobConfig {
    JobConfig::every(defaults::FLEET_NOTIFIER_SCHEDULE)
}

fn unpaid_remover_job() -> JobConfig {
    JobConfig::every(defaults::UNPAID_REMOVER_SCHEDULE)
}

fn oil_changes_job() -> JobConfig {
    JobConfig::every(defaults::OIL_CHANGES_SCHEDULE)
}

fn welcome_mailer_job() -> JobConfig {
    JobConfig::every(defaults::WELCOME_MAILER_SCHEDULE)
}

fn confirmation_notifier_job() -> JobConfig {
    JobConfig::every(defaults::CONFIRMATION_NOTIFIER_SCHEDULE)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_path: default_database_path(),
            public_base_url: default_public_base_url(),
            cors_origin: default_cors_origin(),
            office_api_key: String::new(),
            password_cost: default_password_cost(),
            unpaid_grace_minutes: default_unpaid_grace_minutes(),
            timezone: default_timezone(),
            paypal: PayPalConfig::default(),
            email: EmailConfig::default(),
            realtime: RealtimeConfig::default(),
            workers: WorkersConfig::default(),
        }
    }
}

impl Default for PayPalConfig {
    fn default() -> Self {
        Self {
            mode: default_paypal_mode(),
            client_id: String::new(),
            secret: String::new(),
            base_url: None,
        }
    }
}

impl PayPalConfig {
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.secret.is_empty()
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            from: default_email_from(),
        }
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            hub_url: default_public_base_url(),
        }
    }
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            port: default_workers_port(),
            completed_mover: completed_mover_job(),
            fleet_notifier: fleet_notifier_job(),
            unpaid_remover: unpaid_remover_job(),
            oil_changes: oil_changes_job(),
            welcome_mailer: welcome_mailer_job(),
            confirmation_notifier: confirmation_notifier_job(),
        }
    }
}

impl WorkersConfig {
    /// Worker name paired with its job settings, in registration order
    pub fn jobs(&self) -> Vec<(&'static str, &JobConfig)> {
        vec![
            ("completed_mover", &self.completed_mover),
            ("fleet_notifier", &self.fleet_notifier),
            ("unpaid_remover", &self.unpaid_remover),
            ("oil_changes", &self.oil_changes),
            ("welcome_mailer", &self.welcome_mailer),
            ("confirmation_notifier", &self.confirmation_notifier),
        ]
    }
}

impl Config {
    /// Time zone used for the cancellation cut-off and the worker cron jobs
    pub fn business_timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| anyhow!("Unknown timezone '{}'", self.timezone))
    }

    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("port must be greater than 0"));
        }
        if self.paypal.mode != "sandbox" && self.paypal.mode != "live" {
            return Err(anyhow!(
                "paypal.mode must be 'sandbox' or 'live', got '{}'",
                self.paypal.mode
            ));
        }
        if self.unpaid_grace_minutes < 0 {
            return Err(anyhow!("unpaid_grace_minutes cannot be negative"));
        }
        self.business_timezone()?;
        for (name, job) in self.workers.jobs() {
            validate_6_field_cron(&job.schedule)
                .map_err(|e| anyhow!("Invalid schedule for worker {}: {}", name, e))?;
        }
        Ok(())
    }
}

/// Validate a tokio-cron-scheduler expression (sec min hour day month dow)
pub fn validate_6_field_cron(schedule: &str) -> Result<()> {
    let parts: Vec<&str> = schedule.split_whitespace().collect();

    if parts.len() != 6 {
        return Err(anyhow!(
            "expected 6 fields (second minute hour day month dayofweek), got {} in '{}'",
            parts.len(),
            schedule
        ));
    }

    validate_cron_field(parts[0], "second", 0, 59)?;
    validate_cron_field(parts[1], "minute", 0, 59)?;
    validate_cron_field(parts[2], "hour", 0, 23)?;
    validate_cron_field(parts[3], "day", 1, 31)?;
    validate_cron_field(parts[4], "month", 1, 12)?;
    validate_cron_field(parts[5], "dayofweek", 0, 7)?;

    Ok(())
}

fn validate_cron_field(field: &str, name: &str, min: u32, max: u32) -> Result<()> {
    if field == "*" || field == "?" {
        return Ok(());
    }

    if let Some(step_str) = field.strip_prefix("*/") {
        let step = step_str
            .parse::<u32>()
            .map_err(|_| anyhow!("Invalid {} step value: {}", name, step_str))?;
        if step == 0 {
            return Err(anyhow!("{} step value cannot be 0", name));
        }
        return Ok(());
    }

    if field.contains(',') {
        for part in field.split(',') {
            check_cron_value(part, name, min, max)?;
        }
        return Ok(());
    }

    if let Some((start, end)) = field.split_once('-') {
        check_cron_value(start, name, min, max)?;
        check_cron_value(end, name, min, max)?;
        return Ok(());
    }

    check_cron_value(field, name, min, max)
}

fn check_cron_value(value: &str, name: &str, min: u32, max: u32) -> Result<()> {
    let parsed = value
        .parse::<u32>()
        .map_err(|_| anyhow!("Invalid {} value: {}", name, value))?;
    if parsed < min || parsed > max {
        return Err(anyhow!(
            "{} value {} is outside valid range {}-{}",
            name,
            parsed,
            min,
            max
        ));
    }
    Ok(())
}
