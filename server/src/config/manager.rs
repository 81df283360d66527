use super::{Config, SecretsLoader};
use anyhow::{anyhow, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

const ENV_OVERRIDES: &[&str] = &[
    "LUBER_PAYPAL_CLIENT_ID",
    "LUBER_PAYPAL_SECRET",
    "LUBER_SMTP_USERNAME",
    "LUBER_SMTP_PASSWORD",
    "LUBER_OFFICE_API_KEY",
];

pub struct ConfigManager {
    current_config: Arc<Config>,
}

impl ConfigManager {
    pub async fn new(config_dir: String) -> Result<Self> {
        let config = Self::load_configuration(&config_dir).await?;
        Ok(Self {
            current_config: Arc::new(config),
        })
    }

    pub fn get_current_config(&self) -> Arc<Config> {
        self.current_config.clone()
    }

    async fn load_configuration(config_dir: &str) -> Result<Config> {
        let main_config_path = format!("{}/main.toml", config_dir);
        let main_config_content = fs::read_to_string(&main_config_path)
            .await
            .map_err(|e| anyhow!("Failed to read main config {}: {}", main_config_path, e))?;

        let mut config: Config = toml::from_str(&main_config_content)
            .map_err(|e| anyhow!("Failed to parse main config: {}", e))?;

        let secrets_path = format!("{}/secrets.toml", config_dir);
        SecretsLoader::load(Path::new(&secrets_path))?.apply(&mut config);

        Self::apply_env_overrides(&mut config, |key| std::env::var(key).ok());

        config.validate()?;

        info!(
            "Configuration loaded: db={}, paypal={} ({}), smtp={}, hub={}",
            config.database_path,
            if config.paypal.is_configured() { "configured" } else { "missing" },
            config.paypal.mode,
            config.email.smtp_host.as_deref().unwrap_or("disabled"),
            config.realtime.hub_url
        );

        Ok(config)
    }

    fn apply_env_overrides<F>(config: &mut Config, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for key in ENV_OVERRIDES {
            let Some(value) = lookup(key) else {
                continue;
            };
            debug!("Applying environment override {}", key);
            match *key {
                "LUBER_PAYPAL_CLIENT_ID" => config.paypal.client_id = value,
                "LUBER_PAYPAL_SECRET" => config.paypal.secret = value,
                "LUBER_SMTP_USERNAME" => config.email.username = value,
                "LUBER_SMTP_PASSWORD" => config.email.password = value,
                "LUBER_OFFICE_API_KEY" => config.office_api_key = value,
                _ => {}
            }
        }
    }
}
