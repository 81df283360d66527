//! Secrets loader for credentials kept out of `main.toml`.
//!
//! Credentials live in `config/secrets.toml`, which stays out of version
//! control. Every value present there replaces the matching field of the
//! main configuration.
//!
//! Example secrets.toml:
//! ```toml
//! office_api_key = "office-key"
//!
//! [paypal]
//! client_id = "client"
//! secret = "secret"
//!
//! [email]
//! username = "mailer@example.com"
//! password = "app-password"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

use super::Config;

#[derive(Debug, Deserialize, Default)]
pub struct SecretsFile {
    pub office_api_key: Option<String>,
    #[serde(default)]
    pub paypal: PayPalSecrets,
    #[serde(default)]
    pub email: EmailSecrets,
}

#[derive(Debug, Deserialize, Default)]
pub struct PayPalSecrets {
    pub client_id: Option<String>,
    pub secret: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct EmailSecrets {
    pub username: Option<String>,
    pub password: Option<String>,
}

pub struct SecretsLoader {
    secrets: SecretsFile,
}

impl SecretsLoader {
    /// Reads the secrets file. A missing file yields an empty loader so a
    /// bare `main.toml` plus environment overrides is enough to start.
    pub fn load(secrets_path: &Path) -> Result<Self> {
        if !secrets_path.exists() {
            warn!(
                "Secrets file not found at {:?}, relying on main config and environment",
                secrets_path
            );
            return Ok(Self {
                secrets: SecretsFile::default(),
            });
        }

        let content = std::fs::read_to_string(secrets_path)
            .with_context(|| format!("Failed to read secrets file: {:?}", secrets_path))?;

        let secrets: SecretsFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse secrets file: {:?}", secrets_path))?;

        info!("Loaded secrets from {:?}", secrets_path);

        Ok(Self { secrets })
    }

    pub fn apply(&self, config: &mut Config) {
        if let Some(key) = &self.secrets.office_api_key {
            config.office_api_key = key.clone();
        }
        if let Some(client_id) = &self.secrets.paypal.client_id {
            config.paypal.client_id = client_id.clone();
        }
        if let Some(secret) = &self.secrets.paypal.secret {
            config.paypal.secret = secret.clone();
        }
        if let Some(username) = &self.secrets.email.username {
            config.email.username = username.clone();
        }
        if let Some(password) = &self.secrets.email.password {
            config.email.password = password.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_secrets_override_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
office_api_key = "office-key"

[paypal]
client_id = "client"
secret = "shh"
"#
        )
        .unwrap();

        let loader = SecretsLoader::load(file.path()).unwrap();
        let mut config = Config::default();
        loader.apply(&mut config);

        assert_eq!(config.office_api_key, "office-key");
        assert_eq!(config.paypal.client_id, "client");
        assert_eq!(config.paypal.secret, "shh");
        assert!(config.email.username.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let loader = SecretsLoader::load(Path::new("/nonexistent/path/secrets.toml")).unwrap();
        let mut config = Config::default();
        loader.apply(&mut config);
        assert!(!config.paypal.is_configured());
    }
}
