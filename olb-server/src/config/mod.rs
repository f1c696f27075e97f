//! Configuration module for olb-server.
//!
//! Handles loading configuration from the TOML file, CLI arguments and
//! environment variables.

pub mod file;
pub mod runtime;

use crate::config::file::FileConfig;
use crate::config::runtime::{
    AuthConfig, LinksConfig, MailConfig, MeetingsConfig, PaymentsConfig, ServerConfig,
    SharedConfig,
};
use olb_core::meetings::MeetingCredentials;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("DATABASE_URL environment variable not set")]
    MissingDatabaseUrl,
}

/// Loaded configuration result containing all sections.
pub struct LoadedConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub payments: PaymentsConfig,
    pub meetings: MeetingsConfig,
    pub mail: MailConfig,
    pub links: LinksConfig,
}

impl LoadedConfig {
    /// Convert into a SharedConfig with Arc<RwLock<T>> wrappers.
    pub fn into_shared(self) -> SharedConfig {
        SharedConfig {
            server: Arc::new(RwLock::new(self.server)),
            auth: Arc::new(RwLock::new(self.auth)),
            payments: Arc::new(RwLock::new(self.payments)),
            meetings: Arc::new(RwLock::new(self.meetings)),
            mail: Arc::new(RwLock::new(self.mail)),
            links: Arc::new(RwLock::new(self.links)),
        }
    }
}

/// Configuration loader that handles the complete loading process.
pub struct ConfigLoader {
    config_path: std::path::PathBuf,
    listen_override: Option<SocketAddr>,
}

impl ConfigLoader {
    pub fn new(config_path: impl AsRef<Path>, listen_override: Option<SocketAddr>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
            listen_override,
        }
    }

    /// Load and process the configuration.
    ///
    /// Reads the TOML file, applies CLI overrides and validates.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let config_content = std::fs::read_to_string(&self.config_path)?;
        let mut file_config: FileConfig = toml::from_str(&config_content)?;

        if let Some(listen) = self.listen_override {
            file_config.server.listen = listen;
        }

        self.validate(&file_config)?;

        Ok(build_loaded_config(file_config))
    }

    /// Reload the configuration (used during SIGHUP).
    pub fn reload(&self) -> Result<LoadedConfig, ConfigError> {
        self.load()
    }

    fn validate(&self, config: &FileConfig) -> Result<(), ConfigError> {
        for (name, secret) in [
            ("auth.session_secret", &config.auth.session_secret),
            ("payments.webhook_secret", &config.payments.webhook_secret),
            ("links.share_secret", &config.links.share_secret),
        ] {
            if secret.len() < 16 {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be at least 16 bytes"
                )));
            }
        }
        Ok(())
    }
}

fn build_loaded_config(file_config: FileConfig) -> LoadedConfig {
    LoadedConfig {
        server: ServerConfig {
            listen: file_config.server.listen,
        },
        auth: AuthConfig::new(file_config.auth.session_secret),
        payments: PaymentsConfig::new(file_config.payments.webhook_secret),
        meetings: MeetingsConfig::new(
            file_config.meetings.webhook_secret,
            MeetingCredentials {
                client_id: file_config.meetings.client_id,
                client_secret: file_config.meetings.client_secret,
                account_id: file_config.meetings.account_id,
            },
            file_config.meetings.api_base,
            file_config.meetings.token_url,
        ),
        mail: MailConfig {
            endpoint: file_config.mail.endpoint,
            api_key: file_config.mail.api_key,
            from: file_config.mail.from,
        },
        links: LinksConfig::new(
            file_config.links.share_secret,
            file_config.links.share_base_url,
        ),
    }
}

/// Get the database URL from the environment.
pub fn get_database_url() -> Result<String, ConfigError> {
    std::env::var("DATABASE_URL").map_err(|_| ConfigError::MissingDatabaseUrl)
}
