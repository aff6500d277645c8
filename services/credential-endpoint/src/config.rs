use config::{ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub ledger: ledger_core::Config,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(env::vars().collect())
    }

    /// Build from an explicit variable map instead of the process environment
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let environment = vars
            .get("ENVIRONMENT")
            .cloned()
            .unwrap_or_else(|| "development".to_string());

        let mut builder = config::Config::builder()
            // Start with default configuration
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("server.workers", 2)?
            .set_default("ledger.ledger_path", "users.json")?
            .set_default("ledger.mailbox_capacity", 1000)?;

        // Add environment-specific config file if it exists
        if let Some(config_file) = vars.get("CONFIG_FILE") {
            builder = builder.add_source(File::with_name(config_file).required(false));
        } else {
            builder = builder.add_source(
                File::with_name(&format!("config/{}", environment)).required(false),
            );
        }

        // Override with environment variables
        builder = builder.add_source(
            Environment::with_prefix("CREDENTIAL_ENDPOINT")
                .separator("__")
                .try_parsing(true)
                .source(Some(vars.clone())),
        );

        // Special handling for common env vars
        if let Some(port) = vars.get("PORT") {
            builder = builder.set_override("server.port", port.as_str())?;
        }

        if let Some(path) = vars.get("LEDGER_PATH") {
            builder = builder.set_override("ledger.ledger_path", path.as_str())?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port cannot be 0".to_string());
        }

        if self.server.workers == 0 {
            return Err("At least one worker is required".to_string());
        }

        self.ledger.validate().map_err(|e| e.to_string())
    }
}
