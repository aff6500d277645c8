//! Configuration for the ledger

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path of the JSON-lines ledger file
    pub ledger_path: PathBuf,

    /// Bounded mailbox size of the single-writer actor
    pub mailbox_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from("users.json"),
            mailbox_capacity: 1000,
        }
    }
}

impl Config {
    /// Configuration pointing at a specific ledger file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            ledger_path: path.into(),
            ..Self::default()
        }
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(path) = std::env::var("LEDGER_PATH") {
            config.ledger_path = PathBuf::from(path);
        }

        if let Ok(capacity) = std::env::var("LEDGER_MAILBOX_CAPACITY") {
            config.mailbox_capacity = capacity.parse().map_err(|e| {
                crate::Error::Config(format!("Invalid LEDGER_MAILBOX_CAPACITY '{}': {}", capacity, e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> crate::Result<()> {
        if self.ledger_path.as_os_str().is_empty() {
            return Err(crate::Error::Config("Ledger path cannot be empty".to_string()));
        }

        if self.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "Mailbox capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
