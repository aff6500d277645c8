use crate::errors::{Result, SyncError};
use config::{Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_OWNER: &str = "chiyu-li-appier";
pub const DEFAULT_REPO: &str = "mock-heqa";
pub const DEFAULT_FILE_PATH: &str = "eam-dev.yml";
pub const DEFAULT_EMAIL_DOMAIN: &str = "appier.com";
pub const DEFAULT_LEDGER_PATH: &str = "users.json";
pub const DEFAULT_ENDPOINT_URL: &str = "http://127.0.0.1:5000/create_user";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub github: GithubConfig,
    pub source: SourceConfig,
    pub roster: RosterConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GithubConfig {
    pub api_url: String,
    pub app_id: String,
    pub installation_id: String,
    pub private_key_path: PathBuf,
    pub user_agent: String,
    pub timeout_secs: u64,
}

/// Where the roster file lives
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SourceConfig {
    pub owner: String,
    pub repo: String,
    pub path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RosterConfig {
    pub email_domain: String,
    pub ledger_path: PathBuf,
    pub issuer: IssuerMode,
    pub endpoint_url: String,
}

/// How new credentials are minted
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IssuerMode {
    /// Mint and append locally
    Local,
    /// Ask the credential endpoint to mint and append
    Remote,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Build configuration from an explicit variable map.
    ///
    /// Precedence, lowest first: built-in defaults, config file,
    /// `ROSTER_SYNC__*` variables, then the bare `APP_ID`, `INSTALLATION_ID`,
    /// `PRIVATE_KEY_PATH` and `LEDGER_PATH` variables.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let environment = vars
            .get("ENVIRONMENT")
            .cloned()
            .unwrap_or_else(|| "development".to_string());

        let mut builder = config::Config::builder()
            // Start with default configuration
            .set_default("github.api_url", DEFAULT_API_URL)?
            .set_default("github.app_id", "")?
            .set_default("github.installation_id", "")?
            .set_default("github.private_key_path", "")?
            .set_default(
                "github.user_agent",
                concat!("roster-sync/", env!("CARGO_PKG_VERSION")),
            )?
            .set_default("github.timeout_secs", 30)?
            .set_default("source.owner", DEFAULT_OWNER)?
            .set_default("source.repo", DEFAULT_REPO)?
            .set_default("source.path", DEFAULT_FILE_PATH)?
            .set_default("roster.email_domain", DEFAULT_EMAIL_DOMAIN)?
            .set_default("roster.ledger_path", DEFAULT_LEDGER_PATH)?
            .set_default("roster.issuer", "local")?
            .set_default("roster.endpoint_url", DEFAULT_ENDPOINT_URL)?;

        // Add environment-specific config file if it exists
        if let Some(config_file) = vars.get("CONFIG_FILE") {
            builder = builder.add_source(File::with_name(config_file).required(false));
        } else {
            builder = builder.add_source(
                File::with_name(&format!("config/{}", environment)).required(false),
            );
        }

        // Override with prefixed environment variables
        builder = builder.add_source(
            Environment::with_prefix("ROSTER_SYNC")
                .separator("__")
                .source(Some(vars.clone())),
        );

        // Special handling for the bare variables the bot has always used
        for (var, key) in [
            ("APP_ID", "github.app_id"),
            ("INSTALLATION_ID", "github.installation_id"),
            ("PRIVATE_KEY_PATH", "github.private_key_path"),
            ("LEDGER_PATH", "roster.ledger_path"),
        ] {
            if let Some(value) = vars.get(var) {
                builder = builder.set_override(key, value.clone())?;
            }
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Reject configurations that cannot possibly work, before any network call
    pub fn validate(&self) -> Result<()> {
        if self.github.private_key_path.as_os_str().is_empty() {
            return Err(SyncError::Config(
                "PRIVATE_KEY_PATH is not set".to_string(),
            ));
        }

        if self.github.app_id.trim().is_empty() {
            return Err(SyncError::Config("APP_ID is not set".to_string()));
        }

        if self.github.installation_id.trim().is_empty() {
            return Err(SyncError::Config("INSTALLATION_ID is not set".to_string()));
        }

        if self.github.api_url.is_empty() {
            return Err(SyncError::Config("GitHub API URL is required".to_string()));
        }

        if self.github.timeout_secs == 0 {
            return Err(SyncError::Config("HTTP timeout cannot be 0".to_string()));
        }

        if self.source.owner.is_empty() || self.source.repo.is_empty() || self.source.path.is_empty() {
            return Err(SyncError::Config(
                "Source owner, repo and path are required".to_string(),
            ));
        }

        if self.roster.email_domain.is_empty() || self.roster.email_domain.contains('@') {
            return Err(SyncError::Config(format!(
                "Invalid email domain '{}'",
                self.roster.email_domain
            )));
        }

        if self.roster.issuer == IssuerMode::Remote && self.roster.endpoint_url.is_empty() {
            return Err(SyncError::Config(
                "Remote issuer requires an endpoint URL".to_string(),
            ));
        }

        Ok(())
    }

    /// Ledger settings derived from the roster section
    pub fn ledger_config(&self) -> ledger_core::Config {
        ledger_core::Config::with_path(self.roster.ledger_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("APP_ID", "12345"),
            ("INSTALLATION_ID", "678"),
            ("PRIVATE_KEY_PATH", "/keys/app.pem"),
        ]
    }

    #[test]
    fn test_defaults_with_bare_variables() {
        let config = Config::from_vars(vars(&required())).unwrap();

        assert_eq!(config.github.api_url, DEFAULT_API_URL);
        assert_eq!(config.github.app_id, "12345");
        assert_eq!(config.github.installation_id, "678");
        assert_eq!(config.github.private_key_path, PathBuf::from("/keys/app.pem"));
        assert_eq!(config.source.owner, DEFAULT_OWNER);
        assert_eq!(config.source.repo, DEFAULT_REPO);
        assert_eq!(config.source.path, DEFAULT_FILE_PATH);
        assert_eq!(config.roster.email_domain, DEFAULT_EMAIL_DOMAIN);
        assert_eq!(config.roster.issuer, IssuerMode::Local);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_prefixed_overrides() {
        let mut pairs = required();
        pairs.push(("ROSTER_SYNC__SOURCE__REPO", "other-repo"));
        pairs.push(("ROSTER_SYNC__ROSTER__ISSUER", "remote"));
        pairs.push(("ROSTER_SYNC__GITHUB__API_URL", "http://localhost:9999"));

        let config = Config::from_vars(vars(&pairs)).unwrap();
        assert_eq!(config.source.repo, "other-repo");
        assert_eq!(config.roster.issuer, IssuerMode::Remote);
        assert_eq!(config.github.api_url, "http://localhost:9999");
    }

    #[test]
    fn test_missing_private_key_path_is_rejected() {
        let config = Config::from_vars(vars(&[("APP_ID", "1"), ("INSTALLATION_ID", "2")])).unwrap();
        match config.validate() {
            Err(SyncError::Config(msg)) => assert!(msg.contains("PRIVATE_KEY_PATH")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_app_id_is_rejected() {
        let config = Config::from_vars(vars(&[
            ("INSTALLATION_ID", "2"),
            ("PRIVATE_KEY_PATH", "/keys/app.pem"),
        ]))
        .unwrap();
        assert!(matches!(config.validate(), Err(SyncError::Config(_))));
    }

    #[test]
    fn test_invalid_domain_is_rejected() {
        let mut config = Config::from_vars(vars(&required())).unwrap();
        config.roster.email_domain = "@appier.com".to_string();
        assert!(matches!(config.validate(), Err(SyncError::Config(_))));
    }

    #[test]
    fn test_ledger_config_uses_roster_path() {
        let mut pairs = required();
        pairs.push(("LEDGER_PATH", "/data/users.json"));
        let config = Config::from_vars(vars(&pairs)).unwrap();
        assert_eq!(
            config.ledger_config().ledger_path,
            PathBuf::from("/data/users.json")
        );
    }
}
