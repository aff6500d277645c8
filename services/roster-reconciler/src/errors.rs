use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

/// Conditions that stop a reconciliation run.
///
/// Everything recoverable (a malformed roster, a single failed append) is
/// reported through `ReconcileReport` instead and never becomes a `SyncError`.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read private key {path}: {source}")]
    KeyRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to sign app assertion: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Installation token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Failed to fetch {path}: {message}")]
    Fetch { path: String, message: String },

    #[error("Failed to decode file content: {0}")]
    Decode(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ledger error: {0}")]
    Ledger(#[from] ledger_core::Error),

    #[error("Credential endpoint returned {status}: {body}")]
    Endpoint { status: u16, body: String },
}

impl From<config::ConfigError> for SyncError {
    fn from(err: config::ConfigError) -> Self {
        SyncError::Config(err.to_string())
    }
}

impl From<crate::issuer::IssueError> for SyncError {
    fn from(err: crate::issuer::IssueError) -> Self {
        use crate::issuer::IssueError;

        match err {
            IssueError::Ledger(e) => SyncError::Ledger(e),
            IssueError::Http(e) => SyncError::Http(e),
            IssueError::Endpoint { status, body } => SyncError::Endpoint { status, body },
        }
    }
}

impl SyncError {
    /// Stable label used in the final log line
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Config(_) => "startup",
            SyncError::KeyRead { .. } | SyncError::Signing(_) => "signing",
            SyncError::TokenExchange(_) => "token_exchange",
            SyncError::Fetch { .. } | SyncError::Decode(_) | SyncError::Http(_) => "fetch",
            SyncError::Ledger(_) => "ledger",
            SyncError::Endpoint { .. } => "issuer",
        }
    }
}
