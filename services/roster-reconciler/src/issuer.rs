//! Credential issuers
//!
//! Reconciliation only needs "make sure this email has a credential". Two
//! ways of doing that exist:
//!
//! - [`LedgerIssuer`] mints and appends locally (the default)
//! - [`RemoteIssuer`] asks the credential endpoint to mint, which appends on
//!   its side; existence is still checked against the local ledger file

use async_trait::async_trait;
use ledger_core::{CredentialRecord, Issuance, Ledger};
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum IssueError {
    #[error(transparent)]
    Ledger(#[from] ledger_core::Error),

    #[error("Issuance request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Credential endpoint returned {status}: {body}")]
    Endpoint { status: u16, body: String },
}

#[async_trait]
pub trait CredentialIssuer: Send {
    /// Ensure `email` has a credential, creating one if it has none
    async fn issue_if_absent(&mut self, email: &str) -> Result<Issuance, IssueError>;
}

/// Mints credentials straight into the local ledger
#[derive(Debug)]
pub struct LedgerIssuer {
    ledger: Ledger,
}

impl LedgerIssuer {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    pub fn open(config: &ledger_core::Config) -> ledger_core::Result<Self> {
        Ok(Self::new(Ledger::open(config)?))
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }
}

#[async_trait]
impl CredentialIssuer for LedgerIssuer {
    async fn issue_if_absent(&mut self, email: &str) -> Result<Issuance, IssueError> {
        Ok(self.ledger.issue_if_absent(email)?)
    }
}

/// Mints credentials through `GET {endpoint_url}?email=...`
pub struct RemoteIssuer {
    client: Client,
    endpoint_url: String,
    known: HashSet<String>,
}

impl RemoteIssuer {
    pub fn new(
        endpoint_url: impl Into<String>,
        known_emails: impl IntoIterator<Item = String>,
        timeout_secs: u64,
    ) -> Result<Self, IssueError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint_url: endpoint_url.into(),
            known: known_emails.into_iter().collect(),
        })
    }

    /// Seed the existence set from the ledger file the endpoint writes to
    pub fn from_ledger(
        ledger_config: &ledger_core::Config,
        endpoint_url: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, IssueError> {
        let ledger = Ledger::open(ledger_config)?;
        let known: Vec<String> = ledger.emails().map(str::to_string).collect();
        Self::new(endpoint_url, known, timeout_secs)
    }
}

#[async_trait]
impl CredentialIssuer for RemoteIssuer {
    async fn issue_if_absent(&mut self, email: &str) -> Result<Issuance, IssueError> {
        if self.known.contains(email) {
            return Ok(Issuance::Existing);
        }

        debug!("Requesting credential for '{}' from {}", email, self.endpoint_url);

        let response = self
            .client
            .get(&self.endpoint_url)
            .query(&[("email", email)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(IssueError::Endpoint { status, body });
        }

        let record = response.json::<CredentialRecord>().await?;
        self.known.insert(email.to_string());
        Ok(Issuance::Created(record))
    }
}
