//! Roster reconciliation
//!
//! `run` is the whole sync, strictly in sequence:
//!
//! 1. sign an app assertion
//! 2. exchange it for an installation token
//! 3. fetch and decode the roster file
//! 4. extract members (a bad document degrades to "no members")
//! 5. issue a credential for every member without one
//!
//! Steps 1-3 fail the run. Step 4 and individual members in step 5 never do.

use crate::auth;
use crate::config::{Config, IssuerMode, RosterConfig};
use crate::errors::Result;
use crate::github::GithubClient;
use crate::issuer::{CredentialIssuer, LedgerIssuer, RemoteIssuer};
use crate::roster::{canonical_email, extract_members};
use ledger_core::{CredentialRecord, Issuance};
use tracing::{error, info};

/// A member whose credential could not be written
#[derive(Debug, Clone)]
pub struct FailedMember {
    pub email: String,
    pub reason: String,
}

/// What one reconciliation pass did, member by member
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Newly issued records, in member order
    pub created: Vec<CredentialRecord>,
    /// Emails that already had a record
    pub skipped: Vec<String>,
    /// Emails whose issuance failed
    pub failed: Vec<FailedMember>,
}

impl ReconcileReport {
    pub fn created_count(&self) -> usize {
        self.created.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Issue a credential for each member that has none, in list order.
///
/// A failure for one member is logged and recorded; the rest still run.
pub async fn reconcile<I>(members: &[String], email_domain: &str, issuer: &mut I) -> ReconcileReport
where
    I: CredentialIssuer + ?Sized,
{
    let mut report = ReconcileReport::default();

    for member in members {
        let email = canonical_email(member, email_domain);

        match issuer.issue_if_absent(&email).await {
            Ok(Issuance::Existing) => {
                info!("User '{}' already exists. Skipping.", email);
                report.skipped.push(email);
            }
            Ok(Issuance::Created(record)) => {
                info!("Successfully created user: {}", record.email);
                report.created.push(record);
            }
            Err(e) => {
                error!("Error creating user '{}': {}", email, e);
                report.failed.push(FailedMember {
                    email,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!("Created {} new user(s)", report.created_count());
    if report.has_failures() {
        error!("Failed to create {} user(s)", report.failed.len());
    }

    report
}

/// Build the issuer selected by configuration
pub fn build_issuer(roster: &RosterConfig, timeout_secs: u64) -> Result<Box<dyn CredentialIssuer>> {
    let ledger_config = ledger_core::Config::with_path(roster.ledger_path.clone());

    let issuer: Box<dyn CredentialIssuer> = match roster.issuer {
        IssuerMode::Local => Box::new(LedgerIssuer::open(&ledger_config)?),
        IssuerMode::Remote => {
            Box::new(RemoteIssuer::from_ledger(
                &ledger_config,
                roster.endpoint_url.clone(),
                timeout_secs,
            )?)
        }
    };

    Ok(issuer)
}

/// Run one full sync
pub async fn run(config: &Config) -> Result<ReconcileReport> {
    config.validate()?;

    info!("Step 1: Generating JWT...");
    let assertion = auth::load_and_sign(&config.github.private_key_path, &config.github.app_id)?;
    info!("JWT generated.");

    let client = GithubClient::from_config(&config.github)?;

    info!("Step 2: Getting Installation Access Token...");
    let token = client
        .exchange_installation_token(&config.github.installation_id, &assertion)
        .await?;
    info!("Access Token received.");

    info!(
        "Step 3: Reading {} from repo {}/{}...",
        config.source.path, config.source.owner, config.source.repo
    );
    let content = client
        .fetch_file_contents(&token, &config.source.owner, &config.source.repo, &config.source.path)
        .await?;
    info!("Successfully read file content.");

    info!("Step 4: Processing users...");
    let members = match extract_members(&content) {
        Ok(members) => members,
        Err(e) => {
            error!("Error parsing YAML file: {}", e);
            Vec::new()
        }
    };

    if members.is_empty() {
        info!("No members found in the YAML file. Nothing to do.");
        return Ok(ReconcileReport::default());
    }

    let mut issuer = build_issuer(&config.roster, config.github.timeout_secs)?;
    Ok(reconcile(&members, &config.roster.email_domain, &mut *issuer).await)
}
