//! Main ledger orchestration layer
//!
//! `Ledger` ties storage and the in-memory email index together into the
//! two issuance primitives the services need:
//!
//! - [`Ledger::issue_if_absent`]: check-then-append, used by reconciliation
//! - [`Ledger::issue`]: always append, used by the issuance endpoint
//!
//! # Example
//!
//! ```no_run
//! use ledger_core::{Config, Issuance, Ledger};
//!
//! fn main() -> ledger_core::Result<()> {
//!     let mut ledger = Ledger::open(&Config::with_path("users.json"))?;
//!
//!     match ledger.issue_if_absent("alice@appier.com")? {
//!         Issuance::Created(record) => println!("created {}", record.email),
//!         Issuance::Existing => println!("already there"),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! The check and the append are not atomic across processes. Only one
//! process may write to a given ledger file at a time.

use crate::{
    metrics::Metrics,
    storage::Storage,
    types::CredentialRecord,
    Config, Result,
};
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

/// Outcome of a check-then-append issuance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issuance {
    /// A new record was appended
    Created(CredentialRecord),

    /// The email already had a record; nothing was written
    Existing,
}

/// Main ledger interface
#[derive(Debug)]
pub struct Ledger {
    /// Backing file
    storage: Storage,

    /// Emails with at least one record
    emails: HashSet<String>,

    /// Counters and latencies
    metrics: Metrics,
}

impl Ledger {
    /// Open the ledger and build the email index from its current contents
    pub fn open(config: &Config) -> Result<Self> {
        Self::open_with_metrics(config, Metrics::new()?)
    }

    /// Open the ledger reporting into an existing metrics collector
    pub fn open_with_metrics(config: &Config, metrics: Metrics) -> Result<Self> {
        let storage = Storage::open(config)?;
        let loaded = storage.load()?;

        if loaded.malformed_lines > 0 {
            tracing::warn!(
                "Skipped {} malformed line(s) in {}",
                loaded.malformed_lines,
                storage.path().display()
            );
            metrics.record_malformed_lines(loaded.malformed_lines);
        }

        let emails: HashSet<String> = loaded.emails.into_iter().collect();
        tracing::info!(
            "Found {} existing users in {}.",
            emails.len(),
            storage.path().display()
        );

        Ok(Self {
            storage,
            emails,
            metrics,
        })
    }

    /// Whether `email` already has a record
    pub fn contains(&self, email: &str) -> bool {
        self.emails.contains(email)
    }

    /// Number of distinct emails in the ledger
    pub fn len(&self) -> usize {
        self.emails.len()
    }

    /// True when no record has been issued yet
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    /// Distinct emails currently in the ledger
    pub fn emails(&self) -> impl Iterator<Item = &str> {
        self.emails.iter().map(String::as_str)
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        self.storage.path()
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Re-read every record from disk, in append order
    pub fn records(&self) -> Result<Vec<CredentialRecord>> {
        Ok(self.storage.load()?.records)
    }

    /// Mint and append a record for `email` unless one already exists.
    ///
    /// The index is updated right after a successful append, so the same
    /// email later in one pass is reported as [`Issuance::Existing`].
    pub fn issue_if_absent(&mut self, email: &str) -> Result<Issuance> {
        if self.contains(email) {
            self.metrics.record_skipped();
            return Ok(Issuance::Existing);
        }

        self.issue(email).map(Issuance::Created)
    }

    /// Mint and append a record for `email` without checking the index
    pub fn issue(&mut self, email: &str) -> Result<CredentialRecord> {
        let record = CredentialRecord::issue(email);
        self.append(&record)?;
        Ok(record)
    }

    fn append(&mut self, record: &CredentialRecord) -> Result<()> {
        let started = Instant::now();

        if let Err(e) = self.storage.append(record) {
            self.metrics.record_append_failure();
            return Err(e);
        }

        self.metrics.record_created(started.elapsed().as_secs_f64());
        self.emails.insert(record.email.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_ledger() -> (tempfile::TempDir, Ledger) {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = Config::with_path(temp_dir.path().join("users.json"));
        let ledger = Ledger::open(&config).unwrap();
        (temp_dir, ledger)
    }

    #[test]
    fn test_open_empty() {
        let (_dir, ledger) = temp_ledger();
        assert!(ledger.is_empty());
        assert_eq!(ledger.records().unwrap(), vec![]);
    }

    #[test]
    fn test_issue_if_absent_creates_then_skips() {
        let (_dir, mut ledger) = temp_ledger();

        let first = ledger.issue_if_absent("alice@appier.com").unwrap();
        assert!(matches!(first, Issuance::Created(ref r) if r.email == "alice@appier.com"));

        let second = ledger.issue_if_absent("alice@appier.com").unwrap();
        assert_eq!(second, Issuance::Existing);

        assert_eq!(ledger.records().unwrap().len(), 1);
        assert_eq!(ledger.metrics().records_created.get(), 1);
        assert_eq!(ledger.metrics().records_skipped.get(), 1);
    }

    #[test]
    fn test_issue_always_appends() {
        let (_dir, mut ledger) = temp_ledger();

        let first = ledger.issue("carol@appier.com").unwrap();
        let second = ledger.issue("carol@appier.com").unwrap();
        assert_ne!(first.api_key, second.api_key);

        let records = ledger.records().unwrap();
        assert_eq!(records, vec![first, second]);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_reopen_sees_existing_emails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = Config::with_path(temp_dir.path().join("users.json"));

        {
            let mut ledger = Ledger::open(&config).unwrap();
            ledger.issue_if_absent("alice@appier.com").unwrap();
        }

        let mut reopened = Ledger::open(&config).unwrap();
        assert!(reopened.contains("alice@appier.com"));
        assert_eq!(reopened.issue_if_absent("alice@appier.com").unwrap(), Issuance::Existing);
    }

    #[test]
    fn test_emails_are_case_sensitive() {
        let (_dir, mut ledger) = temp_ledger();
        ledger.issue_if_absent("Alice@appier.com").unwrap();
        assert!(!ledger.contains("alice@appier.com"));
    }

    #[test]
    fn test_open_counts_malformed_lines() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("users.json");
        std::fs::write(&path, "garbage\n").unwrap();

        let ledger = Ledger::open(&Config::with_path(&path)).unwrap();
        assert!(ledger.is_empty());
        assert_eq!(ledger.metrics().malformed_lines.get(), 1);
    }

    #[test]
    fn test_line_with_bad_timestamp_blocks_reissue() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("users.json");
        std::fs::write(
            &path,
            "{\"email\": \"hana@appier.com\", \"api_key\": \"abcd\", \"creation_time\": \"soon\"}\n",
        )
        .unwrap();

        let mut ledger = Ledger::open(&Config::with_path(&path)).unwrap();
        assert!(ledger.contains("hana@appier.com"));
        assert_eq!(ledger.issue_if_absent("hana@appier.com").unwrap(), Issuance::Existing);
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_failed_append_leaves_index_untouched() {
        let (_dir, mut ledger) = temp_ledger();
        // A directory where the file should be makes every append fail.
        std::fs::create_dir(ledger.path()).unwrap();

        assert!(ledger.issue_if_absent("alice@appier.com").is_err());
        assert!(!ledger.contains("alice@appier.com"));
        assert_eq!(ledger.metrics().append_failures.get(), 1);
        assert_eq!(ledger.metrics().records_created.get(), 0);
    }
}
