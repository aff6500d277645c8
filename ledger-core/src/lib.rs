//! Roster Sync Ledger Core
//!
//! Append-only registry of issued user credentials.
//!
//! # Architecture
//!
//! - **JSON lines**: one self-contained record per line, readable on its own
//! - **Email index**: the set of existing emails is derived from the file on open
//! - **Single Writer**: an optional actor serializes in-process writers
//!
//! # Invariants
//!
//! - Append-only: records are never modified or deleted
//! - Check-then-append issues at most one record per email with a single writer
//! - A torn line from a crashed writer is skipped, never fatal

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod storage;
pub mod ledger;
pub mod error;
pub mod actor;
pub mod config;
pub mod metrics;

// Re-exports
pub use error::{Error, Result};
pub use types::{ApiKey, CredentialRecord};
pub use ledger::{Issuance, Ledger};
pub use actor::{spawn_ledger_actor, LedgerHandle};
pub use config::Config;
pub use metrics::Metrics;
pub use storage::Storage;
