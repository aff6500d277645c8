//! Roster sync
//!
//! Reads the `members` list of a YAML roster stored in a repository and makes
//! sure every member has a credential in the local ledger.

pub mod auth;
pub mod config;
pub mod errors;
pub mod github;
pub mod issuer;
pub mod reconcile;
pub mod roster;

pub use config::Config;
pub use errors::{Result, SyncError};
pub use reconcile::{reconcile, run, ReconcileReport};
