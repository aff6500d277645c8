//! HTTP endpoint that mints a credential record on demand and appends it to
//! the shared ledger. Unlike the reconciler it never checks for an existing
//! record first.

pub mod config;
pub mod errors;
pub mod handlers;

pub use config::Config;
pub use errors::{EndpointError, Result};
