//! App assertion signing
//!
//! The hosting service authenticates an app with a short-lived RS256 JWT
//! whose issuer is the app id. The assertion is only ever exchanged for an
//! installation token and is never logged or written anywhere.

use crate::errors::{Result, SyncError};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Validity window of an app assertion (9 minutes)
pub const ASSERTION_TTL_SECS: i64 = 540;

/// Claims of the app assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppClaims {
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiration time (seconds since epoch)
    pub exp: i64,
    /// Issuer, the app id
    pub iss: String,
}

impl AppClaims {
    pub fn new(app_id: &str, issued_at: i64) -> Self {
        Self {
            iat: issued_at,
            exp: issued_at + ASSERTION_TTL_SECS,
            iss: app_id.to_string(),
        }
    }
}

/// Signed app assertion
#[derive(Clone)]
pub struct AppAssertion(String);

impl AppAssertion {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AppAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AppAssertion(<redacted>)")
    }
}

/// Installation-scoped bearer token returned by the token exchange
#[derive(Clone)]
pub struct InstallationToken(String);

impl InstallationToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for InstallationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InstallationToken(<redacted>)")
    }
}

/// Sign an assertion for `app_id` with a PEM-encoded RSA private key
pub fn sign_app_assertion(private_key_pem: &[u8], app_id: &str, issued_at: i64) -> Result<AppAssertion> {
    let key = EncodingKey::from_rsa_pem(private_key_pem)?;
    let claims = AppClaims::new(app_id, issued_at);
    let token = encode(&Header::new(Algorithm::RS256), &claims, &key)?;
    Ok(AppAssertion(token))
}

/// Read the private key from disk and sign an assertion issued now
pub fn load_and_sign(private_key_path: &Path, app_id: &str) -> Result<AppAssertion> {
    let pem = std::fs::read(private_key_path).map_err(|source| SyncError::KeyRead {
        path: private_key_path.display().to_string(),
        source,
    })?;

    sign_app_assertion(&pem, app_id, Utc::now().timestamp())
}
