//! Core types for the ledger
//!
//! A credential record is the only thing the ledger stores. Each record is
//! serialized as a single JSON object so one line of the ledger file is always
//! parseable on its own.

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, SubsecRound, TimeZone, Utc};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of random bytes behind an API key (hex-encoded to twice as many chars)
pub const API_KEY_BYTES: usize = 16;

/// Hex-encoded API key secret
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    /// Generate a fresh key from the operating system CSPRNG
    pub fn generate() -> Self {
        let mut bytes = [0u8; API_KEY_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ApiKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

// Keys must never end up in logs through a stray `{:?}`.
impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// One issued credential, one line in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    /// Canonical email, the ledger's primary key
    pub email: String,

    /// Randomly generated secret
    pub api_key: ApiKey,

    /// Issuance time
    #[serde(with = "creation_time")]
    pub creation_time: DateTime<Utc>,
}

impl CredentialRecord {
    /// Mint a new record for `email` with a fresh key, stamped now
    pub fn issue(email: impl Into<String>) -> Self {
        Self::issue_at(email, Utc::now())
    }

    /// Mint a new record with an explicit issuance time.
    ///
    /// The time is truncated to microseconds, the precision the ledger stores.
    pub fn issue_at(email: impl Into<String>, creation_time: DateTime<Utc>) -> Self {
        Self {
            email: email.into(),
            api_key: ApiKey::generate(),
            creation_time: creation_time.trunc_subsecs(6),
        }
    }

    /// Encode as a single ledger line (without the trailing newline)
    pub fn to_line(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Format a timestamp the way the ledger stores it: RFC 3339, microseconds, `+00:00`
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Layouts written by older issuers without an offset
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a stored timestamp.
///
/// Accepts RFC 3339 with any offset. Timestamps without an offset were written
/// by older issuers in the host's local time; they are read back in the local
/// zone and converted to UTC. An ambiguous local time resolves to the earlier
/// instant. A local time skipped by a DST jump has no instant and is read as UTC.
pub fn parse_timestamp(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .ok_or_else(|| format!("invalid creation_time '{}'", raw))?;

    Ok(Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive)))
}

mod creation_time {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_timestamp(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_api_key_is_32_lowercase_hex_chars() {
        let key = ApiKey::generate();
        assert_eq!(key.as_str().len(), API_KEY_BYTES * 2);
        assert!(key
            .as_str()
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_api_keys_are_distinct() {
        assert_ne!(ApiKey::generate(), ApiKey::generate());
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::from("deadbeef".to_string());
        assert!(!format!("{:?}", key).contains("deadbeef"));
    }

    #[test]
    fn test_record_line_shape() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let record = CredentialRecord {
            email: "alice@appier.com".to_string(),
            api_key: ApiKey::from("00112233445566778899aabbccddeeff".to_string()),
            creation_time: ts,
        };

        let line = record.to_line().unwrap();
        assert_eq!(
            line,
            r#"{"email":"alice@appier.com","api_key":"00112233445566778899aabbccddeeff","creation_time":"2024-05-01T08:30:00.000000+00:00"}"#
        );
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_issued_record_survives_a_line_round_trip() {
        let record = CredentialRecord::issue("carol@appier.com");
        let parsed: CredentialRecord = serde_json::from_str(&record.to_line().unwrap()).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_parse_timestamp_with_offset() {
        let ts = parse_timestamp("2024-05-01T10:30:00.123456+02:00").unwrap();
        assert_eq!(ts.hour(), 8);
        assert_eq!(ts.nanosecond(), 123_456_000);

        let zulu = parse_timestamp("2024-05-01T08:30:00Z").unwrap();
        assert_eq!(zulu.hour(), 8);
    }

    #[test]
    fn test_parse_legacy_naive_timestamp() {
        assert!(parse_timestamp("2024-05-01T08:30:00.123456").is_ok());
        assert!(parse_timestamp("2024-05-01T08:30:00").is_ok());
        assert!(parse_timestamp("2024-05-01 08:30:00.123456").is_ok());
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_record_reads_legacy_line() {
        let line = r#"{"email": "bob@appier.com", "api_key": "abcd", "creation_time": "2023-11-02T14:05:09.000001"}"#;
        let record: CredentialRecord = serde_json::from_str(line).unwrap();
        assert_eq!(record.email, "bob@appier.com");
        assert_eq!(record.api_key.as_str(), "abcd");
    }
}
