//! Ledgers written by older issuers, with naive local timestamps
//!
//! Kept to a single test: it pins the process time zone.

use ledger_core::{Config, Issuance, Ledger};

#[test]
fn test_legacy_lines_are_never_reissued() {
    // 2024-03-10 02:30 does not exist in New York: clocks jump from 02:00 to 03:00.
    std::env::set_var("TZ", "America/New_York");

    let temp_dir = tempfile::tempdir().unwrap();
    let path = temp_dir.path().join("users.json");
    let seeded = [
        r#"{"email": "alice@appier.com", "api_key": "00112233445566778899aabbccddeeff", "creation_time": "2024-03-10T02:30:00.123456"}"#,
        r#"{"email": "bob@appier.com", "api_key": "ffeeddccbbaa99887766554433221100", "creation_time": "2024-03-10 09:30:00"}"#,
        r#"{"email": "carol@appier.com", "api_key": "0123456789abcdef0123456789abcdef", "creation_time": "2024-11-03T01:30:00"}"#,
        r#"{"email": "dave@appier.com", "api_key": "fedcba9876543210fedcba9876543210", "creation_time": "not a time"}"#,
    ];
    std::fs::write(&path, format!("{}\n", seeded.join("\n"))).unwrap();

    let mut ledger = Ledger::open(&Config::with_path(&path)).unwrap();

    for email in ["alice@appier.com", "bob@appier.com", "carol@appier.com", "dave@appier.com"] {
        assert!(ledger.contains(email), "{} missing from index", email);
        assert_eq!(ledger.issue_if_absent(email).unwrap(), Issuance::Existing);
    }
    assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 4);

    // Every line with a readable timestamp is still a full record.
    let emails: Vec<_> = ledger.records().unwrap().into_iter().map(|r| r.email).collect();
    assert_eq!(emails, vec!["alice@appier.com", "bob@appier.com", "carol@appier.com"]);
}
