//! Member list extraction
//!
//! The roster file is a YAML mapping with a `members` sequence. Anything
//! else in the document is ignored.

use serde_yaml::Value;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("expected a top-level mapping, found {0}")]
    NotAMapping(&'static str),

    #[error("`members` must be a sequence, found {0}")]
    MembersNotASequence(&'static str),
}

/// Read the ordered member identifiers out of a roster document.
///
/// A missing or null `members` key, or an empty document, yields an empty
/// list. Scalar entries are rendered as text; nested entries are skipped.
pub fn extract_members(text: &str) -> Result<Vec<String>, RosterError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let document: Value = serde_yaml::from_str(text)?;

    let mapping = match document {
        Value::Mapping(mapping) => mapping,
        Value::Null => return Ok(Vec::new()),
        other => return Err(RosterError::NotAMapping(kind(&other))),
    };

    let members = match mapping.get("members") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Sequence(members)) => members,
        Some(other) => return Err(RosterError::MembersNotASequence(kind(other))),
    };

    Ok(members
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| match entry {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => {
                warn!("Skipping members[{}]: expected a name, found {}", index, kind(other));
                None
            }
        })
        .collect())
}

/// `{member}@{domain}`, without any normalization
pub fn canonical_email(member: &str, domain: &str) -> String {
    format!("{}@{}", member, domain)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
