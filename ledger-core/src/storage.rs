//! Storage layer: a JSON-lines file
//!
//! # Layout
//!
//! - One `CredentialRecord` per line, `\n` terminated
//! - Lines are only ever appended, never rewritten
//! - Every append is "open, write one line, close"
//!
//! A crash can leave a torn last line behind. Loading skips any line that
//! does not parse, and the next append starts on a fresh line so the torn
//! fragment never swallows a good record.
//!
//! Existence is decided by the `email` field alone. A line whose other fields
//! are unreadable still counts for its email, so it is never issued twice.

use crate::{
    error::{Error, Result},
    types::CredentialRecord,
    Config,
};
use serde::Deserialize;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Result of reading the whole ledger file
#[derive(Debug, Default)]
pub struct LoadedRecords {
    /// Records in file order
    pub records: Vec<CredentialRecord>,

    /// Email of every line that has one, in file order, including lines
    /// that are not complete records
    pub emails: Vec<String>,

    /// Number of non-blank lines that failed to parse as a full record
    pub malformed_lines: usize,
}

/// The part of a line the existence index needs
#[derive(Deserialize)]
struct IndexEntry {
    email: String,
}

/// File-backed record store
#[derive(Debug, Clone)]
pub struct Storage {
    path: PathBuf,
}

impl Storage {
    /// Open storage at the configured path.
    ///
    /// The parent directory is created if needed; the file itself is created
    /// lazily by the first append.
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;
        let path = config.ledger_path.clone();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        Ok(Self { path })
    }

    /// Path of the ledger file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record. A missing file is an empty ledger.
    pub fn load(&self) -> Result<LoadedRecords> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Ledger file {} does not exist yet", self.path.display());
                return Ok(LoadedRecords::default());
            }
            Err(e) => return Err(Error::Io(e)),
        };

        let mut loaded = LoadedRecords::default();

        // Split on raw bytes so a line with invalid UTF-8 is skipped like any
        // other corrupt line instead of failing the whole read.
        for (index, line) in BufReader::new(file).split(b'\n').enumerate() {
            let line = line?;
            let line = line.strip_suffix(b"\r").unwrap_or(line.as_slice());

            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            match serde_json::from_slice::<CredentialRecord>(line) {
                Ok(record) => {
                    loaded.emails.push(record.email.clone());
                    loaded.records.push(record);
                }
                Err(e) => {
                    loaded.malformed_lines += 1;
                    if let Ok(entry) = serde_json::from_slice::<IndexEntry>(line) {
                        loaded.emails.push(entry.email);
                    }
                    tracing::warn!(
                        "Could not decode line {} of {}: {} ({})",
                        index + 1,
                        self.path.display(),
                        String::from_utf8_lossy(line),
                        e
                    );
                }
            }
        }

        Ok(loaded)
    }

    /// Append one record as one line
    pub fn append(&self, record: &CredentialRecord) -> Result<()> {
        let mut line = record.to_line()?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)?;

        if ends_mid_line(&mut file)? {
            tracing::warn!(
                "Ledger {} ends with a partial line, starting a new one",
                self.path.display()
            );
            line.insert(0, '\n');
        }

        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}

/// True when the file is non-empty and its last byte is not a newline
fn ends_mid_line(file: &mut File) -> Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(false);
    }

    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}
