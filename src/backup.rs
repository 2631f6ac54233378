use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{HistoryEntry, Item};

/// The on-disk backup document produced by export and accepted by import.
/// There is no version field; the shape is the contract.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub items: Vec<Item>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl Backup {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Older exports were a bare item array; both shapes are accepted on import.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BackupPayload {
    Document(Backup),
    Bare(Vec<Item>),
}

#[derive(Debug)]
pub struct BackupParseError {
    message: String,
}

impl fmt::Display for BackupParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "backup does not match the expected shape: {}", self.message)
    }
}

impl Error for BackupParseError {}

/// Parses an uploaded backup. This is the gate in front of the destructive
/// wipe: callers must not clear anything unless this returns Ok.
pub fn parse_backup(raw: &str) -> Result<Backup, BackupParseError> {
    let payload: BackupPayload = serde_json::from_str(raw).map_err(|err| BackupParseError {
        message: err.to_string(),
    })?;
    Ok(match payload {
        BackupPayload::Document(backup) => backup,
        BackupPayload::Bare(items) => Backup {
            items,
            history: Vec::new(),
        },
    })
}
