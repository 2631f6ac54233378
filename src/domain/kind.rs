use std::error::Error;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The closed PARA set. Determines which physical table owns a row; moving an
/// item between kinds is a delete-then-insert pair, never an in-place update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Project,
    Area,
    Resource,
    Archive,
    Task,
}

impl ItemKind {
    pub const ALL: [ItemKind; 5] = [
        ItemKind::Project,
        ItemKind::Area,
        ItemKind::Resource,
        ItemKind::Archive,
        ItemKind::Task,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Project => "project",
            ItemKind::Area => "area",
            ItemKind::Resource => "resource",
            ItemKind::Archive => "archive",
            ItemKind::Task => "task",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = ParseItemKindError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        let kind = match normalized.as_str() {
            "project" | "projects" => ItemKind::Project,
            "area" | "areas" => ItemKind::Area,
            "resource" | "resources" => ItemKind::Resource,
            "archive" | "archives" => ItemKind::Archive,
            "task" | "tasks" => ItemKind::Task,
            _ => {
                return Err(ParseItemKindError {
                    value: value.to_string(),
                });
            }
        };
        Ok(kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseItemKindError {
    value: String,
}

impl fmt::Display for ParseItemKindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid item kind '{}': expected one of {}",
            self.value,
            ItemKind::ALL
                .iter()
                .map(|kind| kind.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl Error for ParseItemKindError {}
