use serde::{Deserialize, Serialize};

use crate::ids::{new_id, now_utc_rfc3339};

use super::kind::ItemKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    Create,
    Update,
    Delete,
    Complete,
}

impl HistoryAction {
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryAction::Create => "create",
            HistoryAction::Update => "update",
            HistoryAction::Delete => "delete",
            HistoryAction::Complete => "complete",
        }
    }
}

/// Append-only audit record. Written once, never mutated; only a full wipe
/// (import) removes rows. The title is a snapshot, not a reference, so the
/// log stays readable after the item is gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub action: HistoryAction,
    pub item_title: String,
    pub item_kind: ItemKind,
    pub occurred_at: String,
}

impl HistoryEntry {
    pub fn record(action: HistoryAction, item_title: impl Into<String>, item_kind: ItemKind) -> Self {
        Self {
            id: new_id(),
            action,
            item_title: item_title.into(),
            item_kind,
            occurred_at: now_utc_rfc3339(),
        }
    }
}
