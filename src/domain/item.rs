use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ids::{new_id, now_utc_rfc3339};

use super::kind::ItemKind;

/// Project lifecycle status. Done and Dropped are terminal; stale-project
/// detection only looks at the non-terminal ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    OnHold,
    Done,
    Dropped,
}

impl ProjectStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ProjectStatus::Done | ProjectStatus::Dropped)
    }
}

/// The unifying entity across all five PARA tables.
///
/// `kind` routes the row to its physical table. `category` is a free-text
/// grouping label: by naming convention a child's `category` may carry its
/// parent's title, which the relationship engine treats as a link signal.
/// `related_item_ids` are weak references; they may point at ids that no
/// longer exist and consumers must treat those as silently absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub kind: ItemKind,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub related_item_ids: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub is_ai_generated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
}

impl Item {
    pub fn new(title: impl Into<String>, kind: ItemKind) -> Self {
        let now = now_utc_rfc3339();
        Self {
            id: new_id(),
            title: title.into(),
            content: String::new(),
            kind,
            category: String::new(),
            tags: Vec::new(),
            related_item_ids: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
            is_completed: false,
            is_ai_generated: false,
            due_date: None,
            deadline: None,
            status: None,
            emoji: None,
        }
    }

    pub fn is_task(&self) -> bool {
        self.kind == ItemKind::Task
    }

    /// True when the item links to `other` in either direction. Relationship
    /// edges carry no ownership, so the check is symmetric.
    pub fn links_to(&self, other: &Item) -> bool {
        self.related_item_ids.iter().any(|id| id == &other.id)
            || other.related_item_ids.iter().any(|id| id == &self.id)
    }
}

/// Best-effort kind extraction from a loosely typed row, used by the realtime
/// merge path where the payload came straight off the wire.
pub fn kind_from_value(row: &serde_json::Value) -> Option<ItemKind> {
    row.get("kind")
        .and_then(|value| value.as_str())
        .and_then(|raw| ItemKind::from_str(raw).ok())
}
