use serde::{Deserialize, Serialize};

use crate::ids::{new_id, now_utc_rfc3339};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Succeeded,
    Failed,
    TimedOut,
}

impl RunStatus {
    pub fn is_success(self) -> bool {
        matches!(self, RunStatus::Succeeded)
    }
}

/// One execution of the background agent; the operations dashboard computes
/// its 7-day success rate over these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRun {
    pub id: String,
    pub status: RunStatus,
    pub trigger: String,
    pub started_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl AgentRun {
    pub fn record(status: RunStatus, trigger: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            status,
            trigger: trigger.into(),
            started_at: now_utc_rfc3339(),
            detail: None,
        }
    }
}
