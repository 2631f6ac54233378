use time::Duration;
use time::OffsetDateTime;

use crate::domain::{Item, ItemKind};
use crate::ids::parse_timestamp;

/// Tag marking a task as waiting in the triage queue.
pub const TRIAGE_TAG: &str = "triage-pending";

/// Forward horizon for the "due soon" widget.
pub const DUE_SOON_HORIZON: Duration = Duration::hours(48);

pub fn is_triage_pending(item: &Item) -> bool {
    item.tags.iter().any(|tag| tag.trim() == TRIAGE_TAG)
}

/// Overdue: a task, not completed, with a due date strictly before `now`.
/// Time-dependent — recompute, never cache across renders.
pub fn is_overdue(item: &Item, now: OffsetDateTime) -> bool {
    item.kind == ItemKind::Task
        && !item.is_completed
        && item
            .due_date
            .as_deref()
            .and_then(parse_timestamp)
            .map(|due| due < now)
            .unwrap_or(false)
}

/// Due within the next 48 hours, non-negative delta only.
pub fn is_due_soon(item: &Item, now: OffsetDateTime) -> bool {
    item.kind == ItemKind::Task
        && !item.is_completed
        && item
            .due_date
            .as_deref()
            .and_then(parse_timestamp)
            .map(|due| due >= now && due - now <= DUE_SOON_HORIZON)
            .unwrap_or(false)
}

/// Sort key implementing the focus total order. Lower sorts first:
/// triage-pending beats plain, overdue beats future-due, dated beats undated,
/// then ascending due date. Completed tasks never enter the queue.
fn focus_key(item: &Item, now: OffsetDateTime) -> (u8, u8, u8, Option<OffsetDateTime>) {
    let triage_rank = if is_triage_pending(item) { 0 } else { 1 };
    let overdue_rank = if is_overdue(item, now) { 0 } else { 1 };
    let due = item.due_date.as_deref().and_then(parse_timestamp);
    let dated_rank = if due.is_some() { 0 } else { 1 };
    (triage_rank, overdue_rank, dated_rank, due)
}

/// The ranked focus queue over all incomplete tasks.
pub fn focus_queue<'a>(items: &'a [Item], now: OffsetDateTime) -> Vec<&'a Item> {
    let mut tasks: Vec<&Item> = items
        .iter()
        .filter(|item| item.kind == ItemKind::Task && !item.is_completed)
        .collect();
    tasks.sort_by_key(|item| focus_key(item, now));
    tasks
}

/// The top-N slice for dashboard focus widgets.
pub fn top_focus<'a>(items: &'a [Item], now: OffsetDateTime, limit: usize) -> Vec<&'a Item> {
    let mut queue = focus_queue(items, now);
    queue.truncate(limit);
    queue
}

pub fn overdue_tasks<'a>(items: &'a [Item], now: OffsetDateTime) -> Vec<&'a Item> {
    items.iter().filter(|item| is_overdue(item, now)).collect()
}

pub fn due_soon_tasks<'a>(items: &'a [Item], now: OffsetDateTime) -> Vec<&'a Item> {
    items.iter().filter(|item| is_due_soon(item, now)).collect()
}
