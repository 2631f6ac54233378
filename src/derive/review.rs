use time::Duration;
use time::OffsetDateTime;

use crate::domain::{Item, ItemKind};
use crate::ids::parse_timestamp;

/// Generic bucket labels that carry no real grouping information. A Task or
/// Resource filed under one of these (or nothing) with no explicit links is
/// considered orphaned and surfaces on the review board.
pub const DEFAULT_ORPHAN_STOPLIST: [&str; 4] = ["general", "inbox", "misc", "other"];

const STALE_PROJECT_AGE: Duration = Duration::days(14);

fn is_generic_bucket(category: &str, stoplist: &[String]) -> bool {
    let normalized = category.trim().to_ascii_lowercase();
    normalized.is_empty()
        || stoplist
            .iter()
            .any(|entry| entry.trim().eq_ignore_ascii_case(&normalized))
}

pub fn is_orphaned(item: &Item, stoplist: &[String]) -> bool {
    matches!(item.kind, ItemKind::Task | ItemKind::Resource)
        && item.related_item_ids.is_empty()
        && is_generic_bucket(&item.category, stoplist)
}

pub fn orphaned_items<'a>(items: &'a [Item], stoplist: &[String]) -> Vec<&'a Item> {
    items
        .iter()
        .filter(|item| is_orphaned(item, stoplist))
        .collect()
}

/// A project still in flight whose last touch is older than the 14-day
/// threshold. Projects without a parseable `updated_at` never qualify.
pub fn is_stale_project(item: &Item, now: OffsetDateTime) -> bool {
    if item.kind != ItemKind::Project {
        return false;
    }
    if item.status.map(|status| status.is_terminal()).unwrap_or(false) {
        return false;
    }
    parse_timestamp(&item.updated_at)
        .map(|ts| now - ts > STALE_PROJECT_AGE)
        .unwrap_or(false)
}

pub fn stale_projects<'a>(items: &'a [Item], now: OffsetDateTime) -> Vec<&'a Item> {
    items
        .iter()
        .filter(|item| is_stale_project(item, now))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{is_orphaned, is_stale_project, orphaned_items, DEFAULT_ORPHAN_STOPLIST};
    use crate::domain::{Item, ItemKind, ProjectStatus};
    use time::macros::datetime;

    fn stoplist() -> Vec<String> {
        DEFAULT_ORPHAN_STOPLIST
            .iter()
            .map(|entry| entry.to_string())
            .collect()
    }

    fn now() -> time::OffsetDateTime {
        datetime!(2026-08-20 12:00:00 UTC)
    }

    #[test]
    fn unlinked_task_in_a_generic_bucket_is_orphaned() {
        let mut task = Item::new("Loose", ItemKind::Task);
        task.category = " Inbox ".to_string();
        assert!(is_orphaned(&task, &stoplist()));

        let mut empty = Item::new("Bare", ItemKind::Resource);
        empty.category = String::new();
        assert!(is_orphaned(&empty, &stoplist()));
    }

    #[test]
    fn linked_or_specifically_bucketed_items_are_not_orphaned() {
        let mut linked = Item::new("Linked", ItemKind::Task);
        linked.category = "inbox".to_string();
        linked.related_item_ids.push("p1".to_string());
        assert!(!is_orphaned(&linked, &stoplist()));

        let mut bucketed = Item::new("Filed", ItemKind::Task);
        bucketed.category = "Marathon".to_string();
        assert!(!is_orphaned(&bucketed, &stoplist()));
    }

    #[test]
    fn only_tasks_and_resources_can_be_orphaned() {
        let project = Item::new("Unfiled project", ItemKind::Project);
        assert!(!is_orphaned(&project, &stoplist()));
        let items = vec![project, Item::new("Unfiled task", ItemKind::Task)];
        assert_eq!(orphaned_items(&items, &stoplist()).len(), 1);
    }

    #[test]
    fn old_active_projects_are_stale() {
        let mut project = Item::new("Drifting", ItemKind::Project);
        project.status = Some(ProjectStatus::Active);
        project.updated_at = "2026-08-01T00:00:00Z".to_string();
        assert!(is_stale_project(&project, now()));
    }

    #[test]
    fn terminal_or_recent_projects_are_not_stale() {
        let mut done = Item::new("Finished", ItemKind::Project);
        done.status = Some(ProjectStatus::Done);
        done.updated_at = "2026-08-01T00:00:00Z".to_string();
        assert!(!is_stale_project(&done, now()));

        let mut fresh = Item::new("Fresh", ItemKind::Project);
        fresh.status = Some(ProjectStatus::Active);
        fresh.updated_at = "2026-08-18T00:00:00Z".to_string();
        assert!(!is_stale_project(&fresh, now()));
    }

    #[test]
    fn fourteen_days_exactly_is_not_yet_stale() {
        let mut project = Item::new("Edge", ItemKind::Project);
        project.updated_at = "2026-08-06T12:00:00Z".to_string();
        assert!(!is_stale_project(&project, now()));
    }
}
