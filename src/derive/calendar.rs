use std::collections::BTreeMap;

use time::Date;

use crate::domain::{Item, ItemKind};
use crate::ids::parse_timestamp;

/// Buckets dated, incomplete tasks by civil date for the calendar view.
/// Undated and unparseable entries simply do not appear.
pub fn tasks_by_date(items: &[Item]) -> BTreeMap<Date, Vec<&Item>> {
    let mut buckets: BTreeMap<Date, Vec<&Item>> = BTreeMap::new();
    for item in items {
        if item.kind != ItemKind::Task || item.is_completed {
            continue;
        }
        let Some(due) = item.due_date.as_deref().and_then(parse_timestamp) else {
            continue;
        };
        buckets.entry(due.date()).or_default().push(item);
    }
    buckets
}
