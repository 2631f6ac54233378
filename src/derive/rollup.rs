use crate::domain::{Item, ItemKind};

use super::links::{category_parent, explicit_link_parent};

/// Bottom-up statistics for one Area: its projects, the tasks reachable
/// through those projects or linked directly, and its resources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AreaRollup {
    pub area_id: String,
    pub project_count: usize,
    pub task_count: usize,
    pub completed_task_count: usize,
    pub resource_count: usize,
    /// Completed / total, rounded to the nearest integer percent; 0 when the
    /// area has no tasks at all.
    pub completion_rate: u8,
}

fn belongs_to(items: &[Item], child: &Item, owner: &Item) -> bool {
    if child.links_to(owner) {
        return true;
    }
    // Either resolver may attribute the child to this owner; both count once.
    explicit_link_parent(items, child)
        .map(|parent| parent.id == owner.id)
        .unwrap_or(false)
        || category_parent(items, child)
            .map(|parent| parent.id == owner.id)
            .unwrap_or(false)
}

pub fn area_rollup(items: &[Item], area: &Item) -> AreaRollup {
    let projects: Vec<&Item> = items
        .iter()
        .filter(|item| item.kind == ItemKind::Project && belongs_to(items, item, area))
        .collect();

    let mut task_ids: Vec<&str> = Vec::new();
    let mut completed = 0usize;
    let mut tasks: Vec<&Item> = Vec::new();
    for item in items {
        if item.kind != ItemKind::Task {
            continue;
        }
        let direct = belongs_to(items, item, area);
        let transitive = projects.iter().any(|project| {
            item.related_item_ids.iter().any(|id| id == &project.id)
                || project.related_item_ids.iter().any(|id| id == &item.id)
        });
        if (direct || transitive) && !task_ids.contains(&item.id.as_str()) {
            task_ids.push(&item.id);
            tasks.push(item);
            if item.is_completed {
                completed += 1;
            }
        }
    }

    let resource_count = items
        .iter()
        .filter(|item| item.kind == ItemKind::Resource && belongs_to(items, item, area))
        .count();

    let completion_rate = if tasks.is_empty() {
        0
    } else {
        ((completed as f64 / tasks.len() as f64) * 100.0).round() as u8
    };

    AreaRollup {
        area_id: area.id.clone(),
        project_count: projects.len(),
        task_count: tasks.len(),
        completed_task_count: completed,
        resource_count,
        completion_rate,
    }
}

/// Roll-ups for every Area in the collection, in collection order.
pub fn all_area_rollups(items: &[Item]) -> Vec<AreaRollup> {
    items
        .iter()
        .filter(|item| item.kind == ItemKind::Area)
        .map(|area| area_rollup(items, area))
        .collect()
}
