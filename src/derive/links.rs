use crate::domain::{Item, ItemKind};

/// Two independent signals produce parent/child structure: explicit membership
/// in `related_item_ids` (checked in both directions), and a naming-convention
/// match where a child's free-text `category` equals a parent's `title`. The
/// resolvers below keep the signals separate so each stays testable; the
/// composed functions apply the documented precedence and dedup by id.
///
/// A relationship id pointing at a since-deleted item is simply no match.

fn titles_match(a: &str, b: &str) -> bool {
    let a = a.trim();
    let b = b.trim();
    !a.is_empty() && a.eq_ignore_ascii_case(b)
}

/// Explicit-link resolver: the first other item linked to `item` in either
/// direction, in collection order. Only existence matters to consumers, so
/// "first match wins" is an acceptable tie-break.
pub fn explicit_link_parent<'a>(items: &'a [Item], item: &Item) -> Option<&'a Item> {
    items
        .iter()
        .find(|candidate| candidate.id != item.id && candidate.links_to(item))
}

/// Naming-convention resolver: the first Area or Project whose title equals
/// the item's free-text category label.
pub fn category_parent<'a>(items: &'a [Item], item: &Item) -> Option<&'a Item> {
    if item.category.trim().is_empty() {
        return None;
    }
    items.iter().find(|candidate| {
        candidate.id != item.id
            && matches!(candidate.kind, ItemKind::Area | ItemKind::Project)
            && titles_match(&candidate.title, &item.category)
    })
}

/// Composed parent resolution: explicit link first, category fallback second.
/// Areas are roots and never have a parent.
pub fn parent_of<'a>(items: &'a [Item], item: &Item) -> Option<&'a Item> {
    if item.kind == ItemKind::Area {
        return None;
    }
    explicit_link_parent(items, item).or_else(|| category_parent(items, item))
}

/// All children of `item`: everything linked to it plus everything whose
/// category label names it. An item matching through both signals appears
/// once — collection order, deduplicated by id.
pub fn children_of<'a>(items: &'a [Item], item: &Item) -> Vec<&'a Item> {
    let mut children: Vec<&Item> = Vec::new();
    for candidate in items {
        if candidate.id == item.id {
            continue;
        }
        let linked = candidate.links_to(item);
        let named = titles_match(&item.title, &candidate.category);
        if (linked || named) && !children.iter().any(|existing| existing.id == candidate.id) {
            children.push(candidate);
        }
    }
    children
}
