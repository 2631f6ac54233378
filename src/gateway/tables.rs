use std::str::FromStr;

use crate::domain::ItemKind;

/// Total routing function from kind to physical table. Exhaustive by
/// construction: adding a kind fails to compile until a table is assigned.
pub fn table_for(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Project => "projects",
        ItemKind::Area => "areas",
        ItemKind::Resource => "resources",
        ItemKind::Archive => "archives",
        ItemKind::Task => "tasks",
    }
}

/// Reverse lookup used by the realtime merge path when a change row carries
/// no explicit kind field. Unknown tables resolve to `None`, never panic.
pub fn kind_for_table(table: &str) -> Option<ItemKind> {
    let normalized = table.trim().to_ascii_lowercase();
    for kind in ItemKind::ALL {
        if table_for(kind) == normalized {
            return Some(kind);
        }
    }
    // Tolerate singular table names from older channel configurations.
    ItemKind::from_str(&normalized).ok()
}

/// Every table the realtime channel watches for item changes.
pub fn watched_tables() -> [&'static str; 5] {
    [
        table_for(ItemKind::Project),
        table_for(ItemKind::Area),
        table_for(ItemKind::Resource),
        table_for(ItemKind::Archive),
        table_for(ItemKind::Task),
    ]
}

#[cfg(test)]
mod tests {
    use super::{kind_for_table, table_for, watched_tables};
    use crate::domain::ItemKind;

    #[test]
    fn every_kind_routes_to_a_distinct_table() {
        let mut tables: Vec<&str> = ItemKind::ALL.iter().map(|kind| table_for(*kind)).collect();
        tables.sort_unstable();
        tables.dedup();
        assert_eq!(tables.len(), ItemKind::ALL.len());
    }

    #[test]
    fn routing_round_trips() {
        for kind in ItemKind::ALL {
            assert_eq!(kind_for_table(table_for(kind)), Some(kind));
        }
    }

    #[test]
    fn unknown_tables_resolve_to_none() {
        assert_eq!(kind_for_table("history"), None);
        assert_eq!(kind_for_table(""), None);
    }

    #[test]
    fn singular_names_are_tolerated() {
        assert_eq!(kind_for_table("task"), Some(ItemKind::Task));
        assert_eq!(kind_for_table("Area"), Some(ItemKind::Area));
    }

    #[test]
    fn watched_tables_cover_all_kinds() {
        assert_eq!(watched_tables().len(), ItemKind::ALL.len());
    }
}
