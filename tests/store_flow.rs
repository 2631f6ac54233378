//! End-to-end flows over the real SQLite gateway: the full lifecycle of an
//! item through add, complete, archive, export, import, and the healing
//! sweep, plus derivations computed from persisted state.

use trellis::derive::{area_rollup, focus_queue, parent_of};
use trellis::domain::{HistoryAction, Item, ItemKind};
use trellis::gateway::{ItemGateway, SqliteGateway};
use trellis::store::{ChangeEvent, ChangeKind, ItemStore};
use time::macros::datetime;

fn fresh_store() -> ItemStore {
    ItemStore::new(Box::new(SqliteGateway::open_in_memory().expect("db")))
}

fn task(title: &str) -> Item {
    Item::new(title, ItemKind::Task)
}

#[test]
fn lifecycle_survives_a_reload() {
    let mut store = fresh_store();
    let item = task("Write report");
    let id = item.id.clone();
    store.add(item).expect("add");
    store.toggle_complete(&id).expect("toggle");

    store.load().expect("reload");
    let reloaded = store.get(&id).expect("still there");
    assert!(reloaded.is_completed);

    let actions: Vec<HistoryAction> = store.history().iter().map(|h| h.action).collect();
    assert_eq!(actions, vec![HistoryAction::Complete, HistoryAction::Create]);
}

#[test]
fn archive_moves_the_row_between_tables() {
    let mut store = fresh_store();
    let item = task("Old task");
    let id = item.id.clone();
    store.add(item).expect("add");
    let archived = store.archive(&id).expect("archive");
    assert_eq!(archived.kind, ItemKind::Archive);

    store.load().expect("reload");
    assert_eq!(store.get(&id).expect("present").kind, ItemKind::Archive);
    assert_eq!(store.items().len(), 1);
}

#[test]
fn export_import_round_trip_replaces_everything() {
    let mut store = fresh_store();
    store.add(task("Keep me")).expect("add");
    store.add(task("Me too")).expect("add");
    let backup = store.export().expect("export").to_json().expect("json");

    let mut other = fresh_store();
    other.add(task("Doomed")).expect("add");
    other.import(&backup).expect("import");

    let titles: Vec<&str> = other.items().iter().map(|item| item.title.as_str()).collect();
    assert_eq!(titles.len(), 2);
    assert!(titles.contains(&"Keep me"));
    assert!(!titles.contains(&"Doomed"));
}

#[test]
fn garbage_import_leaves_the_database_untouched() {
    let mut store = fresh_store();
    store.add(task("Survivor")).expect("add");
    assert!(store.import("{\"nonsense\": true}").is_err());
    store.load().expect("reload");
    assert_eq!(store.items().len(), 1);
}

#[test]
fn reconcile_persists_items_known_only_locally() {
    let mut store = fresh_store();
    store.add(task("Persisted")).expect("add");

    // A realtime insert lands in the local snapshot without ever touching
    // this client's persistence; the sweep writes it through.
    store.apply_change(ChangeEvent::new(
        ChangeKind::Insert,
        "tasks",
        serde_json::json!({
            "id": "remote-1",
            "title": "From the feed",
            "createdAt": "2026-08-01T00:00:00Z",
            "updatedAt": "2026-08-01T00:00:00Z",
        }),
    ));
    assert_eq!(store.items().len(), 2);

    assert_eq!(store.reconcile().expect("sweep"), 1);
    store.load().expect("reload");
    assert!(store.get("remote-1").is_some());
    assert_eq!(store.reconcile().expect("sweep"), 0);
}

#[test]
fn derivations_read_straight_off_the_snapshot() {
    let mut store = fresh_store();
    let mut area = Item::new("Health", ItemKind::Area);
    area.id = "area-health".to_string();
    let mut project = Item::new("Marathon", ItemKind::Project);
    project.related_item_ids.push("area-health".to_string());
    let project_id = project.id.clone();
    let mut run = task("Long run");
    run.related_item_ids.push(project_id.clone());
    run.due_date = Some("2026-08-21T06:00:00Z".to_string());
    let run_id = run.id.clone();

    store.add(area).expect("add");
    store.add(project).expect("add");
    store.add(run).expect("add");
    store.load().expect("reload");

    let items = store.items();
    let run_task = store.get(&run_id).expect("task");
    assert_eq!(parent_of(items, run_task).expect("parent").id, project_id);
    let project = store.get(&project_id).expect("project");
    assert!(parent_of(items, project).is_some());

    let area = store.get("area-health").expect("area");
    let rollup = area_rollup(items, area);
    assert_eq!(rollup.project_count, 1);
    assert_eq!(rollup.task_count, 1);

    let now = datetime!(2026-08-20 12:00:00 UTC);
    let queue = focus_queue(items, now);
    assert_eq!(queue[0].id, run_id);
}

#[test]
fn wrong_kind_delete_is_ignored_by_the_gateway() {
    let gateway = SqliteGateway::open_in_memory().expect("db");
    let item = task("Routed");
    gateway.upsert(&item).expect("upsert");
    gateway.delete(&item.id, ItemKind::Project).expect("no-op");
    assert_eq!(gateway.fetch_all().expect("fetch").len(), 1);
}
