//! Pure derivations over the flat item snapshot: hierarchy, roll-ups, focus
//! ranking, KPIs, review queues, calendar buckets. Every function here is
//! referentially transparent — same inputs, same outputs, no hidden state —
//! and safe to re-run on every render. Time-dependent views take `now` as an
//! explicit argument.

pub mod calendar;
pub mod focus;
pub mod kpi;
pub mod links;
pub mod review;
pub mod rollup;

pub use calendar::tasks_by_date;
pub use focus::{
    due_soon_tasks, focus_queue, is_due_soon, is_overdue, is_triage_pending, overdue_tasks,
    top_focus, DUE_SOON_HORIZON, TRIAGE_TAG,
};
pub use kpi::{automation_success_rate, ops_kpis, rolling_net, OpsKpis};
pub use links::{category_parent, children_of, explicit_link_parent, parent_of};
pub use review::{
    is_orphaned, is_stale_project, orphaned_items, stale_projects, DEFAULT_ORPHAN_STOPLIST,
};
pub use rollup::{all_area_rollups, area_rollup, AreaRollup};
