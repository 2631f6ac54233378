//! Client-side state layer for a PARA-method workspace: a unified item
//! collection with optimistic mutations and realtime merge, derived
//! relationships and dashboards, satellite stores for finance, subscriptions,
//! user-defined modules and agent runs, and a natural-language command layer.
//!
//! Nothing in here blocks on the UI: stores mutate local snapshots first,
//! persist through injected gateways, and roll back or log according to each
//! operation's policy.

pub mod agent;
pub mod backup;
pub mod derive;
pub mod domain;
pub mod finance;
pub mod gateway;
pub mod ids;
pub mod intent;
pub mod modules;
pub mod retry;
pub mod settings;
pub mod store;
pub mod subscriptions;

pub use agent::AgentStore;
pub use finance::FinanceStore;
pub use intent::Interpreter;
pub use modules::ModuleStore;
pub use retry::RetryPolicy;
pub use settings::Settings;
pub use store::ItemStore;
pub use subscriptions::SubscriptionStore;
