pub mod agent;
pub mod finance;
pub mod history;
pub mod item;
pub mod kind;
pub mod module;
pub mod subscription;

pub use agent::{AgentRun, RunStatus};
pub use finance::{AccountType, FinanceAccount, Transaction, TransactionType};
pub use history::{HistoryAction, HistoryEntry};
pub use item::{kind_from_value, Item, ProjectStatus};
pub use kind::{ItemKind, ParseItemKindError};
pub use module::{FieldType, Module, ModuleEntry, ModuleField};
pub use subscription::{BillingCycle, Subscription, SubscriptionStatus};
