use std::error::Error;
use std::fmt;

use crate::domain::{
    AgentRun, FinanceAccount, HistoryEntry, Item, ItemKind, Module, ModuleEntry, Subscription,
    Transaction,
};

pub mod sqlite;
pub mod tables;

pub use sqlite::SqliteGateway;

#[derive(Debug)]
pub enum GatewayError {
    Db(rusqlite::Error),
    Json(serde_json::Error),
    /// The backing service refused the call; carries the transport's message.
    /// Test doubles use this to simulate persistence failures.
    Rejected(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Db(err) => write!(f, "database error: {}", err),
            GatewayError::Json(err) => write!(f, "serialization error: {}", err),
            GatewayError::Rejected(message) => write!(f, "gateway rejected call: {}", message),
        }
    }
}

impl Error for GatewayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GatewayError::Db(err) => Some(err),
            GatewayError::Json(err) => Some(err),
            GatewayError::Rejected(_) => None,
        }
    }
}

impl From<rusqlite::Error> for GatewayError {
    fn from(value: rusqlite::Error) -> Self {
        GatewayError::Db(value)
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(value: serde_json::Error) -> Self {
        GatewayError::Json(value)
    }
}

/// Outcome of a best-effort batch insert: per-record failures are collected,
/// never fatal to the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    pub inserted: u64,
    pub failures: Vec<(String, String)>,
}

/// Persistence contract for the unified item collection. One logical
/// collection, five physical tables routed by [`ItemKind`], plus the
/// append-only history table.
pub trait ItemGateway {
    fn fetch_all(&self) -> Result<Vec<Item>, GatewayError>;
    fn upsert(&self, item: &Item) -> Result<(), GatewayError>;
    fn delete(&self, id: &str, kind: ItemKind) -> Result<(), GatewayError>;
    /// Wipes every item table and the history table. Destructive; callers
    /// gate this behind a successful backup parse.
    fn bulk_clear(&self) -> Result<(), GatewayError>;
    fn bulk_insert(&self, items: &[Item]) -> Result<BulkReport, GatewayError>;
    fn fetch_history(&self) -> Result<Vec<HistoryEntry>, GatewayError>;
    fn append_history(&self, entry: &HistoryEntry) -> Result<(), GatewayError>;
}

pub trait FinanceGateway {
    fn fetch_accounts(&self) -> Result<Vec<FinanceAccount>, GatewayError>;
    fn upsert_account(&self, account: &FinanceAccount) -> Result<(), GatewayError>;
    fn delete_account(&self, id: &str) -> Result<(), GatewayError>;
    fn fetch_transactions(&self) -> Result<Vec<Transaction>, GatewayError>;
    fn upsert_transaction(&self, tx: &Transaction) -> Result<(), GatewayError>;
    fn delete_transaction(&self, id: &str) -> Result<(), GatewayError>;
}

pub trait SubscriptionGateway {
    fn fetch_subscriptions(&self) -> Result<Vec<Subscription>, GatewayError>;
    fn upsert_subscription(&self, subscription: &Subscription) -> Result<(), GatewayError>;
    fn delete_subscription(&self, id: &str) -> Result<(), GatewayError>;
}

pub trait ModuleGateway {
    fn fetch_modules(&self) -> Result<Vec<Module>, GatewayError>;
    fn upsert_module(&self, module: &Module) -> Result<(), GatewayError>;
    fn delete_module(&self, id: &str) -> Result<(), GatewayError>;
    fn fetch_entries(&self) -> Result<Vec<ModuleEntry>, GatewayError>;
    fn upsert_entry(&self, entry: &ModuleEntry) -> Result<(), GatewayError>;
    fn delete_entry(&self, id: &str) -> Result<(), GatewayError>;
}

pub trait AgentGateway {
    fn fetch_runs(&self) -> Result<Vec<AgentRun>, GatewayError>;
    fn append_run(&self, run: &AgentRun) -> Result<(), GatewayError>;
}
