use std::time::Duration;

use rusqlite::{params, Connection, DatabaseName, OptionalExtension};

use crate::domain::{
    AgentRun, FinanceAccount, HistoryEntry, Item, ItemKind, Module, ModuleEntry, Subscription,
    Transaction,
};
use crate::ids::now_utc_rfc3339;

use super::tables::table_for;
use super::{
    AgentGateway, BulkReport, FinanceGateway, GatewayError, ItemGateway, ModuleGateway,
    SubscriptionGateway,
};

pub const CURRENT_SCHEMA_VERSION: i64 = 1;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: [Migration; 1] = [Migration {
    version: 1,
    name: "baseline_para_schema_v1",
    sql: r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    category TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    payload TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS areas (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    category TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    payload TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS resources (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    category TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    payload TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS archives (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    category TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    payload TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    category TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    payload TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS history (
    id TEXT PRIMARY KEY,
    action TEXT NOT NULL,
    item_title TEXT NOT NULL,
    item_kind TEXT NOT NULL,
    occurred_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS accounts (
    id TEXT PRIMARY KEY,
    payload TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS transactions (
    id TEXT PRIMARY KEY,
    tx_date TEXT NOT NULL,
    payload TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS subscriptions (
    id TEXT PRIMARY KEY,
    payload TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS modules (
    id TEXT PRIMARY KEY,
    payload TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS module_entries (
    id TEXT PRIMARY KEY,
    module_id TEXT NOT NULL,
    payload TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS agent_runs (
    id TEXT PRIMARY KEY,
    started_at TEXT NOT NULL,
    payload TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_updated_at ON tasks(updated_at);
CREATE INDEX IF NOT EXISTS idx_history_occurred_at ON history(occurred_at);
CREATE INDEX IF NOT EXISTS idx_transactions_tx_date ON transactions(tx_date);
CREATE INDEX IF NOT EXISTS idx_module_entries_module_id ON module_entries(module_id);
CREATE INDEX IF NOT EXISTS idx_agent_runs_started_at ON agent_runs(started_at);
"#,
}];

/// SQLite-backed implementation of every gateway contract, sharing one
/// connection. Items live in one table per kind; everything else is a flat
/// id + payload table.
pub struct SqliteGateway {
    conn: Connection,
}

impl SqliteGateway {
    pub fn open(path: &str) -> Result<Self, GatewayError> {
        if let Some(parent) = std::path::Path::new(path).parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| GatewayError::Rejected(format!("cannot create db dir: {}", err)))?;
        }
        let mut conn = Connection::open(path)?;
        configure_for_speed(&conn)?;
        apply_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, GatewayError> {
        let mut conn = Connection::open_in_memory()?;
        apply_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    fn fetch_payloads<T: serde::de::DeserializeOwned>(
        &self,
        sql: &str,
    ) -> Result<Vec<T>, GatewayError> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let payload: String = row.get(0)?;
            out.push(serde_json::from_str(&payload)?);
        }
        Ok(out)
    }
}

fn configure_for_speed(conn: &Connection) -> Result<(), GatewayError> {
    conn.pragma_update(None::<DatabaseName>, "journal_mode", "WAL")?;
    conn.pragma_update(None::<DatabaseName>, "synchronous", "NORMAL")?;
    conn.pragma_update(None::<DatabaseName>, "temp_store", "MEMORY")?;
    conn.pragma_update(None::<DatabaseName>, "busy_timeout", 5000i64)?;
    conn.busy_timeout(Duration::from_millis(5000))?;
    Ok(())
}

fn apply_migrations(conn: &mut Connection) -> Result<(), GatewayError> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
);
"#,
    )?;

    for migration in MIGRATIONS {
        let already_applied: Option<i64> = tx
            .query_row(
                "SELECT version FROM schema_migrations WHERE version = ?1",
                params![migration.version],
                |row| row.get(0),
            )
            .optional()?;

        if already_applied.is_some() {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            params![migration.version, migration.name, now_utc_rfc3339()],
        )?;
    }

    tx.execute(
        r#"
INSERT INTO meta (key, value)
VALUES ('schema_version', ?1)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
"#,
        params![CURRENT_SCHEMA_VERSION.to_string()],
    )?;

    tx.commit()?;
    Ok(())
}

fn upsert_payload(
    conn: &Connection,
    table: &str,
    id: &str,
    payload: &str,
) -> Result<(), GatewayError> {
    conn.execute(
        &format!(
            r#"
INSERT INTO {table} (id, payload)
VALUES (?1, ?2)
ON CONFLICT(id) DO UPDATE SET payload = excluded.payload
"#
        ),
        params![id, payload],
    )?;
    Ok(())
}

impl ItemGateway for SqliteGateway {
    fn fetch_all(&self) -> Result<Vec<Item>, GatewayError> {
        let mut items = Vec::new();
        for kind in ItemKind::ALL {
            let table = table_for(kind);
            let mut batch: Vec<Item> =
                self.fetch_payloads(&format!("SELECT payload FROM {table}"))?;
            items.append(&mut batch);
        }
        Ok(items)
    }

    fn upsert(&self, item: &Item) -> Result<(), GatewayError> {
        let table = table_for(item.kind);
        let payload = serde_json::to_string(item)?;
        self.conn.execute(
            &format!(
                r#"
INSERT INTO {table} (id, title, category, created_at, updated_at, payload)
VALUES (?1, ?2, ?3, ?4, ?5, ?6)
ON CONFLICT(id) DO UPDATE SET
    title = excluded.title,
    category = excluded.category,
    updated_at = excluded.updated_at,
    payload = excluded.payload
"#
            ),
            params![
                item.id,
                item.title,
                item.category,
                item.created_at,
                item.updated_at,
                payload
            ],
        )?;
        Ok(())
    }

    fn delete(&self, id: &str, kind: ItemKind) -> Result<(), GatewayError> {
        let table = table_for(kind);
        self.conn
            .execute(&format!("DELETE FROM {table} WHERE id = ?1"), params![id])?;
        Ok(())
    }

    fn bulk_clear(&self) -> Result<(), GatewayError> {
        for kind in ItemKind::ALL {
            self.conn
                .execute(&format!("DELETE FROM {}", table_for(kind)), [])?;
        }
        self.conn.execute("DELETE FROM history", [])?;
        Ok(())
    }

    fn bulk_insert(&self, items: &[Item]) -> Result<BulkReport, GatewayError> {
        let mut report = BulkReport::default();
        for item in items {
            match self.upsert(item) {
                Ok(()) => report.inserted += 1,
                Err(err) => report.failures.push((item.id.clone(), err.to_string())),
            }
        }
        Ok(report)
    }

    fn fetch_history(&self) -> Result<Vec<HistoryEntry>, GatewayError> {
        let mut stmt = self.conn.prepare(
            r#"
SELECT id, action, item_title, item_kind, occurred_at
FROM history
ORDER BY occurred_at DESC, id DESC
"#,
        )?;
        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            let action: String = row.get(1)?;
            let item_kind: String = row.get(3)?;
            entries.push(HistoryEntry {
                id: row.get(0)?,
                action: serde_json::from_value(serde_json::Value::String(action))?,
                item_title: row.get(2)?,
                item_kind: serde_json::from_value(serde_json::Value::String(item_kind))?,
                occurred_at: row.get(4)?,
            });
        }
        Ok(entries)
    }

    fn append_history(&self, entry: &HistoryEntry) -> Result<(), GatewayError> {
        self.conn.execute(
            r#"
INSERT INTO history (id, action, item_title, item_kind, occurred_at)
VALUES (?1, ?2, ?3, ?4, ?5)
"#,
            params![
                entry.id,
                entry.action.as_str(),
                entry.item_title,
                entry.item_kind.as_str(),
                entry.occurred_at
            ],
        )?;
        Ok(())
    }
}

impl FinanceGateway for SqliteGateway {
    fn fetch_accounts(&self) -> Result<Vec<FinanceAccount>, GatewayError> {
        self.fetch_payloads("SELECT payload FROM accounts")
    }

    fn upsert_account(&self, account: &FinanceAccount) -> Result<(), GatewayError> {
        let payload = serde_json::to_string(account)?;
        upsert_payload(&self.conn, "accounts", &account.id, &payload)
    }

    fn delete_account(&self, id: &str) -> Result<(), GatewayError> {
        self.conn
            .execute("DELETE FROM accounts WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn fetch_transactions(&self) -> Result<Vec<Transaction>, GatewayError> {
        self.fetch_payloads("SELECT payload FROM transactions ORDER BY tx_date DESC")
    }

    fn upsert_transaction(&self, tx: &Transaction) -> Result<(), GatewayError> {
        let payload = serde_json::to_string(tx)?;
        self.conn.execute(
            r#"
INSERT INTO transactions (id, tx_date, payload)
VALUES (?1, ?2, ?3)
ON CONFLICT(id) DO UPDATE SET tx_date = excluded.tx_date, payload = excluded.payload
"#,
            params![tx.id, tx.date, payload],
        )?;
        Ok(())
    }

    fn delete_transaction(&self, id: &str) -> Result<(), GatewayError> {
        self.conn
            .execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
        Ok(())
    }
}

impl SubscriptionGateway for SqliteGateway {
    fn fetch_subscriptions(&self) -> Result<Vec<Subscription>, GatewayError> {
        self.fetch_payloads("SELECT payload FROM subscriptions")
    }

    fn upsert_subscription(&self, subscription: &Subscription) -> Result<(), GatewayError> {
        let payload = serde_json::to_string(subscription)?;
        upsert_payload(&self.conn, "subscriptions", &subscription.id, &payload)
    }

    fn delete_subscription(&self, id: &str) -> Result<(), GatewayError> {
        self.conn
            .execute("DELETE FROM subscriptions WHERE id = ?1", params![id])?;
        Ok(())
    }
}

impl ModuleGateway for SqliteGateway {
    fn fetch_modules(&self) -> Result<Vec<Module>, GatewayError> {
        self.fetch_payloads("SELECT payload FROM modules")
    }

    fn upsert_module(&self, module: &Module) -> Result<(), GatewayError> {
        let payload = serde_json::to_string(module)?;
        upsert_payload(&self.conn, "modules", &module.id, &payload)
    }

    fn delete_module(&self, id: &str) -> Result<(), GatewayError> {
        self.conn
            .execute("DELETE FROM modules WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn fetch_entries(&self) -> Result<Vec<ModuleEntry>, GatewayError> {
        self.fetch_payloads("SELECT payload FROM module_entries")
    }

    fn upsert_entry(&self, entry: &ModuleEntry) -> Result<(), GatewayError> {
        let payload = serde_json::to_string(entry)?;
        self.conn.execute(
            r#"
INSERT INTO module_entries (id, module_id, payload)
VALUES (?1, ?2, ?3)
ON CONFLICT(id) DO UPDATE SET module_id = excluded.module_id, payload = excluded.payload
"#,
            params![entry.id, entry.module_id, payload],
        )?;
        Ok(())
    }

    fn delete_entry(&self, id: &str) -> Result<(), GatewayError> {
        self.conn
            .execute("DELETE FROM module_entries WHERE id = ?1", params![id])?;
        Ok(())
    }
}

impl AgentGateway for SqliteGateway {
    fn fetch_runs(&self) -> Result<Vec<AgentRun>, GatewayError> {
        self.fetch_payloads("SELECT payload FROM agent_runs ORDER BY started_at DESC")
    }

    fn append_run(&self, run: &AgentRun) -> Result<(), GatewayError> {
        let payload = serde_json::to_string(run)?;
        self.conn.execute(
            "INSERT INTO agent_runs (id, started_at, payload) VALUES (?1, ?2, ?3)",
            params![run.id, run.started_at, payload],
        )?;
        Ok(())
    }
}
