use std::error::Error;
use std::fmt;

use crate::backup::{parse_backup, Backup, BackupParseError};
use crate::domain::{HistoryAction, HistoryEntry, Item, ItemKind};
use crate::gateway::{GatewayError, ItemGateway};
use crate::ids::{now_utc_rfc3339, parse_timestamp};

pub mod feed;

pub use feed::{ChangeEvent, ChangeFeed, ChangeKind, ChannelFeed};

/// Per-operation rollback policy. Add and Delete undo their optimistic local
/// change when the gateway rejects; Update and Archive keep the local change
/// and only surface the error. The asymmetry is deliberate and relied on by
/// the view layer's failure messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Add,
    Delete,
    Update,
    Archive,
}

impl MutationKind {
    pub fn rolls_back_on_failure(self) -> bool {
        match self {
            MutationKind::Add | MutationKind::Delete => true,
            MutationKind::Update | MutationKind::Archive => false,
        }
    }
}

#[derive(Debug)]
pub enum StoreError {
    NotFound(String),
    Gateway(GatewayError),
    ImportParse(BackupParseError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "item '{}' not found in local snapshot", id),
            StoreError::Gateway(err) => write!(f, "persistence failure: {}", err),
            StoreError::ImportParse(err) => write!(f, "import rejected: {}", err),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::NotFound(_) => None,
            StoreError::Gateway(err) => Some(err),
            StoreError::ImportParse(err) => Some(err),
        }
    }
}

impl From<GatewayError> for StoreError {
    fn from(value: GatewayError) -> Self {
        StoreError::Gateway(value)
    }
}

impl From<BackupParseError> for StoreError {
    fn from(value: BackupParseError) -> Self {
        StoreError::ImportParse(value)
    }
}

/// Single source of truth for the unified item collection.
///
/// Three input streams converge here: the initial bulk load, local optimistic
/// mutations, and realtime notifications of remote mutations (including echoes
/// of this client's own writes). All three funnel into the same replace-by-id /
/// insert-if-absent / remove-by-id primitives, which keeps the merge idempotent
/// under duplicate or out-of-order delivery. True conflicting edits are not
/// resolved; the last write observed wins.
///
/// Every local mutation is applied synchronously before the gateway call is
/// issued, so callers see zero-latency feedback and the rollback paths below
/// correct the snapshot when persistence later rejects the write.
pub struct ItemStore {
    gateway: Box<dyn ItemGateway>,
    items: Vec<Item>,
    history: Vec<HistoryEntry>,
}

impl ItemStore {
    pub fn new(gateway: Box<dyn ItemGateway>) -> Self {
        Self {
            gateway,
            items: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Replaces the whole snapshot from persistence, newest-created-first,
    /// and loads the history log newest-first. On failure the previous
    /// snapshot is left untouched; there is no implicit retry.
    pub fn load(&mut self) -> Result<(), StoreError> {
        let mut items = self.gateway.fetch_all()?;
        sort_newest_created_first(&mut items);
        let history = self.gateway.fetch_history()?;
        self.items = items;
        self.history = history;
        Ok(())
    }

    /// Optimistic insert: the item is visible immediately and removed again
    /// if the gateway rejects the write. History logging is best-effort and
    /// never rolls back a successful add.
    pub fn add(&mut self, item: Item) -> Result<(), StoreError> {
        self.items.insert(0, item.clone());
        if let Err(err) = self.gateway.upsert(&item) {
            if MutationKind::Add.rolls_back_on_failure() {
                self.items.retain(|existing| existing.id != item.id);
            }
            return Err(err.into());
        }
        self.append_history_best_effort(HistoryEntry::record(
            HistoryAction::Create,
            &item.title,
            item.kind,
        ));
        Ok(())
    }

    /// Optimistic delete. An absent id is a no-op. The Delete history entry
    /// is written before the destructive gateway call, so the log reflects
    /// intent even when the delete partially fails downstream — a known,
    /// documented inconsistency inherited from the operation's contract.
    pub fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        let Some(position) = self.items.iter().position(|item| item.id == id) else {
            return Ok(());
        };
        let removed = self.items.remove(position);
        self.append_history_best_effort(HistoryEntry::record(
            HistoryAction::Delete,
            &removed.title,
            removed.kind,
        ));
        if let Err(err) = self.gateway.delete(id, removed.kind) {
            if MutationKind::Delete.rolls_back_on_failure() {
                self.items.insert(position, removed);
            }
            return Err(err.into());
        }
        Ok(())
    }

    /// Optimistic in-place replacement. Persistence failures surface to the
    /// caller but the local change is kept (no rollback path, by policy).
    pub fn update(&mut self, item: Item) -> Result<(), StoreError> {
        let Some(position) = self.items.iter().position(|existing| existing.id == item.id) else {
            return Err(StoreError::NotFound(item.id));
        };
        self.items[position] = item.clone();
        if let Err(err) = self.gateway.upsert(&item) {
            debug_assert!(!MutationKind::Update.rolls_back_on_failure());
            log::error!("update of '{}' failed to persist: {}", item.id, err);
            return Err(err.into());
        }
        Ok(())
    }

    /// Flips completion, stamps `updated_at`, persists, then records either a
    /// Complete or Update history entry depending on the new state. Returns
    /// the updated item so callers need not re-query.
    pub fn toggle_complete(&mut self, id: &str) -> Result<Item, StoreError> {
        let Some(current) = self.get(id).cloned() else {
            return Err(StoreError::NotFound(id.to_string()));
        };
        let mut updated = current;
        updated.is_completed = !updated.is_completed;
        updated.updated_at = now_utc_rfc3339();
        self.update(updated.clone())?;
        let action = if updated.is_completed {
            HistoryAction::Complete
        } else {
            HistoryAction::Update
        };
        self.append_history_best_effort(HistoryEntry::record(action, &updated.title, updated.kind));
        Ok(updated)
    }

    /// Moves an item to the Archive kind. Because kind determines physical
    /// storage this is a delete from the old table followed by an insert into
    /// the archive table; the two calls can fail independently and there is
    /// no compensating transaction (at-least-once, not exactly-once — see
    /// `reconcile` for the healing sweep). Local state changes first and is
    /// not rolled back on failure.
    pub fn archive(&mut self, id: &str) -> Result<Item, StoreError> {
        let Some(position) = self.items.iter().position(|item| item.id == id) else {
            return Err(StoreError::NotFound(id.to_string()));
        };
        let previous_kind = self.items[position].kind;
        if previous_kind == ItemKind::Archive {
            return Ok(self.items[position].clone());
        }
        self.items[position].kind = ItemKind::Archive;
        self.items[position].updated_at = now_utc_rfc3339();
        let archived = self.items[position].clone();

        debug_assert!(!MutationKind::Archive.rolls_back_on_failure());
        if let Err(err) = self.gateway.delete(id, previous_kind) {
            log::error!("archive of '{}': delete from old table failed: {}", id, err);
            return Err(err.into());
        }
        if let Err(err) = self.gateway.upsert(&archived) {
            log::error!("archive of '{}': insert into archive failed: {}", id, err);
            return Err(err.into());
        }
        Ok(archived)
    }

    /// Healing sweep for the archive window: any item present in the local
    /// snapshot but in no backing table is re-upserted. Returns how many
    /// items were healed.
    pub fn reconcile(&mut self) -> Result<u32, StoreError> {
        let persisted = self.gateway.fetch_all()?;
        let mut healed = 0u32;
        for item in &self.items {
            if !persisted.iter().any(|existing| existing.id == item.id) {
                self.gateway.upsert(item)?;
                healed += 1;
            }
        }
        Ok(healed)
    }

    /// Serializes the remote-fetched (not locally cached) item set plus the
    /// full history log into a single backup document.
    pub fn export(&self) -> Result<Backup, StoreError> {
        let mut items = self.gateway.fetch_all()?;
        sort_newest_created_first(&mut items);
        let history = self.gateway.fetch_history()?;
        Ok(Backup { items, history })
    }

    /// Destructive replace-all. The wipe is gated behind a successful parse;
    /// per-item insert failures are logged and skipped, then the snapshot is
    /// reloaded from persistence. Callers must confirm with the user first.
    pub fn import(&mut self, raw: &str) -> Result<(), StoreError> {
        let backup = parse_backup(raw)?;
        self.gateway.bulk_clear()?;
        let report = self.gateway.bulk_insert(&backup.items)?;
        for (id, reason) in &report.failures {
            log::warn!("import skipped item '{}': {}", id, reason);
        }
        self.load()
    }

    /// Merges one realtime notification. Insert skips ids already present
    /// (the optimistic-add-then-echo race), Update replaces or inserts, and
    /// Delete removes unconditionally. Undecodable rows are logged and
    /// dropped, never fatal.
    pub fn apply_change(&mut self, event: ChangeEvent) {
        match event.kind {
            ChangeKind::Insert => {
                let Some(item) = event.decode_item() else {
                    log::warn!("ignoring undecodable insert from '{}'", event.table);
                    return;
                };
                if self.get(&item.id).is_some() {
                    return;
                }
                self.items.insert(0, item);
            }
            ChangeKind::Update => {
                let Some(item) = event.decode_item() else {
                    log::warn!("ignoring undecodable update from '{}'", event.table);
                    return;
                };
                match self.items.iter().position(|existing| existing.id == item.id) {
                    Some(position) => self.items[position] = item,
                    None => self.items.insert(0, item),
                }
            }
            ChangeKind::Delete => {
                if let Some(id) = event.row_id() {
                    self.items.retain(|item| item.id != id);
                }
            }
        }
    }

    /// Drains a feed subscription into the snapshot.
    pub fn absorb(&mut self, feed: &mut dyn ChangeFeed) {
        while let Some(event) = feed.try_next() {
            self.apply_change(event);
        }
    }

    fn append_history_best_effort(&mut self, entry: HistoryEntry) {
        if let Err(err) = self.gateway.append_history(&entry) {
            log::warn!(
                "history append for '{}' failed (kept going): {}",
                entry.item_title,
                err
            );
            return;
        }
        self.history.insert(0, entry);
    }
}

fn sort_newest_created_first(items: &mut [Item]) {
    items.sort_by(|a, b| {
        let a_ts = parse_timestamp(&a.created_at);
        let b_ts = parse_timestamp(&b.created_at);
        b_ts.cmp(&a_ts)
    });
}
