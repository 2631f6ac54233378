use std::sync::mpsc::{Receiver, Sender, TryRecvError};

use serde_json::Value;

use crate::domain::{kind_from_value, Item, ItemKind};
use crate::gateway::tables::kind_for_table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One notification off the realtime channel. Delivery is at-least-once,
/// possibly duplicated, with no ordering guarantee relative to in-flight
/// local writes; the store's merge rules absorb all of that.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub table: String,
    pub row: Value,
}

impl ChangeEvent {
    pub fn new(kind: ChangeKind, table: impl Into<String>, row: Value) -> Self {
        Self {
            kind,
            table: table.into(),
            row,
        }
    }

    /// Resolves the item kind for this event: an explicit field on the row
    /// wins, else the originating table name decides.
    pub fn item_kind(&self) -> Option<ItemKind> {
        kind_from_value(&self.row).or_else(|| kind_for_table(&self.table))
    }

    /// Decodes the row into an item, injecting the resolved kind when the
    /// row itself did not carry one.
    pub fn decode_item(&self) -> Option<Item> {
        let kind = self.item_kind()?;
        let mut row = self.row.clone();
        if let Value::Object(ref mut map) = row {
            map.entry("kind")
                .or_insert_with(|| Value::String(kind.as_str().to_string()));
        }
        serde_json::from_value(row).ok()
    }

    pub fn row_id(&self) -> Option<&str> {
        self.row.get("id").and_then(|value| value.as_str())
    }
}

/// Subscription handle contract for the realtime channel. Implementations
/// must stop delivering after `unsubscribe`.
pub trait ChangeFeed {
    fn try_next(&mut self) -> Option<ChangeEvent>;
    fn unsubscribe(&mut self);
}

/// In-process channel-backed feed, used by tests and embedders that bridge
/// their own transport onto the store.
pub struct ChannelFeed {
    receiver: Receiver<ChangeEvent>,
    active: bool,
}

impl ChannelFeed {
    pub fn new() -> (Sender<ChangeEvent>, Self) {
        let (sender, receiver) = std::sync::mpsc::channel();
        (
            sender,
            Self {
                receiver,
                active: true,
            },
        )
    }
}

impl ChangeFeed for ChannelFeed {
    fn try_next(&mut self) -> Option<ChangeEvent> {
        if !self.active {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    fn unsubscribe(&mut self) {
        self.active = false;
    }
}
