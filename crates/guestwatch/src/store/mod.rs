//! The record store the registries live in.
//!
//! The store is reached through [`RecordStore`]: subscribe to a collection to
//! get every full snapshot as it changes, or append a record. Snapshots come
//! in store order; re-ordering for display is up to the reader.
//!
//! Two implementations ship with the crate: [`MemoryStore`], used by tests and
//! anything that needs a throwaway registry, and [`SqliteStore`], which keeps
//! the registries in a local database file.

mod memory;
pub mod migrations;
pub mod schema;
mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::records::{Guest, Notification, WantedPerson};

pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, Storage, StorageStats, WatcherHandle};

/// One of the three registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Guest check-ins.
    Guests,
    /// Wanted persons.
    Wanted,
    /// Alerts.
    Notifications,
}

impl Collection {
    /// All collections, in subscription order.
    pub const ALL: [Self; 3] = [Self::Guests, Self::Wanted, Self::Notifications];

    /// Stable name used in logs and errors.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Guests => "guests",
            Self::Wanted => "wanted",
            Self::Notifications => "notifications",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record on its way into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// A guest check-in.
    Guest(Guest),
    /// A wanted person.
    Wanted(WantedPerson),
    /// An alert.
    Notification(Notification),
}

impl Record {
    /// Collection this record belongs to.
    #[must_use]
    pub fn collection(&self) -> Collection {
        match self {
            Self::Guest(_) => Collection::Guests,
            Self::Wanted(_) => Collection::Wanted,
            Self::Notification(_) => Collection::Notifications,
        }
    }

    /// The record's identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Guest(g) => &g.id,
            Self::Wanted(w) => &w.id,
            Self::Notification(n) => &n.id,
        }
    }
}

/// The full contents of one collection at some moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    /// Every guest.
    Guests(Vec<Guest>),
    /// Every wanted person.
    Wanted(Vec<WantedPerson>),
    /// Every alert.
    Notifications(Vec<Notification>),
}

impl Snapshot {
    /// An empty snapshot of `collection`.
    #[must_use]
    pub fn empty(collection: Collection) -> Self {
        match collection {
            Collection::Guests => Self::Guests(Vec::new()),
            Collection::Wanted => Self::Wanted(Vec::new()),
            Collection::Notifications => Self::Notifications(Vec::new()),
        }
    }

    /// Collection this snapshot is of.
    #[must_use]
    pub fn collection(&self) -> Collection {
        match self {
            Self::Guests(_) => Collection::Guests,
            Self::Wanted(_) => Collection::Wanted,
            Self::Notifications(_) => Collection::Notifications,
        }
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Guests(v) => v.len(),
            Self::Wanted(v) => v.len(),
            Self::Notifications(v) => v.len(),
        }
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A live feed of full snapshots for one collection.
#[derive(Debug)]
pub struct Subscription {
    collection: Collection,
    rx: watch::Receiver<Snapshot>,
}

impl Subscription {
    /// Collection this feed is for.
    #[must_use]
    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// The latest snapshot, marking it seen.
    pub fn latest(&mut self) -> Snapshot {
        self.rx.borrow_and_update().clone()
    }

    /// Wait until a snapshot newer than the last one seen arrives.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SubscriptionClosed`] once the store has gone away.
    pub async fn changed(&mut self) -> Result<()> {
        self.rx.changed().await.map_err(|_| Error::SubscriptionClosed {
            collection: self.collection.as_str(),
        })
    }
}

/// Access to the external record store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Subscribe to a collection. The feed starts at the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    async fn subscribe(&self, collection: Collection) -> Result<Subscription>;

    /// Append a record and return its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails. Nothing is retried.
    async fn append(&self, record: Record) -> Result<String>;
}

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    async fn subscribe(&self, collection: Collection) -> Result<Subscription> {
        (**self).subscribe(collection).await
    }

    async fn append(&self, record: Record) -> Result<String> {
        (**self).append(record).await
    }
}

/// Latest snapshot of each collection, shared with subscribers.
#[derive(Debug)]
pub(crate) struct Feeds {
    guests: watch::Sender<Snapshot>,
    wanted: watch::Sender<Snapshot>,
    notifications: watch::Sender<Snapshot>,
}

impl Default for Feeds {
    fn default() -> Self {
        let feed = |c| watch::channel(Snapshot::empty(c)).0;
        Self {
            guests: feed(Collection::Guests),
            wanted: feed(Collection::Wanted),
            notifications: feed(Collection::Notifications),
        }
    }
}

impl Feeds {
    fn sender(&self, collection: Collection) -> &watch::Sender<Snapshot> {
        match collection {
            Collection::Guests => &self.guests,
            Collection::Wanted => &self.wanted,
            Collection::Notifications => &self.notifications,
        }
    }

    pub(crate) fn subscribe(&self, collection: Collection) -> Subscription {
        Subscription {
            collection,
            rx: self.sender(collection).subscribe(),
        }
    }

    /// Replace the snapshot of its collection and wake subscribers.
    pub(crate) fn publish(&self, snapshot: Snapshot) {
        self.sender(snapshot.collection()).send_replace(snapshot);
    }
}
