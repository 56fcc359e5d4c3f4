//! In-memory record store.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use super::{Collection, Feeds, Record, RecordStore, Snapshot, Subscription};
use crate::error::{Error, Result};
use crate::records::{Guest, Notification, WantedPerson};

#[derive(Debug, Default)]
struct Collections {
    guests: Vec<Guest>,
    wanted: Vec<WantedPerson>,
    notifications: Vec<Notification>,
}

/// A record store that lives in process memory.
///
/// Writes to a collection can be made to fail with [`MemoryStore::set_failing`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<Collections>,
    failing: Mutex<HashSet<Collection>>,
    feeds: Feeds,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose wanted registry starts with `wanted`.
    #[must_use]
    pub fn with_wanted(wanted: Vec<WantedPerson>) -> Self {
        let store = Self::default();
        store.feeds.publish(Snapshot::Wanted(wanted.clone()));
        if let Ok(mut data) = store.data.lock() {
            data.wanted = wanted;
        }
        store
    }

    /// Make appends to `collection` fail (or succeed again).
    pub fn set_failing(&self, collection: Collection, failing: bool) {
        if let Ok(mut set) = self.failing.lock() {
            if failing {
                set.insert(collection);
            } else {
                set.remove(&collection);
            }
        }
    }

    /// Current snapshot of a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the store lock is poisoned.
    pub fn snapshot(&self, collection: Collection) -> Result<Snapshot> {
        let data = self.lock()?;
        Ok(match collection {
            Collection::Guests => Snapshot::Guests(data.guests.clone()),
            Collection::Wanted => Snapshot::Wanted(data.wanted.clone()),
            Collection::Notifications => Snapshot::Notifications(data.notifications.clone()),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Collections>> {
        self.data
            .lock()
            .map_err(|_| Error::internal("memory store lock poisoned"))
    }

    fn is_failing(&self, collection: Collection) -> bool {
        self.failing
            .lock()
            .map(|set| set.contains(&collection))
            .unwrap_or(false)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn subscribe(&self, collection: Collection) -> Result<Subscription> {
        Ok(self.feeds.subscribe(collection))
    }

    async fn append(&self, record: Record) -> Result<String> {
        let collection = record.collection();
        if self.is_failing(collection) {
            return Err(Error::store_write(collection.as_str(), "store unavailable"));
        }

        let id = record.id().to_string();
        let snapshot = {
            let mut data = self.lock()?;
            match record {
                Record::Guest(guest) => {
                    data.guests.push(guest);
                    Snapshot::Guests(data.guests.clone())
                }
                Record::Wanted(person) => {
                    data.wanted.push(person);
                    Snapshot::Wanted(data.wanted.clone())
                }
                Record::Notification(alert) => {
                    data.notifications.push(alert);
                    Snapshot::Notifications(data.notifications.clone())
                }
            }
        };

        debug!(%collection, %id, "appended record");
        self.feeds.publish(snapshot);
        Ok(id)
    }
}
