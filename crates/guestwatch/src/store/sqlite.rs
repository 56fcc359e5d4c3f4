//! `SQLite`-backed record store.
//!
//! [`Storage`] is the synchronous table layer. [`SqliteStore`] wraps it in the
//! [`RecordStore`] capability: it republishes a collection's snapshot after
//! each local append, and a spawned watcher polls `PRAGMA data_version` so
//! commits made by other processes reach subscribers too.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::migrations;
use super::{Collection, Feeds, Record, RecordStore, Snapshot, Subscription};
use crate::error::{Error, Result};
use crate::records::{Guest, Notification, Severity, WantedPerson};

/// Table layer for the three registries.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a database at the given path.
    ///
    /// Creates parent directories and initializes the schema as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        // WAL lets `watch` read while another process registers guests.
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert a record into its table.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, including on a duplicate id.
    pub fn insert(&self, record: &Record) -> Result<()> {
        match record {
            Record::Guest(guest) => self.insert_guest(guest),
            Record::Wanted(person) => self.insert_wanted(person),
            Record::Notification(alert) => self.insert_notification(alert),
        }
    }

    fn insert_guest(&self, guest: &Guest) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO guests (id, full_name, nationality, room_number, photo,
                                hotel_name, hotel_zone, checked_in_at, is_wanted)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
            params![
                guest.id,
                guest.full_name,
                guest.nationality,
                guest.room_number,
                guest.photo,
                guest.hotel_name,
                guest.hotel_zone,
                guest.checked_in_at.to_rfc3339(),
                guest.is_wanted,
            ],
        )?;
        debug!(id = %guest.id, wanted = guest.is_wanted, "Inserted guest");
        Ok(())
    }

    fn insert_wanted(&self, person: &WantedPerson) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO wanted (id, full_name, photo, description, crime, posted_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                person.id,
                person.full_name,
                person.photo,
                person.description,
                person.crime,
                person.posted_at.to_rfc3339(),
            ],
        )?;
        debug!(id = %person.id, "Inserted wanted person");
        Ok(())
    }

    fn insert_notification(&self, alert: &Notification) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO notifications (id, title, message, severity, created_at, target_zone)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
            params![
                alert.id,
                alert.title,
                alert.message,
                alert.severity.to_string(),
                alert.created_at.to_rfc3339(),
                alert.target_zone,
            ],
        )?;
        debug!(id = %alert.id, zone = %alert.target_zone, "Inserted notification");
        Ok(())
    }

    /// All guests in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn guests(&self) -> Result<Vec<Guest>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, full_name, nationality, room_number, photo,
                   hotel_name, hotel_zone, checked_in_at, is_wanted
            FROM guests ORDER BY seq ASC
            ",
        )?;
        let guests = stmt
            .query_map([], Self::row_to_guest)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(guests)
    }

    /// All wanted persons in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn wanted(&self) -> Result<Vec<WantedPerson>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, full_name, photo, description, crime, posted_at
            FROM wanted ORDER BY seq ASC
            ",
        )?;
        let wanted = stmt
            .query_map([], Self::row_to_wanted)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(wanted)
    }

    /// All notifications in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn notifications(&self) -> Result<Vec<Notification>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, title, message, severity, created_at, target_zone
            FROM notifications ORDER BY seq ASC
            ",
        )?;
        let alerts = stmt
            .query_map([], Self::row_to_notification)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(alerts)
    }

    /// Full snapshot of one collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn snapshot(&self, collection: Collection) -> Result<Snapshot> {
        Ok(match collection {
            Collection::Guests => Snapshot::Guests(self.guests()?),
            Collection::Wanted => Snapshot::Wanted(self.wanted()?),
            Collection::Notifications => Snapshot::Notifications(self.notifications()?),
        })
    }

    /// Count the records in one collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self, collection: Collection) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", collection.as_str());
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count)
    }

    /// Counter that changes whenever another connection commits.
    ///
    /// # Errors
    ///
    /// Returns an error if the pragma cannot be read.
    pub fn data_version(&self) -> Result<i64> {
        let version: i64 = self
            .conn
            .query_row("PRAGMA data_version", [], |row| row.get(0))?;
        Ok(version)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let wanted_hits: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM guests WHERE is_wanted = 1", [], |row| {
                    row.get(0)
                })?;

        let newest: Option<String> = self
            .conn
            .query_row(
                "SELECT checked_in_at FROM guests ORDER BY seq DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_guests: self.count(Collection::Guests)?,
            wanted_hits,
            total_wanted: self.count(Collection::Wanted)?,
            total_notifications: self.count(Collection::Notifications)?,
            latest_check_in: newest.as_deref().map(|raw| parse_timestamp(0, raw)).transpose()?,
            db_size_bytes,
        })
    }

    fn row_to_guest(row: &rusqlite::Row) -> rusqlite::Result<Guest> {
        let checked_in_at: String = row.get(7)?;
        Ok(Guest {
            id: row.get(0)?,
            full_name: row.get(1)?,
            nationality: row.get(2)?,
            room_number: row.get(3)?,
            photo: row.get(4)?,
            hotel_name: row.get(5)?,
            hotel_zone: row.get(6)?,
            checked_in_at: parse_timestamp(7, &checked_in_at)?,
            is_wanted: row.get(8)?,
        })
    }

    fn row_to_wanted(row: &rusqlite::Row) -> rusqlite::Result<WantedPerson> {
        let posted_at: String = row.get(5)?;
        Ok(WantedPerson {
            id: row.get(0)?,
            full_name: row.get(1)?,
            photo: row.get(2)?,
            description: row.get(3)?,
            crime: row.get(4)?,
            posted_at: parse_timestamp(5, &posted_at)?,
        })
    }

    fn row_to_notification(row: &rusqlite::Row) -> rusqlite::Result<Notification> {
        let severity_str: String = row.get(3)?;
        let created_at: String = row.get(4)?;

        let severity = severity_str.parse().unwrap_or_else(|_| {
            warn!("Unknown severity: {}, defaulting to info", severity_str);
            Severity::Info
        });

        Ok(Notification {
            id: row.get(0)?,
            title: row.get(1)?,
            message: row.get(2)?,
            severity,
            created_at: parse_timestamp(4, &created_at)?,
            target_zone: row.get(5)?,
        })
    }
}

/// Parse the rfc3339 text in column `idx`. A bad value fails the row.
fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            warn!("Unparseable timestamp in column {}: {}", idx, raw);
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
        })
}

/// Statistics about the registries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Guests registered.
    pub total_guests: i64,
    /// Guests flagged as wanted at check-in.
    pub wanted_hits: i64,
    /// Wanted persons posted.
    pub total_wanted: i64,
    /// Alerts raised.
    pub total_notifications: i64,
    /// Most recent check-in.
    pub latest_check_in: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

#[derive(Debug)]
struct Shared {
    storage: Mutex<Storage>,
    feeds: Feeds,
    seen_version: AtomicI64,
}

/// [`RecordStore`] over a local database.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    shared: Arc<Shared>,
}

impl SqliteStore {
    /// Wrap an opened [`Storage`] and publish its current snapshots.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial snapshots cannot be read.
    pub fn new(storage: Storage) -> Result<Self> {
        let version = storage.data_version()?;
        let store = Self {
            shared: Arc::new(Shared {
                storage: Mutex::new(storage),
                feeds: Feeds::default(),
                seen_version: AtomicI64::new(version),
            }),
        };
        {
            let storage = store.lock()?;
            store.publish_all(&storage)?;
        }
        Ok(store)
    }

    /// Open the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(Storage::open(path)?)
    }

    /// Open a throwaway in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        Self::new(Storage::open_in_memory()?)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        self.lock()?.stats()
    }

    /// Republish every snapshot if another connection has committed since the
    /// last check. Returns whether anything was republished.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be read.
    pub fn refresh(&self) -> Result<bool> {
        let storage = self.lock()?;
        let version = storage.data_version()?;
        if self.shared.seen_version.swap(version, Ordering::SeqCst) == version {
            return Ok(false);
        }

        debug!(version, "Database changed, republishing snapshots");
        self.publish_all(&storage)?;
        Ok(true)
    }

    /// Poll for outside commits every `every` until the handle is dropped.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn_watcher(&self, every: Duration) -> WatcherHandle {
        let store = self.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(e) = store.refresh() {
                    warn!(error = %e, "Failed to poll database for changes");
                }
            }
        });
        WatcherHandle { task }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Storage>> {
        self.shared
            .storage
            .lock()
            .map_err(|_| Error::internal("storage lock poisoned"))
    }

    fn publish_all(&self, storage: &Storage) -> Result<()> {
        for collection in Collection::ALL {
            self.shared.feeds.publish(storage.snapshot(collection)?);
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn subscribe(&self, collection: Collection) -> Result<Subscription> {
        Ok(self.shared.feeds.subscribe(collection))
    }

    async fn append(&self, record: Record) -> Result<String> {
        let collection = record.collection();
        let storage = self.lock()?;
        storage
            .insert(&record)
            .map_err(|e| Error::store_write(collection.as_str(), e.to_string()))?;
        self.shared.feeds.publish(storage.snapshot(collection)?);
        Ok(record.id().to_string())
    }
}

/// Stops the database watcher when dropped.
#[derive(Debug)]
pub struct WatcherHandle {
    task: JoinHandle<()>,
}

impl WatcherHandle {
    /// Stop polling.
    pub fn stop(self) {
        drop(self);
    }

    /// Whether the watcher task is still alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{new_id, WantedForm};

    fn create_test_storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    fn guest(name: &str, zone: &str, is_wanted: bool) -> Guest {
        Guest {
            id: new_id(),
            full_name: name.to_string(),
            nationality: "Ethiopian".to_string(),
            room_number: "101".to_string(),
            photo: Some("photos/g.jpg".to_string()),
            hotel_name: "Blue Nile Hotel".to_string(),
            hotel_zone: zone.to_string(),
            checked_in_at: Utc::now(),
            is_wanted,
        }
    }

    fn wanted(name: &str) -> WantedPerson {
        WantedForm {
            full_name: name.to_string(),
            crime: "Fraud".to_string(),
            ..Default::default()
        }
        .into_record(Utc::now())
    }

    fn alert(zone: &str) -> Notification {
        Notification {
            id: new_id(),
            title: "Wanted person checked in".to_string(),
            message: "x".to_string(),
            severity: Severity::Danger,
            created_at: Utc::now(),
            target_zone: zone.to_string(),
        }
    }

    fn temp_db(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "guestwatch_test_{}_{name}.db",
            std::process::id()
        ))
    }

    fn remove_db(path: &Path) {
        let _ = std::fs::remove_file(path);
        let _ = std::fs::remove_file(path.with_extension("db-wal"));
        let _ = std::fs::remove_file(path.with_extension("db-shm"));
    }

    #[test]
    fn test_guest_round_trip() {
        let storage = create_test_storage();
        let record = guest("Abebe Kebede", "አሶሳ ዞን", true);
        storage.insert(&Record::Guest(record.clone())).unwrap();

        assert_eq!(storage.guests().unwrap(), vec![record]);
    }

    #[test]
    fn test_wanted_and_notification_round_trip() {
        let storage = create_test_storage();
        let person = wanted("Abebe Kebede");
        let note = alert("Zone A");
        storage.insert(&Record::Wanted(person.clone())).unwrap();
        storage.insert(&Record::Notification(note.clone())).unwrap();

        assert_eq!(storage.wanted().unwrap(), vec![person]);
        assert_eq!(storage.notifications().unwrap(), vec![note]);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let storage = create_test_storage();
        for name in ["First", "Second", "Third"] {
            storage
                .insert(&Record::Guest(guest(name, "Zone A", false)))
                .unwrap();
        }

        let names: Vec<String> = storage
            .guests()
            .unwrap()
            .into_iter()
            .map(|g| g.full_name)
            .collect();
        assert_eq!(names, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let storage = create_test_storage();
        let record = guest("Abebe Kebede", "Zone A", false);
        storage.insert(&Record::Guest(record.clone())).unwrap();

        assert!(storage.insert(&Record::Guest(record)).is_err());
        assert_eq!(storage.count(Collection::Guests).unwrap(), 1);
    }

    #[test]
    fn test_unknown_severity_defaults_to_info() {
        let storage = create_test_storage();
        storage
            .conn
            .execute(
                "INSERT INTO notifications (id, title, message, severity, created_at, target_zone)
                 VALUES ('n1', 't', 'm', 'urgent', '2024-01-15T10:00:00Z', 'Zone A')",
                [],
            )
            .unwrap();

        let alerts = storage.notifications().unwrap();
        assert_eq!(alerts[0].severity, Severity::Info);
    }

    #[test]
    fn test_corrupt_timestamp_fails_the_read() {
        crate::logging::init_test_logging();
        let storage = create_test_storage();
        storage
            .insert(&Record::Guest(guest("Abebe Kebede", "Zone A", false)))
            .unwrap();
        storage
            .conn
            .execute("UPDATE guests SET checked_in_at = 'not a time'", [])
            .unwrap();

        let err = storage.guests().unwrap_err();
        assert!(matches!(
            err,
            Error::DatabaseQuery(rusqlite::Error::FromSqlConversionFailure(7, Type::Text, _))
        ));
        assert!(storage.stats().is_err());
    }

    #[test]
    fn test_parse_timestamp_keeps_offset_instant() {
        let parsed = parse_timestamp(0, "2024-01-15T12:00:00+02:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-01-15T10:00:00+00:00");
        assert!(parse_timestamp(0, "").is_err());
    }

    #[test]
    fn test_stats() {
        let storage = create_test_storage();
        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_guests, 0);
        assert!(stats.latest_check_in.is_none());

        storage
            .insert(&Record::Guest(guest("A", "Zone A", true)))
            .unwrap();
        storage
            .insert(&Record::Guest(guest("B", "Zone A", false)))
            .unwrap();
        storage.insert(&Record::Wanted(wanted("A"))).unwrap();

        let stats = storage.stats().unwrap();
        assert_eq!(stats.total_guests, 2);
        assert_eq!(stats.wanted_hits, 1);
        assert_eq!(stats.total_wanted, 1);
        assert_eq!(stats.total_notifications, 0);
        assert!(stats.latest_check_in.is_some());
        assert_eq!(stats.db_size_bytes, 0);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = std::env::temp_dir().join(format!("guestwatch_test_{}", std::process::id()));
        let path = dir.join("nested").join("registry.db");
        let _ = std::fs::remove_dir_all(&dir);

        let storage = Storage::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(storage.path(), path);

        drop(storage);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_store_append_publishes_snapshot() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut sub = store.subscribe(Collection::Guests).await.unwrap();
        assert!(sub.latest().is_empty());

        let record = guest("Abebe Kebede", "Zone A", false);
        let id = store.append(Record::Guest(record.clone())).await.unwrap();
        assert_eq!(id, record.id);

        sub.changed().await.unwrap();
        assert_eq!(sub.latest(), Snapshot::Guests(vec![record]));
    }

    #[tokio::test]
    async fn test_store_write_failure_is_store_error() {
        crate::logging::init_test_logging();
        let store = SqliteStore::open_in_memory().unwrap();
        let record = guest("Abebe Kebede", "Zone A", false);
        store.append(Record::Guest(record.clone())).await.unwrap();

        let err = store.append(Record::Guest(record)).await.unwrap_err();
        assert!(matches!(
            err,
            Error::StoreWrite {
                collection: "guests",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_store_starts_with_existing_rows() {
        let storage = create_test_storage();
        storage.insert(&Record::Wanted(wanted("Abebe"))).unwrap();

        let store = SqliteStore::new(storage).unwrap();
        let mut sub = store.subscribe(Collection::Wanted).await.unwrap();
        assert_eq!(sub.latest().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_sees_other_connection() {
        let path = temp_db("refresh");
        remove_db(&path);

        let writer = SqliteStore::open(&path).unwrap();
        let reader = SqliteStore::open(&path).unwrap();
        let mut sub = reader.subscribe(Collection::Notifications).await.unwrap();
        sub.latest();

        assert!(!reader.refresh().unwrap());
        writer
            .append(Record::Notification(alert("Zone A")))
            .await
            .unwrap();

        assert!(reader.refresh().unwrap());
        sub.changed().await.unwrap();
        assert_eq!(sub.latest().len(), 1);
        assert!(!reader.refresh().unwrap());

        drop(reader);
        drop(writer);
        remove_db(&path);
    }

    #[tokio::test]
    async fn test_watcher_picks_up_outside_writes() {
        crate::logging::init_test_logging();
        let path = temp_db("watcher");
        remove_db(&path);

        let writer = SqliteStore::open(&path).unwrap();
        let reader = SqliteStore::open(&path).unwrap();
        let mut sub = reader.subscribe(Collection::Wanted).await.unwrap();
        sub.latest();

        let handle = reader.spawn_watcher(Duration::from_millis(10));
        assert!(handle.is_running());

        writer.append(Record::Wanted(wanted("Abebe"))).await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), sub.changed())
            .await
            .expect("watcher did not republish")
            .unwrap();
        assert_eq!(sub.latest().len(), 1);

        handle.stop();
        drop(reader);
        drop(writer);
        remove_db(&path);
    }
}
