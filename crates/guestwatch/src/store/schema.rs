//! `SQLite` schema for the registries.
//!
//! Each table carries an autoincrement `seq` so snapshots can be read back in
//! insertion order; `id` is the generated record identifier.

/// SQL statement to create the guests table.
pub const CREATE_GUESTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS guests (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    full_name TEXT NOT NULL,
    nationality TEXT NOT NULL,
    room_number TEXT NOT NULL,
    photo TEXT,
    hotel_name TEXT NOT NULL,
    hotel_zone TEXT NOT NULL,
    checked_in_at TEXT NOT NULL,
    is_wanted INTEGER NOT NULL
)
";

/// SQL statement to create the wanted persons table.
pub const CREATE_WANTED_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS wanted (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    full_name TEXT NOT NULL,
    photo TEXT,
    description TEXT NOT NULL,
    crime TEXT NOT NULL,
    posted_at TEXT NOT NULL
)
";

/// SQL statement to create the notifications table.
pub const CREATE_NOTIFICATIONS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS notifications (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    message TEXT NOT NULL,
    severity TEXT NOT NULL,
    created_at TEXT NOT NULL,
    target_zone TEXT NOT NULL
)
";

/// Index for zone-scoped guest lookups.
pub const CREATE_GUEST_ZONE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_guests_zone ON guests(hotel_zone)
";

/// Index for zone-scoped alert lookups.
pub const CREATE_NOTIFICATION_ZONE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_notifications_zone ON notifications(target_zone)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_GUESTS_TABLE,
    CREATE_WANTED_TABLE,
    CREATE_NOTIFICATIONS_TABLE,
    CREATE_GUEST_ZONE_INDEX,
    CREATE_NOTIFICATION_ZONE_INDEX,
    CREATE_METADATA_TABLE,
];
