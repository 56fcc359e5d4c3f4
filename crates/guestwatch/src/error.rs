//! Error types for guestwatch.
//!
//! Every fallible operation in the crate returns [`Error`]. Nothing here is
//! fatal to the process: validation and permission failures are fixed by the
//! user resubmitting, store failures by retrying the write.

use std::path::PathBuf;
use thiserror::Error;

use crate::session::Role;

/// The main error type for guestwatch operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    /// Appending a record to the external store failed.
    #[error("failed to save {collection} record: {message}")]
    StoreWrite {
        /// Collection the record was meant for.
        collection: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// The store dropped a subscription.
    #[error("subscription to {collection} closed")]
    SubscriptionClosed {
        /// Collection whose feed ended.
        collection: &'static str,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Submission Errors ===
    /// A required form field was left empty.
    #[error("{field} is required")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// The acting session may not perform this action.
    #[error("{action} is not permitted for {role}")]
    NotPermitted {
        /// What was attempted.
        action: &'static str,
        /// Role of the acting session, if any.
        role: String,
    },

    /// No one is logged in.
    #[error("not logged in")]
    NotLoggedIn,

    /// Username and password did not match any account.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The session has no profile of the required kind.
    #[error("no {kind} profile has been set up; run `gwatch profile {kind}` first")]
    ProfileMissing {
        /// Which profile was expected ("hotel" or "police").
        kind: &'static str,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for guestwatch operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a store write error for the given collection.
    #[must_use]
    pub fn store_write(collection: &'static str, message: impl Into<String>) -> Self {
        Self::StoreWrite {
            collection,
            message: message.into(),
        }
    }

    /// Create a permission error for an action attempted by `role`.
    #[must_use]
    pub fn not_permitted(action: &'static str, role: Option<Role>) -> Self {
        Self::NotPermitted {
            action,
            role: role.map_or_else(|| "anonymous sessions".to_string(), |r| r.to_string()),
        }
    }

    /// Check if this error is a form validation failure.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::MissingField { .. })
    }

    /// Check if this error came from writing to the store.
    #[must_use]
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            Self::StoreWrite { .. } | Self::DatabaseQuery(_) | Self::SubscriptionClosed { .. }
        )
    }

    /// Check if this error is an access problem rather than bad input.
    #[must_use]
    pub fn is_permission_error(&self) -> bool {
        matches!(
            self,
            Self::NotPermitted { .. } | Self::NotLoggedIn | Self::InvalidCredentials
        )
    }
}
