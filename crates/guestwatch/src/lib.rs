//! `guestwatch` - Hotel guest registration with wanted-person alerts
//!
//! Reception desks register guest check-ins; every new guest's name is
//! checked against the wanted registry and a hit raises an alert for the
//! police of the hotel's zone. Police accounts see the guests and alerts of
//! their own zone.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod desk;
pub mod error;
pub mod logging;
pub mod matching;
pub mod records;
pub mod session;
pub mod store;
pub mod visibility;

pub use config::Config;
pub use desk::Desk;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use matching::{assess, is_wanted, Assessment};
pub use records::{Guest, GuestForm, Notification, Severity, WantedForm, WantedPerson};
pub use session::{authenticate, LocalState, Role, Session};
pub use store::{MemoryStore, RecordStore, SqliteStore};
pub use visibility::{visible_alerts, visible_guests, Viewer};
