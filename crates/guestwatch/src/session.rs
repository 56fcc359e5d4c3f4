//! Sessions, roles and the locally persisted profile.
//!
//! Login is a lookup in a static credential table. The resulting session and
//! the hotel or police profile live in one JSON file that is loaded when a
//! command starts and saved when it changes. A missing or unreadable file
//! loads as empty defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::records::required;
use crate::visibility::Viewer;

/// What an account is allowed to do and see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Hotel reception: registers guests, sees its own hotel's guests.
    Reception,
    /// Zone police: sees guests and alerts for its zone.
    LocalPolice,
    /// Regional police: sees everything.
    SuperPolice,
}

impl Role {
    /// Whether this role belongs to a police account.
    #[must_use]
    pub fn is_police(self) -> bool {
        matches!(self, Self::LocalPolice | Self::SuperPolice)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reception => write!(f, "reception"),
            Self::LocalPolice => write!(f, "local_police"),
            Self::SuperPolice => write!(f, "super_police"),
        }
    }
}

/// One row of the credential table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Login name.
    pub username: String,
    /// Login password, compared verbatim.
    pub password: String,
    /// Role granted on login.
    pub role: Role,
}

impl Account {
    fn new(username: &str, password: &str, role: Role) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            role,
        }
    }
}

/// The three built-in accounts, one per role.
#[must_use]
pub fn default_accounts() -> Vec<Account> {
    vec![
        Account::new("reception", "reception", Role::Reception),
        Account::new("police", "police", Role::LocalPolice),
        Account::new("admin", "admin", Role::SuperPolice),
    ]
}

/// A logged-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Login name.
    pub username: String,
    /// Granted role.
    pub role: Role,
}

/// Look up `username`/`password` in the credential table.
#[must_use]
pub fn authenticate(accounts: &[Account], username: &str, password: &str) -> Option<Session> {
    accounts
        .iter()
        .find(|a| a.username == username && a.password == password)
        .map(|a| Session {
            username: a.username.clone(),
            role: a.role,
        })
}

/// The hotel a reception account works for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotelProfile {
    /// Hotel name, stamped on every guest it registers.
    pub name: String,
    /// Zone the hotel is in.
    pub zone: String,
}

impl HotelProfile {
    /// Build a profile from user input, trimming both fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if the name or zone is blank.
    pub fn new(name: &str, zone: &str) -> Result<Self> {
        Ok(Self {
            name: required("hotel name", name)?,
            zone: required("zone", zone)?,
        })
    }

    fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.zone.trim().is_empty()
    }
}

/// The zone a police account is assigned to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoliceProfile {
    /// Assigned zone.
    pub zone: String,
}

impl PoliceProfile {
    /// Build a profile from user input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if the zone is blank.
    pub fn new(zone: &str) -> Result<Self> {
        Ok(Self {
            zone: required("zone", zone)?,
        })
    }
}

/// Everything kept on disk between commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalState {
    /// Current login, if any.
    pub session: Option<Session>,
    /// Hotel profile, set up once by reception.
    pub hotel: Option<HotelProfile>,
    /// Police profile, set up once by police.
    pub police: Option<PoliceProfile>,
}

impl LocalState {
    /// Load state from `path`.
    ///
    /// Never fails: a missing file or bad JSON yields the empty default.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("No local state at {}, using defaults", path.display());
                return Self::default();
            }
            Err(e) => {
                warn!(error = %e, "Cannot read local state at {}, using defaults", path.display());
                return Self::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "Malformed local state at {}, using defaults", path.display());
            Self::default()
        })
    }

    /// Write state to `path`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!("Saved local state to {}", path.display());
        Ok(())
    }

    /// Role of the current session.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.session.as_ref().map(|s| s.role)
    }

    /// The current session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotLoggedIn`] if nobody is logged in.
    pub fn require_session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(Error::NotLoggedIn)
    }

    /// Visibility scope for the current session.
    ///
    /// Local police and reception without a usable profile get
    /// [`Viewer::Unassigned`].
    #[must_use]
    pub fn viewer(&self) -> Viewer {
        match self.role() {
            Some(Role::LocalPolice) => match &self.police {
                Some(p) if !p.zone.trim().is_empty() => Viewer::Police {
                    zone: p.zone.clone(),
                },
                _ => Viewer::Unassigned,
            },
            Some(Role::Reception) => match &self.hotel {
                Some(h) if !h.name.trim().is_empty() => Viewer::Reception {
                    hotel: h.name.clone(),
                },
                _ => Viewer::Unassigned,
            },
            Some(Role::SuperPolice) | None => Viewer::Unscoped,
        }
    }

    /// Hotel profile of a reception session, for guest check-in.
    ///
    /// # Errors
    ///
    /// Fails if nobody is logged in, the role is not reception, or no
    /// complete hotel profile has been set up.
    pub fn check_in_desk(&self) -> Result<&HotelProfile> {
        let session = self.require_session()?;
        if session.role != Role::Reception {
            return Err(Error::not_permitted("guest check-in", Some(session.role)));
        }
        self.hotel
            .as_ref()
            .filter(|h| h.is_complete())
            .ok_or(Error::ProfileMissing { kind: "hotel" })
    }

    /// Check that the current session may post wanted persons.
    ///
    /// # Errors
    ///
    /// Fails unless a police account is logged in.
    pub fn require_police(&self) -> Result<&Session> {
        let session = self.require_session()?;
        if !session.role.is_police() {
            return Err(Error::not_permitted("posting wanted persons", Some(session.role)));
        }
        Ok(session)
    }
}
