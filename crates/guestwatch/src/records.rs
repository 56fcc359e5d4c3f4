//! Record types kept in the three registries.
//!
//! Records are append-only: once written they are never updated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Generate a fresh record identifier.
#[must_use]
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// A guest check-in, stamped with the submitting hotel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    /// Generated identifier.
    pub id: String,
    /// Guest's full name as entered at reception.
    pub full_name: String,
    /// Nationality.
    pub nationality: String,
    /// Room the guest was assigned.
    pub room_number: String,
    /// Reference to the guest's photo, if one was taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    /// Name of the hotel that registered the guest.
    pub hotel_name: String,
    /// Zone of the hotel that registered the guest.
    pub hotel_zone: String,
    /// When the guest checked in.
    pub checked_in_at: DateTime<Utc>,
    /// Whether the name matched the wanted registry at check-in time.
    ///
    /// Never recomputed afterwards.
    pub is_wanted: bool,
}

/// A person on the wanted registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WantedPerson {
    /// Generated identifier.
    pub id: String,
    /// Full name used for matching.
    pub full_name: String,
    /// Reference to a photo, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Crime the person is wanted for.
    pub crime: String,
    /// When the record was posted.
    pub posted_at: DateTime<Utc>,
}

/// How urgent a notification is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// A wanted hit.
    Danger,
    /// Informational.
    Info,
    /// Something completed.
    Success,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Danger => write!(f, "danger"),
            Self::Info => write!(f, "info"),
            Self::Success => write!(f, "success"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "danger" => Ok(Self::Danger),
            "info" => Ok(Self::Info),
            "success" => Ok(Self::Success),
            other => Err(Error::internal(format!("unknown severity: {other}"))),
        }
    }
}

/// An alert raised for the police of one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Generated identifier.
    pub id: String,
    /// Short headline.
    pub title: String,
    /// Free-text body.
    pub message: String,
    /// Severity tag.
    pub severity: Severity,
    /// When the alert was raised.
    pub created_at: DateTime<Utc>,
    /// Zone whose police should see it.
    pub target_zone: String,
}

/// An unsaved guest submission from reception.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestForm {
    /// Guest's full name.
    pub full_name: String,
    /// Nationality.
    pub nationality: String,
    /// Room number.
    pub room_number: String,
    /// Optional photo reference.
    pub photo: Option<String>,
}

impl GuestForm {
    /// Trim every field and check the required ones are present.
    ///
    /// A blank photo reference becomes `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] naming the first empty required field.
    pub fn validate(self) -> Result<Self> {
        let form = Self {
            full_name: required("full name", &self.full_name)?,
            nationality: required("nationality", &self.nationality)?,
            room_number: required("room number", &self.room_number)?,
            photo: optional(self.photo),
        };
        Ok(form)
    }
}

/// An unsaved wanted-person posting from a police account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WantedForm {
    /// Full name used for matching.
    pub full_name: String,
    /// Crime the person is wanted for.
    pub crime: String,
    /// Free-text description.
    pub description: String,
    /// Optional photo reference.
    pub photo: Option<String>,
}

impl WantedForm {
    /// Trim every field and check the required ones are present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] naming the first empty required field.
    pub fn validate(self) -> Result<Self> {
        Ok(Self {
            full_name: required("full name", &self.full_name)?,
            crime: required("crime", &self.crime)?,
            description: self.description.trim().to_string(),
            photo: optional(self.photo),
        })
    }

    /// Turn a validated form into a registry record.
    #[must_use]
    pub fn into_record(self, posted_at: DateTime<Utc>) -> WantedPerson {
        WantedPerson {
            id: new_id(),
            full_name: self.full_name,
            photo: self.photo,
            description: self.description,
            crime: self.crime,
            posted_at,
        }
    }
}

pub(crate) fn required(field: &'static str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::MissingField { field });
    }
    Ok(value.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
