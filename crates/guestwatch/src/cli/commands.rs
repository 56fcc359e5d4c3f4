//! CLI command definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::records::{GuestForm, WantedForm};

/// Login arguments.
#[derive(Debug, Args)]
pub struct LoginCommand {
    /// Account name
    pub username: String,

    /// Account password
    #[arg(short, long)]
    pub password: String,
}

/// Profile setup commands.
#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Set the hotel this reception desk works for
    Hotel {
        /// Hotel name
        #[arg(short, long)]
        name: String,

        /// Zone the hotel is in
        #[arg(short, long)]
        zone: String,
    },

    /// Set the zone this police account is assigned to
    Police {
        /// Assigned zone
        #[arg(short, long)]
        zone: String,
    },

    /// Show the stored session and profiles
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Guest check-in arguments.
#[derive(Debug, Args)]
pub struct CheckinCommand {
    /// Guest's full name
    pub full_name: String,

    /// Guest's nationality
    #[arg(short, long)]
    pub nationality: String,

    /// Assigned room number
    #[arg(short, long)]
    pub room: String,

    /// Reference to the guest's photo
    #[arg(long)]
    pub photo: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

impl CheckinCommand {
    /// The submission this command describes.
    #[must_use]
    pub fn to_form(&self) -> GuestForm {
        GuestForm {
            full_name: self.full_name.clone(),
            nationality: self.nationality.clone(),
            room_number: self.room.clone(),
            photo: self.photo.clone(),
        }
    }
}

/// Guest listing arguments.
#[derive(Debug, Args)]
pub struct GuestsCommand {
    /// Only show guests whose name contains this text
    #[arg(short, long, default_value = "")]
    pub search: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Wanted registry commands.
#[derive(Debug, Subcommand)]
pub enum WantedCommand {
    /// Post a wanted person (police only)
    Add {
        /// Full name to match guests against
        full_name: String,

        /// Crime the person is wanted for
        #[arg(long)]
        crime: String,

        /// Free-text description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Reference to a photo
        #[arg(long)]
        photo: Option<String>,
    },

    /// List the wanted registry
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
}

impl WantedCommand {
    /// The submission an `add` command describes.
    #[must_use]
    pub fn to_form(&self) -> Option<WantedForm> {
        match self {
            Self::Add {
                full_name,
                crime,
                description,
                photo,
            } => Some(WantedForm {
                full_name: full_name.clone(),
                crime: crime.clone(),
                description: description.clone(),
                photo: photo.clone(),
            }),
            Self::List { .. } => None,
        }
    }
}

/// Alert listing arguments.
#[derive(Debug, Args)]
pub struct AlertsCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Watch arguments.
#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Only show guests whose name contains this text
    #[arg(short, long, default_value = "")]
    pub search: String,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}
