//! Command-line interface for guestwatch.
//!
//! This module provides the CLI structure for the `gwatch` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AlertsCommand, CheckinCommand, ConfigCommand, GuestsCommand, LoginCommand, OutputFormat,
    ProfileCommand, StatusCommand, WantedCommand, WatchCommand,
};

/// gwatch - Guest registration and wanted-person alerts
///
/// Reception desks register guests; police see the guests and alerts of
/// their zone.
#[derive(Debug, Parser)]
#[command(name = "gwatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in with one of the configured accounts
    Login(LoginCommand),

    /// End the current session
    Logout,

    /// Show who is logged in
    Whoami,

    /// Set up or show the hotel or police profile
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Register a guest check-in
    Checkin(CheckinCommand),

    /// List guests visible to the current session
    Guests(GuestsCommand),

    /// Manage the wanted registry
    #[command(subcommand)]
    Wanted(WantedCommand),

    /// List alerts visible to the current session
    Alerts(AlertsCommand),

    /// Follow guest and alert updates until interrupted
    Watch(WatchCommand),

    /// Show registry statistics
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.quiet, self.verbose)
    }
}
