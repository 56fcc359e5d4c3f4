//! `gwatch` - CLI for guestwatch
//!
//! Log in, set up a hotel or police profile, register guests and follow the
//! guests and alerts visible to the current session.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use guestwatch::cli::{
    Cli, Command, ConfigCommand, GuestsCommand, OutputFormat, ProfileCommand, WantedCommand,
    WatchCommand,
};
use guestwatch::session::{HotelProfile, PoliceProfile};
use guestwatch::{
    authenticate, init_logging, Config, Desk, Error, Guest, LocalState, Notification, SqliteStore,
    WantedPerson,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;
    let state_path = config.state_path();
    let mut state = LocalState::load(&state_path);
    debug!(path = %state_path.display(), "Loaded local state");

    match cli.command {
        Command::Login(cmd) => {
            let session = authenticate(&config.accounts, &cmd.username, &cmd.password)
                .ok_or(Error::InvalidCredentials)?;
            println!("Logged in as {} ({})", session.username, session.role);
            state.session = Some(session);
            state.save(&state_path)?;
        }
        Command::Logout => {
            if state.session.take().is_some() {
                state.save(&state_path)?;
            }
            println!("Logged out.");
        }
        Command::Whoami => match &state.session {
            Some(session) => println!("{} ({})", session.username, session.role),
            None => println!("Not logged in."),
        },
        Command::Profile(cmd) => handle_profile(&mut state, &state_path, cmd)?,
        Command::Checkin(cmd) => {
            let mut desk = open_desk(&config).await?;
            let outcome = desk.check_in(&state, cmd.to_form()).await?;
            if cmd.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&outcome.guest)?);
            } else {
                println!(
                    "Checked in {} to room {} ({})",
                    outcome.guest.full_name, outcome.guest.room_number, outcome.guest.id
                );
            }
            if let Some(alert) = outcome.alert {
                eprintln!("WANTED: {} [{}]", alert.message, alert.target_zone);
            }
        }
        Command::Guests(cmd) => handle_guests(&config, &state, &cmd).await?,
        Command::Wanted(cmd) => handle_wanted(&config, &state, cmd).await?,
        Command::Alerts(cmd) => {
            state.require_session()?;
            let desk = open_desk(&config).await?;
            print_alerts(&desk.alerts(&state.viewer()), cmd.format)?;
        }
        Command::Watch(cmd) => handle_watch(&config, &state, &cmd).await?,
        Command::Status(cmd) => {
            let store = SqliteStore::open(config.database_path())?;
            let stats = store.stats()?;
            if cmd.json {
                let status = serde_json::json!({
                    "database_path": config.database_path(),
                    "guests": stats.total_guests,
                    "wanted_hits": stats.wanted_hits,
                    "wanted": stats.total_wanted,
                    "notifications": stats.total_notifications,
                    "latest_check_in": stats.latest_check_in,
                    "db_size_bytes": stats.db_size_bytes,
                });
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("gwatch status");
                println!("-------------");
                println!("Database:        {}", config.database_path().display());
                println!("Guests:          {}", stats.total_guests);
                println!("Wanted hits:     {}", stats.wanted_hits);
                println!("Wanted persons:  {}", stats.total_wanted);
                println!("Alerts:          {}", stats.total_notifications);
                if let Some(latest) = stats.latest_check_in {
                    println!("Latest check-in: {}", latest.format("%Y-%m-%d %H:%M"));
                }
                println!("Size:            {} bytes", stats.db_size_bytes);
            }
        }
        Command::Config(cmd) => handle_config(&config, cmd)?,
    }

    Ok(())
}

async fn open_desk(config: &Config) -> guestwatch::Result<Desk<SqliteStore>> {
    let store = SqliteStore::open(config.database_path())?;
    Desk::connect(store, config.alerts.clone()).await
}

fn handle_profile(
    state: &mut LocalState,
    state_path: &std::path::Path,
    cmd: ProfileCommand,
) -> anyhow::Result<()> {
    match cmd {
        ProfileCommand::Hotel { name, zone } => {
            let profile = HotelProfile::new(&name, &zone)?;
            println!("Hotel profile set: {} ({})", profile.name, profile.zone);
            state.hotel = Some(profile);
            state.save(state_path)?;
        }
        ProfileCommand::Police { zone } => {
            let profile = PoliceProfile::new(&zone)?;
            println!("Police profile set: {}", profile.zone);
            state.police = Some(profile);
            state.save(state_path)?;
        }
        ProfileCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(state)?);
            } else {
                match &state.session {
                    Some(s) => println!("Session: {} ({})", s.username, s.role),
                    None => println!("Session: none"),
                }
                match &state.hotel {
                    Some(h) => println!("Hotel:   {} ({})", h.name, h.zone),
                    None => println!("Hotel:   not set"),
                }
                match &state.police {
                    Some(p) => println!("Police:  {}", p.zone),
                    None => println!("Police:  not set"),
                }
            }
        }
    }
    Ok(())
}

async fn handle_guests(
    config: &Config,
    state: &LocalState,
    cmd: &GuestsCommand,
) -> anyhow::Result<()> {
    state.require_session()?;
    let desk = open_desk(config).await?;
    print_guests(&desk.guests(&state.viewer(), &cmd.search), cmd.format)
}

async fn handle_wanted(
    config: &Config,
    state: &LocalState,
    cmd: WantedCommand,
) -> anyhow::Result<()> {
    let mut desk = open_desk(config).await?;
    if let Some(form) = cmd.to_form() {
        let person = desk.post_wanted(state, form).await?;
        println!("Posted wanted person {} ({})", person.full_name, person.id);
        return Ok(());
    }

    state.require_session()?;
    let format = match cmd {
        WantedCommand::List { format } => format,
        WantedCommand::Add { .. } => OutputFormat::Plain,
    };
    print_wanted(desk.wanted(), format)
}

async fn handle_watch(
    config: &Config,
    state: &LocalState,
    cmd: &WatchCommand,
) -> anyhow::Result<()> {
    state.require_session()?;
    let store = SqliteStore::open(config.database_path())?;
    let _watcher = store.spawn_watcher(config.poll_interval());
    let mut desk = Desk::connect(store, config.alerts.clone()).await?;
    let viewer = state.viewer();

    let mut seen_guests = desk.guests(&viewer, &cmd.search).len();
    let mut seen_alerts = desk.alerts(&viewer).len();
    println!("Watching {seen_guests} guests and {seen_alerts} alerts. Press Ctrl-C to stop.");

    loop {
        tokio::select! {
            changed = desk.changed() => {
                changed?;
                let guests = desk.guests(&viewer, &cmd.search);
                for guest in guests.iter().take(guests.len().saturating_sub(seen_guests)).rev() {
                    println!("{}", guest_line(guest));
                }
                seen_guests = guests.len();

                let alerts = desk.alerts(&viewer);
                for alert in alerts.iter().take(alerts.len().saturating_sub(seen_alerts)).rev() {
                    println!("{}", alert_line(alert));
                }
                seen_alerts = alerts.len();
            }
            _ = tokio::signal::ctrl_c() => {
                println!("Stopped.");
                return Ok(());
            }
        }
    }
}

fn guest_line(guest: &Guest) -> String {
    format!(
        "{} {:<24} room {:<6} {} ({}){}",
        guest.checked_in_at.format("%Y-%m-%d %H:%M"),
        guest.full_name,
        guest.room_number,
        guest.hotel_name,
        guest.hotel_zone,
        if guest.is_wanted { "  [WANTED]" } else { "" }
    )
}

fn alert_line(alert: &Notification) -> String {
    format!(
        "{} [{}] {}: {} ({})",
        alert.created_at.format("%Y-%m-%d %H:%M"),
        alert.severity,
        alert.title,
        alert.message,
        alert.target_zone
    )
}

fn print_guests(guests: &[&Guest], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(guests)?),
        OutputFormat::Plain => {
            for guest in guests {
                println!("{}", guest_line(guest));
            }
        }
        OutputFormat::Table => {
            println!(
                "{:<17} {:<24} {:<14} {:<6} {:<20} {:<16} {}",
                "CHECKED IN", "NAME", "NATIONALITY", "ROOM", "HOTEL", "ZONE", "WANTED"
            );
            for g in guests {
                println!(
                    "{:<17} {:<24} {:<14} {:<6} {:<20} {:<16} {}",
                    g.checked_in_at.format("%Y-%m-%d %H:%M"),
                    g.full_name,
                    g.nationality,
                    g.room_number,
                    g.hotel_name,
                    g.hotel_zone,
                    if g.is_wanted { "yes" } else { "" }
                );
            }
            println!("{} guest(s)", guests.len());
        }
    }
    Ok(())
}

fn print_wanted(wanted: &[WantedPerson], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(wanted)?),
        OutputFormat::Plain => {
            for w in wanted {
                println!("{}: {} {}", w.full_name, w.crime, w.description);
            }
        }
        OutputFormat::Table => {
            println!("{:<17} {:<24} {:<20} {}", "POSTED", "NAME", "CRIME", "DESCRIPTION");
            for w in wanted {
                println!(
                    "{:<17} {:<24} {:<20} {}",
                    w.posted_at.format("%Y-%m-%d %H:%M"),
                    w.full_name,
                    w.crime,
                    w.description
                );
            }
        }
    }
    Ok(())
}

fn print_alerts(alerts: &[&Notification], format: OutputFormat) -> anyhow::Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(alerts)?);
        return Ok(());
    }
    if alerts.is_empty() {
        println!("No alerts.");
    }
    for alert in alerts {
        println!("{}", alert_line(alert));
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Poll interval (ms): {}", config.storage.poll_interval_ms);
                println!();
                println!("[Session]");
                println!("  State path:         {}", config.state_path().display());
                println!();
                println!("[Alerts]");
                println!("  Title:              {}", config.alerts.title);
                println!("  Message:            {}", config.alerts.message_template);
                println!();
                println!("[Accounts]");
                for account in &config.accounts {
                    println!("  {:<18}  {}", account.username, account.role);
                }
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
