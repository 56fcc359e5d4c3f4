//! Logging setup for guestwatch.
//!
//! Diagnostics go through `tracing` and are written to stderr, keeping
//! stdout for command output that may be piped as JSON. The `gwatch`
//! binary sizes the filter from its `-q`/`-v` flags.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How much diagnostic output `gwatch` writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Warnings and errors, such as a wanted hit or a failed alert write.
    #[default]
    Normal,
    /// Check-ins, postings and registry updates as they happen.
    Verbose,
    /// Everything, including the store watcher's polling.
    Trace,
}

impl Verbosity {
    /// Pick a level from the `-q` flag and the number of `-v` flags.
    ///
    /// `-q` wins over any number of `-v`.
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    /// Convert verbosity to tracing level filter.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Filter directive used when `RUST_LOG` is unset.
    ///
    /// Only this crate's events pass; dependencies such as `rusqlite` stay
    /// silent.
    #[must_use]
    pub fn directive(&self) -> String {
        format!("guestwatch={}", self.to_level_filter())
    }
}

/// Install the stderr subscriber.
///
/// Call once at startup. `RUST_LOG` takes precedence over `verbosity`.
/// Later calls are ignored.
///
/// # Examples
///
/// ```no_run
/// use guestwatch::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::from_flags(false, 1));
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

/// Route this crate's warnings to the test harness output.
#[cfg(test)]
pub(crate) fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(Verbosity::Normal.directive())
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags() {
        assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, 2), Verbosity::Trace);
        assert_eq!(Verbosity::from_flags(false, 9), Verbosity::Trace);
        assert_eq!(Verbosity::from_flags(true, 2), Verbosity::Quiet);
    }

    #[test]
    fn test_normal_shows_warnings() {
        assert_eq!(Verbosity::default(), Verbosity::Normal);
        assert_eq!(Verbosity::Normal.to_level_filter(), Level::WARN);
        assert_eq!(Verbosity::Quiet.to_level_filter(), Level::ERROR);
    }

    #[test]
    fn test_directive_scopes_to_crate() {
        assert_eq!(Verbosity::Verbose.directive(), "guestwatch=DEBUG");
        assert_eq!(Verbosity::Trace.directive(), "guestwatch=TRACE");
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging(Verbosity::Quiet);
        init_logging(Verbosity::Trace);
    }
}
