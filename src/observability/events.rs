//! Lifecycle events
//!
//! Events are explicit and typed; each renders to a stable
//! upper-case name used as the `event` field of the log line.

use std::fmt;

/// Observable events in the REST shim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & Lifecycle
    /// Startup begins
    BootStart,
    /// Server bound and ready for requests
    Serving,
    /// Shutdown signal received
    ShutdownStart,
    /// Listener closed
    ShutdownComplete,

    // Configuration
    /// Configuration loaded
    ConfigLoaded,
    /// Table registry built
    TablesRegistered,
    /// Seed records loaded
    SeedLoaded,
    /// Seed file could not be applied (FATAL)
    SeedFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "ORTHOPLUS_STARTUP_BEGIN",
            Event::Serving => "SERVING",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::TablesRegistered => "TABLES_REGISTERED",
            Event::SeedLoaded => "SEED_LOADED",
            Event::SeedFailed => "SEED_FAILED",
        }
    }

    /// Whether this event ends the process
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::SeedFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
