//! Observability for the REST shim
//!
//! - Structured logging through `tracing` (compact or JSON)
//! - Typed lifecycle events with deterministic field ordering
//!
//! # Usage
//!
//! ```ignore
//! use orthoplus_rest::observability::{init_logging, log_event_with_fields, Event, LogFormat};
//!
//! init_logging("orthoplus_rest=info", LogFormat::Compact);
//! log_event_with_fields(Event::Serving, &[("addr", "0.0.0.0:54321")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{init_logging, render_fields, LogFormat, Logger, Severity};

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_fatal() {
        Severity::Fatal
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}
