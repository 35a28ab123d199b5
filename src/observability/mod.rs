//! Observability subsystem for savkit
//!
//! Structured JSON logging of typed lifecycle events.
//!
//! # Principles
//!
//! 1. Observability is read-only: logging never changes an outcome
//! 2. No async or background threads
//! 3. Deterministic output: fixed key order
//!
//! # Usage
//!
//! ```ignore
//! use savkit::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::DocumentOpen, &[("path", "survey.sav"), ("mode", "read")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        // Only verifies no panic
        log_event(Event::EngineInit);
        log_event(Event::RecordCorruption);
    }

    #[test]
    fn test_log_event_with_fields() {
        log_event_with_fields(Event::DocumentOpen, &[("path", "/tmp/x.sav"), ("mode", "read")]);
    }
}
