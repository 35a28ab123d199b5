//! Observable events for savkit
//!
//! Events are explicit and typed. Each carries the severity it is logged
//! at, so the process-wide threshold decides what reaches stderr.

use std::fmt;

use super::logger::Severity;

/// Observable events in savkit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Engine
    /// Process-wide engine binding created
    EngineInit,
    /// An engine primitive returned a non-benign code
    EngineFailure,
    /// A file failed checksum or structure validation on load
    RecordCorruption,

    // Document lifecycle
    /// Existing file opened for reading or appending
    DocumentOpen,
    /// New file created in authoring state
    DocumentCreate,
    /// Dictionary committed, schema frozen
    DictionaryCommit,
    /// One case written
    CaseCommit,
    /// Document closed and engine handle released
    DocumentClose,
    /// A handle was closed by its guard instead of an explicit close
    HandleLeakClosed,
    /// A date variable's stored missing range was not loaded
    MissingRangeDropped,

    // Import
    /// Table import finished
    ImportComplete,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::EngineInit => "ENGINE_INIT",
            Event::EngineFailure => "ENGINE_FAILURE",
            Event::RecordCorruption => "RECORD_CORRUPTION",
            Event::DocumentOpen => "DOCUMENT_OPEN",
            Event::DocumentCreate => "DOCUMENT_CREATE",
            Event::DictionaryCommit => "DICTIONARY_COMMIT",
            Event::CaseCommit => "CASE_COMMIT",
            Event::DocumentClose => "DOCUMENT_CLOSE",
            Event::HandleLeakClosed => "HANDLE_LEAK_CLOSED",
            Event::MissingRangeDropped => "MISSING_RANGE_DROPPED",
            Event::ImportComplete => "IMPORT_COMPLETE",
        }
    }

    /// Severity this event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::CaseCommit => Severity::Trace,
            Event::EngineInit
            | Event::DocumentOpen
            | Event::DocumentCreate
            | Event::DictionaryCommit
            | Event::DocumentClose
            | Event::ImportComplete => Severity::Info,
            Event::EngineFailure | Event::HandleLeakClosed | Event::MissingRangeDropped => Severity::Warn,
            Event::RecordCorruption => Severity::Error,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
