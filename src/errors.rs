//! Error types for savkit
//!
//! Error codes:
//! - SAV_INVALID_ARGUMENT (REJECT) - local precondition violated before any engine call
//! - SAV_INVALID_OPERATION (REJECT) - operation not legal in the current lifecycle state
//! - SAV_ENGINE_FAILURE (ERROR) - engine primitive returned a non-benign result code
//! - SAV_IO_ERROR (ERROR) - file system failure outside the engine
//! - SAV_UNRECOGNIZED_VARIABLE (FATAL) - structural failure while loading a dictionary
//! - SAV_INTERNAL (FATAL) - internal invariant broken

use std::fmt;
use std::io;

use crate::engine::ReturnCode;

/// Severity levels for savkit errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller request rejected, nothing was changed
    Reject,
    /// Operation failed, document may be partially updated
    Error,
    /// Document cannot be used further
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavErrorCode {
    /// Argument validation failed
    InvalidArgument,
    /// Wrong lifecycle phase or access mode
    InvalidOperation,
    /// Engine reported a failure
    EngineFailure,
    /// File system failure
    Io,
    /// Unknown variable kind in an existing file
    UnrecognizedVariable,
    /// Internal invariant violated
    Internal,
}

impl SavErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            SavErrorCode::InvalidArgument => "SAV_INVALID_ARGUMENT",
            SavErrorCode::InvalidOperation => "SAV_INVALID_OPERATION",
            SavErrorCode::EngineFailure => "SAV_ENGINE_FAILURE",
            SavErrorCode::Io => "SAV_IO_ERROR",
            SavErrorCode::UnrecognizedVariable => "SAV_UNRECOGNIZED_VARIABLE",
            SavErrorCode::Internal => "SAV_INTERNAL",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            SavErrorCode::InvalidArgument | SavErrorCode::InvalidOperation => Severity::Reject,
            SavErrorCode::EngineFailure | SavErrorCode::Io => Severity::Error,
            SavErrorCode::UnrecognizedVariable | SavErrorCode::Internal => Severity::Fatal,
        }
    }
}

impl fmt::Display for SavErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error type carrying enough context to diagnose a failure without
/// looking at engine internals.
#[derive(Debug)]
pub struct SavError {
    code: SavErrorCode,
    message: String,
    details: Option<String>,
    /// Engine primitive that failed, for engine errors
    operation: Option<&'static str>,
    /// Result code returned by that primitive
    return_code: Option<ReturnCode>,
    source: Option<io::Error>,
}

impl SavError {
    fn new(code: SavErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            operation: None,
            return_code: None,
            source: None,
        }
    }

    /// Create an argument validation error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(SavErrorCode::InvalidArgument, message)
    }

    /// Create a lifecycle/mode violation error
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::new(SavErrorCode::InvalidOperation, message)
    }

    /// Create a name collision error with both names in the details
    pub fn name_conflict(old_name: &str, new_name: &str) -> Self {
        Self {
            details: Some(format!("old_name: {}, new_name: {}", old_name, new_name)),
            ..Self::new(
                SavErrorCode::InvalidArgument,
                format!("A variable named '{}' already exists", new_name),
            )
        }
    }

    /// Create an index-out-of-range error
    pub fn out_of_range(what: &str, value: usize, count: usize) -> Self {
        Self {
            details: Some(format!("value: {}, count: {}", value, count)),
            ..Self::new(
                SavErrorCode::InvalidArgument,
                format!("{} {} is out of range", what, value),
            )
        }
    }

    /// Wrap a non-benign engine result code
    pub fn engine(operation: &'static str, code: ReturnCode) -> Self {
        Self {
            operation: Some(operation),
            return_code: Some(code),
            details: Some(format!("operation: {}, result: {} ({})", operation, code.name(), code.code())),
            ..Self::new(
                SavErrorCode::EngineFailure,
                format!("Engine call '{}' failed", operation),
            )
        }
    }

    /// Create a file system error
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            source: Some(source),
            ..Self::new(SavErrorCode::Io, message)
        }
    }

    /// Create an error for a variable whose native type is not understood
    pub fn unrecognized_variable(name: &str, native_type: i32) -> Self {
        Self {
            details: Some(format!("variable: {}, native_type: {}", name, native_type)),
            ..Self::new(
                SavErrorCode::UnrecognizedVariable,
                format!("Variable '{}' has an unrecognized type", name),
            )
        }
    }

    /// Create an internal invariant error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(SavErrorCode::Internal, message)
    }

    /// Returns the error code
    pub fn code(&self) -> SavErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns the failing engine primitive, for engine errors
    pub fn operation(&self) -> Option<&'static str> {
        self.operation
    }

    /// Returns the engine result code, for engine errors
    pub fn return_code(&self) -> Option<ReturnCode> {
        self.return_code
    }

    /// Returns whether the document should be abandoned
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for SavError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for SavError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for savkit operations
pub type SavResult<T> = Result<T, SavError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(SavErrorCode::InvalidArgument.code(), "SAV_INVALID_ARGUMENT");
        assert_eq!(SavErrorCode::InvalidOperation.code(), "SAV_INVALID_OPERATION");
        assert_eq!(SavErrorCode::EngineFailure.code(), "SAV_ENGINE_FAILURE");
        assert_eq!(SavErrorCode::Io.code(), "SAV_IO_ERROR");
        assert_eq!(SavErrorCode::UnrecognizedVariable.code(), "SAV_UNRECOGNIZED_VARIABLE");
        assert_eq!(SavErrorCode::Internal.code(), "SAV_INTERNAL");
    }

    #[test]
    fn test_severity_levels() {
        assert_eq!(SavErrorCode::InvalidArgument.severity(), Severity::Reject);
        assert_eq!(SavErrorCode::InvalidOperation.severity(), Severity::Reject);
        assert_eq!(SavErrorCode::EngineFailure.severity(), Severity::Error);
        assert_eq!(SavErrorCode::UnrecognizedVariable.severity(), Severity::Fatal);
    }

    #[test]
    fn test_engine_error_carries_operation_and_code() {
        let err = SavError::engine("set_variable_name", ReturnCode::DupVar);
        assert_eq!(err.code(), SavErrorCode::EngineFailure);
        assert_eq!(err.operation(), Some("set_variable_name"));
        assert_eq!(err.return_code(), Some(ReturnCode::DupVar));

        let display = err.to_string();
        assert!(display.contains("set_variable_name"));
        assert!(display.contains("SPSS_DUP_VAR"));
        assert!(display.contains("13"));
    }

    #[test]
    fn test_name_conflict_mentions_both_names() {
        let err = SavError::name_conflict("age", "AGE2");
        let details = err.details().unwrap();
        assert!(details.contains("age"));
        assert!(details.contains("AGE2"));
        assert_eq!(err.severity(), Severity::Reject);
    }

    #[test]
    fn test_unrecognized_variable_is_fatal() {
        let err = SavError::unrecognized_variable("weird", -4);
        assert!(err.is_fatal());
        assert!(err.to_string().contains("FATAL"));
    }
}
