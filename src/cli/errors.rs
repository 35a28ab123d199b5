//! CLI-specific error types

use std::fmt;
use std::io;

use crate::errors::SavError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// The document layer refused an operation
    DocumentError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "SAVKIT_CLI_CONFIG_ERROR",
            Self::IoError => "SAVKIT_CLI_IO_ERROR",
            Self::DocumentError => "SAVKIT_CLI_DOCUMENT_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
    /// Library error code behind a document error
    cause: Option<&'static str>,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            cause: None,
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Library error code, for errors raised by the document layer
    pub fn cause(&self) -> Option<&'static str> {
        self.cause
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cause {
            Some(cause) => write!(f, "{} ({}): {}", self.code.code(), cause, self.message),
            None => write!(f, "{}: {}", self.code.code(), self.message),
        }
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<SavError> for CliError {
    fn from(e: SavError) -> Self {
        Self {
            cause: Some(e.code().code()),
            ..Self::new(CliErrorCode::DocumentError, e.to_string())
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
