//! Record decoding errors for the reference file engine.
//!
//! These never leave the engine: [`RecordError::return_code`] maps each one
//! onto the engine's result code set.

use thiserror::Error;

use crate::engine::ReturnCode;

/// Result type for record-level operations
pub type RecordResult<T> = Result<T, RecordError>;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dictionary encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Truncated frame at byte {offset}: {reason}")]
    Truncated { offset: u64, reason: String },

    #[error("Checksum mismatch in frame at byte {offset}")]
    ChecksumMismatch { offset: u64 },

    #[error("Unexpected frame kind {kind} at byte {offset}")]
    UnexpectedKind { offset: u64, kind: u8 },

    #[error("Bad file header: {0}")]
    BadHeader(String),

    #[error("Case record has {found} cells, dictionary has {expected} variables")]
    CellCount { expected: usize, found: usize },
}

impl RecordError {
    /// Engine result code reported for this failure when reading
    pub fn return_code(&self) -> ReturnCode {
        match self {
            RecordError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => ReturnCode::FileOpenError,
            RecordError::Io(_) => ReturnCode::FileReadError,
            _ => ReturnCode::InvalidFile,
        }
    }

    /// Whether the bytes on disk are damaged, as opposed to unreadable
    pub fn is_corruption(&self) -> bool {
        !matches!(self, RecordError::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_maps_to_open_error() {
        let err = RecordError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.return_code(), ReturnCode::FileOpenError);
        assert!(!err.is_corruption());
    }

    #[test]
    fn test_damage_maps_to_invalid_file() {
        let err = RecordError::ChecksumMismatch { offset: 12 };
        assert_eq!(err.return_code(), ReturnCode::InvalidFile);
        assert!(err.is_corruption());
        assert!(err.to_string().contains("12"));
    }
}
