//! The engine binding contract.
//!
//! One method per engine primitive. Every method reports failure as a
//! `ReturnCode`; warnings come back as `Err` too, so the caller decides
//! which codes are benign at each call site.

use std::path::Path;

use super::codes::ReturnCode;
use super::convert;
use super::types::{Alignment, FileHandle, FormatSpec, MeasurementLevel, VarHandle, SYSTEM_MISSING};

/// Result of one engine primitive
pub type EngineResult<T> = Result<T, ReturnCode>;

/// Primitive operations over record-oriented statistical data files.
///
/// Implementations must be usable from any thread; callers serialize
/// access to any single file handle.
pub trait Engine: Send + Sync {
    // File lifecycle
    fn open_read(&self, path: &Path) -> EngineResult<FileHandle>;
    fn open_write(&self, path: &Path) -> EngineResult<FileHandle>;
    fn open_append(&self, path: &Path) -> EngineResult<FileHandle>;
    fn close(&self, file: FileHandle) -> EngineResult<()>;
    fn set_compression(&self, file: FileHandle, compressed: bool) -> EngineResult<()>;
    fn compression(&self, file: FileHandle) -> EngineResult<bool>;
    /// Freezes the dictionary and writes it out
    fn commit_header(&self, file: FileHandle) -> EngineResult<()>;

    // Cases
    /// Persists the current case buffer as a new row and clears the buffer
    fn commit_case_record(&self, file: FileHandle) -> EngineResult<()>;
    fn seek_case(&self, file: FileHandle, case_number: usize) -> EngineResult<()>;
    /// Loads the sought case into the buffer and advances to the next one
    fn read_case_record(&self, file: FileHandle) -> EngineResult<()>;
    fn case_count(&self, file: FileHandle) -> EngineResult<usize>;

    // Dictionary
    fn variable_count(&self, file: FileHandle) -> EngineResult<usize>;
    /// Names and native type codes in dictionary order
    fn variable_names(&self, file: FileHandle) -> EngineResult<Vec<(String, i32)>>;
    fn variable_handle(&self, file: FileHandle, name: &str) -> EngineResult<VarHandle>;
    /// Creates a variable: native type 0 is numeric, 1..=32767 a string of that length
    fn set_variable_name(&self, file: FileHandle, name: &str, native_type: i32) -> EngineResult<()>;
    fn variable_label(&self, file: FileHandle, name: &str) -> EngineResult<String>;
    fn set_variable_label(&self, file: FileHandle, name: &str, label: &str) -> EngineResult<()>;
    fn column_width(&self, file: FileHandle, name: &str) -> EngineResult<u32>;
    fn set_column_width(&self, file: FileHandle, name: &str, width: u32) -> EngineResult<()>;
    fn measurement_level(&self, file: FileHandle, name: &str) -> EngineResult<MeasurementLevel>;
    fn set_measurement_level(
        &self,
        file: FileHandle,
        name: &str,
        level: MeasurementLevel,
    ) -> EngineResult<()>;
    fn alignment(&self, file: FileHandle, name: &str) -> EngineResult<Alignment>;
    fn set_alignment(&self, file: FileHandle, name: &str, alignment: Alignment) -> EngineResult<()>;
    fn print_format(&self, file: FileHandle, name: &str) -> EngineResult<FormatSpec>;
    fn set_print_format(&self, file: FileHandle, name: &str, format: FormatSpec) -> EngineResult<()>;
    fn write_format(&self, file: FileHandle, name: &str) -> EngineResult<FormatSpec>;
    fn set_write_format(&self, file: FileHandle, name: &str, format: FormatSpec) -> EngineResult<()>;

    /// Missing-value format tag and its three slots
    fn numeric_missing_values(&self, file: FileHandle, name: &str) -> EngineResult<(i32, [f64; 3])>;
    fn set_numeric_missing_values(
        &self,
        file: FileHandle,
        name: &str,
        format: i32,
        values: [f64; 3],
    ) -> EngineResult<()>;
    fn string_missing_values(&self, file: FileHandle, name: &str) -> EngineResult<Vec<String>>;
    fn set_string_missing_values(&self, file: FileHandle, name: &str, values: &[String]) -> EngineResult<()>;

    /// Parallel value and label arrays; `Err(NoLabels)` when none are defined
    fn numeric_value_labels(&self, file: FileHandle, name: &str) -> EngineResult<(Vec<f64>, Vec<String>)>;
    fn string_value_labels(&self, file: FileHandle, name: &str) -> EngineResult<(Vec<String>, Vec<String>)>;
    fn set_numeric_value_label(&self, file: FileHandle, name: &str, value: f64, label: &str) -> EngineResult<()>;
    fn set_string_value_label(&self, file: FileHandle, name: &str, value: &str, label: &str) -> EngineResult<()>;

    // Case buffer values
    fn numeric_value(&self, file: FileHandle, var: VarHandle) -> EngineResult<f64>;
    fn set_numeric_value(&self, file: FileHandle, var: VarHandle, value: f64) -> EngineResult<()>;
    fn string_value(&self, file: FileHandle, var: VarHandle) -> EngineResult<String>;
    fn set_string_value(&self, file: FileHandle, var: VarHandle, value: &str) -> EngineResult<()>;

    // Conversions
    fn system_missing(&self) -> f64 {
        SYSTEM_MISSING
    }

    fn convert_date(&self, day: u32, month: u32, year: i32) -> EngineResult<f64> {
        convert::date_to_seconds(day, month, year)
    }

    fn convert_spss_date(&self, value: f64) -> EngineResult<(u32, u32, i32)> {
        convert::seconds_to_date(value)
    }

    fn convert_time(&self, day: i64, hour: u32, minute: u32, second: f64) -> EngineResult<f64> {
        convert::time_to_seconds(day, hour, minute, second)
    }

    fn convert_spss_time(&self, value: f64) -> EngineResult<(i64, u32, u32, f64)> {
        convert::seconds_to_time(value)
    }
}
