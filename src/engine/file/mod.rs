//! Reference file engine
//!
//! A portable [`Engine`] that keeps every open file in a mutex-guarded
//! handle table and persists it as a sequence of checksummed frames.
//!
//! # Modes
//!
//! - write: creates (truncates) the file; the dictionary is mutable until
//!   `commit_header`, after which cases may be appended. The case count is
//!   not reportable in this mode.
//! - read: dictionary and cases are frozen.
//! - append: the existing dictionary is frozen; cases may be read and
//!   appended. The case count reports the cases present at open.
//!
//! # Files
//!
//! - checksum.rs: crc32 helpers
//! - record.rs: frame and payload codecs
//! - reader.rs: whole-file load with corruption detection
//! - writer.rs: buffered append-only frame writer
//! - errors.rs: record-level errors mapped onto result codes

mod checksum;
mod errors;
mod reader;
mod record;
mod writer;

pub use errors::{RecordError, RecordResult};
pub use record::{Cell, VariableDef};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use self::reader::load_file;
use self::record::{encode_case, encode_dictionary, encode_header, FrameKind};
use self::writer::FileWriter;
use super::binding::{Engine, EngineResult};
use super::codes::ReturnCode;
use super::types::{
    Alignment, FileHandle, FormatSpec, MeasurementLevel, VarHandle, MAX_LONG_STRING, MAX_MISSING_VALUES,
    MAX_SHORT_STRING, MAX_VALLABEL, MAX_VARLABEL, MAX_VARNAME, MISSING_RANGE, MISSING_RANGE_AND_VALUE,
};
use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Write,
    Read,
    Append,
}

struct OpenFile {
    path: PathBuf,
    mode: Mode,
    compressed: bool,
    committed: bool,
    variables: Vec<VariableDef>,
    cases: Vec<Vec<Cell>>,
    /// Case count as of open
    baseline: usize,
    /// Next case `read_case_record` loads
    position: usize,
    buffer: Vec<Cell>,
    writer: Option<FileWriter>,
}

impl OpenFile {
    fn require_writable_dictionary(&self) -> EngineResult<()> {
        if self.mode == Mode::Read {
            return Err(ReturnCode::OpenReadMode);
        }
        if self.committed {
            return Err(ReturnCode::DictCommitted);
        }
        Ok(())
    }

    fn require_committed(&self) -> EngineResult<()> {
        if self.committed {
            Ok(())
        } else {
            Err(ReturnCode::DictNotCommitted)
        }
    }

    fn require_readable_cases(&self) -> EngineResult<()> {
        self.require_committed()?;
        if self.mode == Mode::Write {
            return Err(ReturnCode::OpenWriteMode);
        }
        Ok(())
    }

    fn variable(&self, name: &str) -> EngineResult<&VariableDef> {
        self.variables
            .iter()
            .find(|v| v.name.eq_ignore_ascii_case(name))
            .ok_or(ReturnCode::VarNotFound)
    }

    fn variable_mut(&mut self, name: &str) -> EngineResult<&mut VariableDef> {
        self.require_writable_dictionary()?;
        self.variables
            .iter_mut()
            .find(|v| v.name.eq_ignore_ascii_case(name))
            .ok_or(ReturnCode::VarNotFound)
    }

    fn cell(&self, var: VarHandle) -> EngineResult<(&VariableDef, &Cell)> {
        self.require_committed()?;
        let index = var.0 as usize;
        match (self.variables.get(index), self.buffer.get(index)) {
            (Some(def), Some(cell)) => Ok((def, cell)),
            _ => Err(ReturnCode::InvalidVarHandle),
        }
    }

    fn cell_mut(&mut self, var: VarHandle) -> EngineResult<(&VariableDef, &mut Cell)> {
        self.require_committed()?;
        if self.mode == Mode::Read {
            return Err(ReturnCode::OpenReadMode);
        }
        let index = var.0 as usize;
        match (self.variables.get(index), self.buffer.get_mut(index)) {
            (Some(def), Some(cell)) => Ok((def, cell)),
            _ => Err(ReturnCode::InvalidVarHandle),
        }
    }

    fn reset_buffer(&mut self) {
        self.buffer = self.variables.iter().map(VariableDef::blank_cell).collect();
    }
}

struct HandleTable {
    next: i32,
    files: HashMap<i32, OpenFile>,
}

/// The bundled engine: every primitive over the frame file format.
pub struct FileEngine {
    table: Mutex<HandleTable>,
    default_compression: bool,
    sync_each_case: bool,
}

impl Default for FileEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FileEngine {
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        Self {
            table: Mutex::new(HandleTable {
                next: 1,
                files: HashMap::new(),
            }),
            default_compression: config.compression,
            sync_each_case: config.sync_each_case,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HandleTable> {
        // A panic while holding the lock leaves the table itself intact.
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, file: OpenFile) -> FileHandle {
        let mut table = self.lock();
        let handle = table.next;
        table.next += 1;
        table.files.insert(handle, file);
        FileHandle(handle)
    }

    fn with_file<T>(&self, file: FileHandle, f: impl FnOnce(&OpenFile) -> EngineResult<T>) -> EngineResult<T> {
        let table = self.lock();
        let open = table.files.get(&file.0).ok_or(ReturnCode::InvalidHandle)?;
        f(open)
    }

    fn with_file_mut<T>(
        &self,
        file: FileHandle,
        f: impl FnOnce(&mut OpenFile) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let mut table = self.lock();
        let open = table.files.get_mut(&file.0).ok_or(ReturnCode::InvalidHandle)?;
        f(open)
    }

    fn load_existing(path: &Path, mode: Mode) -> EngineResult<OpenFile> {
        let loaded = load_file(path).map_err(|e| e.return_code())?;
        let baseline = loaded.cases.len();
        let mut open = OpenFile {
            path: path.to_path_buf(),
            mode,
            compressed: loaded.compressed,
            committed: true,
            variables: loaded.variables,
            cases: loaded.cases,
            baseline,
            position: 0,
            buffer: Vec::new(),
            writer: None,
        };
        open.reset_buffer();
        Ok(open)
    }
}

/// Names must be non-empty, fit the length limit, contain no whitespace
/// and not start with a digit.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().count() <= MAX_VARNAME
        && !name.chars().any(char::is_whitespace)
        && !name.starts_with(|c: char| c.is_ascii_digit())
}

fn truncate_chars(text: &str, max: usize) -> (String, bool) {
    match text.char_indices().nth(max) {
        Some((cut, _)) => (text[..cut].to_string(), true),
        None => (text.to_string(), false),
    }
}

impl Engine for FileEngine {
    fn open_read(&self, path: &Path) -> EngineResult<FileHandle> {
        let open = Self::load_existing(path, Mode::Read)?;
        Ok(self.register(open))
    }

    fn open_write(&self, path: &Path) -> EngineResult<FileHandle> {
        let writer = FileWriter::create(path, self.sync_each_case).map_err(|_| ReturnCode::FileOpenError)?;
        let open = OpenFile {
            path: path.to_path_buf(),
            mode: Mode::Write,
            compressed: self.default_compression,
            committed: false,
            variables: Vec::new(),
            cases: Vec::new(),
            baseline: 0,
            position: 0,
            buffer: Vec::new(),
            writer: Some(writer),
        };
        Ok(self.register(open))
    }

    fn open_append(&self, path: &Path) -> EngineResult<FileHandle> {
        let mut open = Self::load_existing(path, Mode::Append)?;
        let writer = FileWriter::append(path, self.sync_each_case).map_err(|_| ReturnCode::FileOpenError)?;
        open.writer = Some(writer);
        Ok(self.register(open))
    }

    fn close(&self, file: FileHandle) -> EngineResult<()> {
        let open = self.lock().files.remove(&file.0).ok_or(ReturnCode::InvalidHandle)?;
        match open.writer {
            Some(writer) => writer.finish().map_err(|_| ReturnCode::FileWriteError),
            None => Ok(()),
        }
    }

    fn set_compression(&self, file: FileHandle, compressed: bool) -> EngineResult<()> {
        self.with_file_mut(file, |f| {
            f.require_writable_dictionary()?;
            f.compressed = compressed;
            Ok(())
        })
    }

    fn compression(&self, file: FileHandle) -> EngineResult<bool> {
        self.with_file(file, |f| Ok(f.compressed))
    }

    fn commit_header(&self, file: FileHandle) -> EngineResult<()> {
        self.with_file_mut(file, |f| {
            f.require_writable_dictionary()?;
            if f.variables.is_empty() {
                return Err(ReturnCode::DictEmpty);
            }
            let dictionary = encode_dictionary(&f.variables).map_err(|_| ReturnCode::FileWriteError)?;
            let writer = f.writer.as_mut().ok_or(ReturnCode::OpenReadMode)?;
            writer
                .write_frame(FrameKind::Header, &encode_header(f.compressed))
                .and_then(|_| writer.write_frame(FrameKind::Dictionary, &dictionary))
                .map_err(|_| ReturnCode::FileWriteError)?;
            f.committed = true;
            f.reset_buffer();
            Ok(())
        })
    }

    fn commit_case_record(&self, file: FileHandle) -> EngineResult<()> {
        self.with_file_mut(file, |f| {
            if f.mode == Mode::Read {
                return Err(ReturnCode::OpenReadMode);
            }
            f.require_committed()?;
            let payload = encode_case(&f.buffer, f.compressed);
            let writer = f.writer.as_mut().ok_or(ReturnCode::OpenReadMode)?;
            writer
                .write_frame(FrameKind::Case, &payload)
                .map_err(|_| ReturnCode::FileWriteError)?;
            let case = std::mem::take(&mut f.buffer);
            f.cases.push(case);
            f.reset_buffer();
            Ok(())
        })
    }

    fn seek_case(&self, file: FileHandle, case_number: usize) -> EngineResult<()> {
        self.with_file_mut(file, |f| {
            f.require_readable_cases()?;
            if case_number >= f.cases.len() {
                return Err(ReturnCode::InvalidCase);
            }
            f.position = case_number;
            Ok(())
        })
    }

    fn read_case_record(&self, file: FileHandle) -> EngineResult<()> {
        self.with_file_mut(file, |f| {
            f.require_readable_cases()?;
            let case = f.cases.get(f.position).ok_or(ReturnCode::FileEnd)?.clone();
            f.buffer = case;
            f.position += 1;
            Ok(())
        })
    }

    fn case_count(&self, file: FileHandle) -> EngineResult<usize> {
        self.with_file(file, |f| match f.mode {
            Mode::Write => Err(ReturnCode::OpenWriteMode),
            Mode::Read => Ok(f.cases.len()),
            Mode::Append => Ok(f.baseline),
        })
    }

    fn variable_count(&self, file: FileHandle) -> EngineResult<usize> {
        self.with_file(file, |f| Ok(f.variables.len()))
    }

    fn variable_names(&self, file: FileHandle) -> EngineResult<Vec<(String, i32)>> {
        self.with_file(file, |f| {
            if f.variables.is_empty() {
                return Err(ReturnCode::DictEmpty);
            }
            Ok(f.variables.iter().map(|v| (v.name.clone(), v.native_type)).collect())
        })
    }

    fn variable_handle(&self, file: FileHandle, name: &str) -> EngineResult<VarHandle> {
        self.with_file(file, |f| {
            f.require_committed()?;
            f.variables
                .iter()
                .position(|v| v.name.eq_ignore_ascii_case(name))
                .map(|index| VarHandle(index as u32))
                .ok_or(ReturnCode::VarNotFound)
        })
    }

    fn set_variable_name(&self, file: FileHandle, name: &str, native_type: i32) -> EngineResult<()> {
        self.with_file_mut(file, |f| {
            f.require_writable_dictionary()?;
            if !is_valid_name(name) {
                return Err(ReturnCode::InvalidVarName);
            }
            if !(0..=MAX_LONG_STRING as i32).contains(&native_type) {
                return Err(ReturnCode::InvalidVarType);
            }
            if f.variables.iter().any(|v| v.name.eq_ignore_ascii_case(name)) {
                return Err(ReturnCode::DupVar);
            }
            f.variables.push(VariableDef::new(name, native_type));
            Ok(())
        })
    }

    fn variable_label(&self, file: FileHandle, name: &str) -> EngineResult<String> {
        self.with_file(file, |f| Ok(f.variable(name)?.label.clone()))
    }

    fn set_variable_label(&self, file: FileHandle, name: &str, label: &str) -> EngineResult<()> {
        self.with_file_mut(file, |f| {
            let var = f.variable_mut(name)?;
            let (label, truncated) = truncate_chars(label, MAX_VARLABEL);
            var.label = label;
            if truncated {
                Err(ReturnCode::ExcVarLabel)
            } else {
                Ok(())
            }
        })
    }

    fn column_width(&self, file: FileHandle, name: &str) -> EngineResult<u32> {
        self.with_file(file, |f| Ok(f.variable(name)?.column_width))
    }

    fn set_column_width(&self, file: FileHandle, name: &str, width: u32) -> EngineResult<()> {
        self.with_file_mut(file, |f| {
            f.variable_mut(name)?.column_width = width;
            Ok(())
        })
    }

    fn measurement_level(&self, file: FileHandle, name: &str) -> EngineResult<MeasurementLevel> {
        self.with_file(file, |f| Ok(f.variable(name)?.measurement_level))
    }

    fn set_measurement_level(&self, file: FileHandle, name: &str, level: MeasurementLevel) -> EngineResult<()> {
        self.with_file_mut(file, |f| {
            let var = f.variable_mut(name)?;
            if !var.is_numeric() && level == MeasurementLevel::Scale {
                return Err(ReturnCode::InvalidMeasureLevel);
            }
            var.measurement_level = level;
            Ok(())
        })
    }

    fn alignment(&self, file: FileHandle, name: &str) -> EngineResult<Alignment> {
        self.with_file(file, |f| Ok(f.variable(name)?.alignment))
    }

    fn set_alignment(&self, file: FileHandle, name: &str, alignment: Alignment) -> EngineResult<()> {
        self.with_file_mut(file, |f| {
            f.variable_mut(name)?.alignment = alignment;
            Ok(())
        })
    }

    fn print_format(&self, file: FileHandle, name: &str) -> EngineResult<FormatSpec> {
        self.with_file(file, |f| Ok(f.variable(name)?.print_format))
    }

    fn set_print_format(&self, file: FileHandle, name: &str, format: FormatSpec) -> EngineResult<()> {
        self.with_file_mut(file, |f| {
            let var = f.variable_mut(name)?;
            if !format_fits(var, &format) {
                return Err(ReturnCode::InvalidPrintFormat);
            }
            var.print_format = format;
            Ok(())
        })
    }

    fn write_format(&self, file: FileHandle, name: &str) -> EngineResult<FormatSpec> {
        self.with_file(file, |f| Ok(f.variable(name)?.write_format))
    }

    fn set_write_format(&self, file: FileHandle, name: &str, format: FormatSpec) -> EngineResult<()> {
        self.with_file_mut(file, |f| {
            let var = f.variable_mut(name)?;
            if !format_fits(var, &format) {
                return Err(ReturnCode::InvalidWriteFormat);
            }
            var.write_format = format;
            Ok(())
        })
    }

    fn numeric_missing_values(&self, file: FileHandle, name: &str) -> EngineResult<(i32, [f64; 3])> {
        self.with_file(file, |f| {
            let var = f.variable(name)?;
            if !var.is_numeric() {
                return Err(ReturnCode::NumericExpected);
            }
            Ok((var.missing_format, var.missing_numeric))
        })
    }

    fn set_numeric_missing_values(
        &self,
        file: FileHandle,
        name: &str,
        format: i32,
        values: [f64; 3],
    ) -> EngineResult<()> {
        self.with_file_mut(file, |f| {
            let var = f.variable_mut(name)?;
            if !var.is_numeric() {
                return Err(ReturnCode::NumericExpected);
            }
            // The dictionary frame cannot carry NaN or infinities.
            let valid = values.iter().all(|v| v.is_finite())
                && match format {
                    0..=3 => true,
                    MISSING_RANGE | MISSING_RANGE_AND_VALUE => values[0] <= values[1],
                    _ => false,
                };
            if !valid {
                return Err(ReturnCode::InvalidMissingFormat);
            }
            var.missing_format = format;
            var.missing_numeric = values;
            Ok(())
        })
    }

    fn string_missing_values(&self, file: FileHandle, name: &str) -> EngineResult<Vec<String>> {
        self.with_file(file, |f| {
            let var = f.variable(name)?;
            if var.is_numeric() {
                return Err(ReturnCode::StringExpected);
            }
            Ok(var.missing_strings.clone())
        })
    }

    fn set_string_missing_values(&self, file: FileHandle, name: &str, values: &[String]) -> EngineResult<()> {
        self.with_file_mut(file, |f| {
            let var = f.variable_mut(name)?;
            if var.is_numeric() {
                return Err(ReturnCode::StringExpected);
            }
            if values.len() > MAX_MISSING_VALUES {
                return Err(ReturnCode::InvalidMissingFormat);
            }
            if values.iter().any(|v| v.len() > var.native_type as usize) {
                return Err(ReturnCode::ExcStrValue);
            }
            var.missing_strings = values.to_vec();
            Ok(())
        })
    }

    fn numeric_value_labels(&self, file: FileHandle, name: &str) -> EngineResult<(Vec<f64>, Vec<String>)> {
        self.with_file(file, |f| {
            let var = f.variable(name)?;
            if !var.is_numeric() {
                return Err(ReturnCode::NumericExpected);
            }
            if var.numeric_labels.is_empty() {
                return Err(ReturnCode::NoLabels);
            }
            Ok(var.numeric_labels.iter().cloned().unzip())
        })
    }

    fn string_value_labels(&self, file: FileHandle, name: &str) -> EngineResult<(Vec<String>, Vec<String>)> {
        self.with_file(file, |f| {
            let var = f.variable(name)?;
            if var.is_numeric() {
                return Err(ReturnCode::StringExpected);
            }
            if var.string_labels.is_empty() {
                return Err(ReturnCode::NoLabels);
            }
            Ok(var.string_labels.iter().cloned().unzip())
        })
    }

    fn set_numeric_value_label(&self, file: FileHandle, name: &str, value: f64, label: &str) -> EngineResult<()> {
        self.with_file_mut(file, |f| {
            let var = f.variable_mut(name)?;
            if !var.is_numeric() {
                return Err(ReturnCode::NumericExpected);
            }
            if !value.is_finite() {
                return Err(ReturnCode::InvalidMissingFormat);
            }
            let (label, truncated) = truncate_chars(label, MAX_VALLABEL);
            match var.numeric_labels.iter_mut().find(|(v, _)| *v == value) {
                Some(entry) => entry.1 = label,
                None => var.numeric_labels.push((value, label)),
            }
            if truncated {
                Err(ReturnCode::ExcValLabel)
            } else {
                Ok(())
            }
        })
    }

    fn set_string_value_label(&self, file: FileHandle, name: &str, value: &str, label: &str) -> EngineResult<()> {
        self.with_file_mut(file, |f| {
            let var = f.variable_mut(name)?;
            if var.is_numeric() {
                return Err(ReturnCode::StringExpected);
            }
            if var.native_type as u32 > MAX_SHORT_STRING {
                return Err(ReturnCode::ShortStringExpected);
            }
            if value.len() > var.native_type as usize {
                return Err(ReturnCode::ExcStrValue);
            }
            let (label, truncated) = truncate_chars(label, MAX_VALLABEL);
            match var.string_labels.iter_mut().find(|(v, _)| v == value) {
                Some(entry) => entry.1 = label,
                None => var.string_labels.push((value.to_string(), label)),
            }
            if truncated {
                Err(ReturnCode::ExcValLabel)
            } else {
                Ok(())
            }
        })
    }

    fn numeric_value(&self, file: FileHandle, var: VarHandle) -> EngineResult<f64> {
        self.with_file(file, |f| match f.cell(var)? {
            (_, Cell::Number(value)) => Ok(*value),
            (_, Cell::Text(_)) => Err(ReturnCode::NumericExpected),
        })
    }

    fn set_numeric_value(&self, file: FileHandle, var: VarHandle, value: f64) -> EngineResult<()> {
        self.with_file_mut(file, |f| match f.cell_mut(var)? {
            (_, Cell::Number(slot)) => {
                *slot = value;
                Ok(())
            }
            (_, Cell::Text(_)) => Err(ReturnCode::NumericExpected),
        })
    }

    fn string_value(&self, file: FileHandle, var: VarHandle) -> EngineResult<String> {
        self.with_file(file, |f| match f.cell(var)? {
            // Strings come back blank-padded to the declared length.
            (def, Cell::Text(value)) => Ok(format!("{:<width$}", value, width = def.native_type as usize)),
            (_, Cell::Number(_)) => Err(ReturnCode::StringExpected),
        })
    }

    fn set_string_value(&self, file: FileHandle, var: VarHandle, value: &str) -> EngineResult<()> {
        self.with_file_mut(file, |f| match f.cell_mut(var)? {
            (def, Cell::Text(slot)) => {
                if value.len() > def.native_type as usize {
                    return Err(ReturnCode::ExcStrValue);
                }
                *slot = value.to_string();
                Ok(())
            }
            (_, Cell::Number(_)) => Err(ReturnCode::StringExpected),
        })
    }
}

/// String variables take character formats; numeric ones take well-formed
/// numeric or date formats.
fn format_fits(var: &VariableDef, format: &FormatSpec) -> bool {
    if var.is_numeric() {
        !format.format.is_string() && format.is_well_formed()
    } else {
        format.format.is_string() && format.width >= 1
    }
}

impl std::fmt::Debug for FileEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.lock();
        let mut open: Vec<(i32, &Path)> = table.files.iter().map(|(h, file)| (*h, file.path.as_path())).collect();
        open.sort_by_key(|(h, _)| *h);
        f.debug_struct("FileEngine")
            .field("open_files", &open)
            .field("default_compression", &self.default_compression)
            .field("sync_each_case", &self.sync_each_case)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{FormatType, SYSTEM_MISSING};
    use tempfile::TempDir;

    fn write_sample(engine: &FileEngine, path: &Path) {
        let fh = engine.open_write(path).unwrap();
        engine.set_variable_name(fh, "age", 0).unwrap();
        engine.set_variable_name(fh, "name", 5).unwrap();
        engine.commit_header(fh).unwrap();

        let age = engine.variable_handle(fh, "age").unwrap();
        let name = engine.variable_handle(fh, "name").unwrap();
        engine.set_numeric_value(fh, age, 42.0).unwrap();
        engine.set_string_value(fh, name, "abcde").unwrap();
        engine.commit_case_record(fh).unwrap();
        engine.close(fh).unwrap();
    }

    #[test]
    fn test_write_then_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample.sav");
        let engine = FileEngine::new();
        write_sample(&engine, &path);

        let fh = engine.open_read(&path).unwrap();
        assert_eq!(engine.case_count(fh).unwrap(), 1);
        assert_eq!(
            engine.variable_names(fh).unwrap(),
            vec![("age".to_string(), 0), ("name".to_string(), 5)]
        );
        engine.seek_case(fh, 0).unwrap();
        engine.read_case_record(fh).unwrap();
        assert_eq!(engine.numeric_value(fh, VarHandle(0)).unwrap(), 42.0);
        assert_eq!(engine.string_value(fh, VarHandle(1)).unwrap(), "abcde");
        assert_eq!(engine.read_case_record(fh), Err(ReturnCode::FileEnd));
        engine.close(fh).unwrap();
    }

    #[test]
    fn test_dictionary_rules() {
        let dir = TempDir::new().unwrap();
        let engine = FileEngine::new();
        let fh = engine.open_write(&dir.path().join("d.sav")).unwrap();

        assert_eq!(engine.commit_header(fh), Err(ReturnCode::DictEmpty));
        assert_eq!(engine.set_variable_name(fh, "", 0), Err(ReturnCode::InvalidVarName));
        assert_eq!(engine.set_variable_name(fh, "x", -1), Err(ReturnCode::InvalidVarType));
        engine.set_variable_name(fh, "Score", 0).unwrap();
        assert_eq!(engine.set_variable_name(fh, "SCORE", 0), Err(ReturnCode::DupVar));
        assert_eq!(engine.variable_handle(fh, "Score"), Err(ReturnCode::DictNotCommitted));

        engine.commit_header(fh).unwrap();
        assert_eq!(engine.set_variable_name(fh, "other", 0), Err(ReturnCode::DictCommitted));
        assert_eq!(engine.case_count(fh), Err(ReturnCode::OpenWriteMode));
        engine.close(fh).unwrap();
        assert_eq!(engine.close(fh), Err(ReturnCode::InvalidHandle));
    }

    #[test]
    fn test_type_checks_on_attributes() {
        let dir = TempDir::new().unwrap();
        let engine = FileEngine::new();
        let fh = engine.open_write(&dir.path().join("t.sav")).unwrap();
        engine.set_variable_name(fh, "num", 0).unwrap();
        engine.set_variable_name(fh, "long", 20).unwrap();

        assert_eq!(
            engine.set_print_format(fh, "num", FormatSpec::string(8)),
            Err(ReturnCode::InvalidPrintFormat)
        );
        engine
            .set_print_format(fh, "num", FormatSpec::new(FormatType::ADate, 10, 0))
            .unwrap();
        assert_eq!(
            engine.set_string_value_label(fh, "long", "a", "A"),
            Err(ReturnCode::ShortStringExpected)
        );
        assert_eq!(
            engine.set_measurement_level(fh, "long", MeasurementLevel::Scale),
            Err(ReturnCode::InvalidMeasureLevel)
        );
        assert_eq!(
            engine.set_numeric_missing_values(fh, "num", MISSING_RANGE, [5.0, 1.0, 0.0]),
            Err(ReturnCode::InvalidMissingFormat)
        );
        assert_eq!(engine.numeric_value_labels(fh, "num"), Err(ReturnCode::NoLabels));
        engine.close(fh).unwrap();
    }

    #[test]
    fn test_append_reports_baseline_count() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.sav");
        let engine = FileEngine::new();
        write_sample(&engine, &path);

        let fh = engine.open_append(&path).unwrap();
        assert_eq!(engine.set_variable_name(fh, "new", 0), Err(ReturnCode::DictCommitted));
        engine.set_numeric_value(fh, VarHandle(0), 7.0).unwrap();
        engine.commit_case_record(fh).unwrap();
        assert_eq!(engine.case_count(fh).unwrap(), 1);

        engine.seek_case(fh, 1).unwrap();
        engine.read_case_record(fh).unwrap();
        assert_eq!(engine.numeric_value(fh, VarHandle(0)).unwrap(), 7.0);
        assert_eq!(engine.string_value(fh, VarHandle(1)).unwrap(), "     ");
        engine.close(fh).unwrap();

        let fh = engine.open_read(&path).unwrap();
        assert_eq!(engine.case_count(fh).unwrap(), 2);
        engine.close(fh).unwrap();
    }

    #[test]
    fn test_case_buffer_resets_after_commit() {
        let dir = TempDir::new().unwrap();
        let engine = FileEngine::new();
        let fh = engine.open_write(&dir.path().join("b.sav")).unwrap();
        engine.set_variable_name(fh, "x", 0).unwrap();
        engine.commit_header(fh).unwrap();
        engine.set_numeric_value(fh, VarHandle(0), 1.0).unwrap();
        engine.commit_case_record(fh).unwrap();
        assert_eq!(engine.numeric_value(fh, VarHandle(0)).unwrap(), SYSTEM_MISSING);
        assert_eq!(engine.numeric_value(fh, VarHandle(3)), Err(ReturnCode::InvalidVarHandle));
        engine.close(fh).unwrap();
    }

    #[test]
    fn test_read_mode_is_frozen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("r.sav");
        let engine = FileEngine::new();
        write_sample(&engine, &path);

        let fh = engine.open_read(&path).unwrap();
        assert_eq!(engine.set_variable_label(fh, "age", "Age"), Err(ReturnCode::OpenReadMode));
        assert_eq!(engine.set_numeric_value(fh, VarHandle(0), 1.0), Err(ReturnCode::OpenReadMode));
        assert_eq!(engine.commit_case_record(fh), Err(ReturnCode::OpenReadMode));
        assert_eq!(engine.seek_case(fh, 5), Err(ReturnCode::InvalidCase));
        engine.close(fh).unwrap();
    }

    #[test]
    fn test_damaged_file_is_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.sav");
        let engine = FileEngine::new();
        write_sample(&engine, &path);

        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 6;
        bytes[last] ^= 0x55;
        std::fs::write(&path, bytes).unwrap();

        assert_eq!(engine.open_read(&path), Err(ReturnCode::InvalidFile));
        assert_eq!(
            engine.open_read(&dir.path().join("missing.sav")),
            Err(ReturnCode::FileOpenError)
        );
    }

    #[test]
    fn test_long_labels_truncated_with_warning() {
        let dir = TempDir::new().unwrap();
        let engine = FileEngine::new();
        let fh = engine.open_write(&dir.path().join("l.sav")).unwrap();
        engine.set_variable_name(fh, "x", 0).unwrap();
        let long = "x".repeat(MAX_VALLABEL + 5);
        assert_eq!(
            engine.set_numeric_value_label(fh, "x", 1.0, &long),
            Err(ReturnCode::ExcValLabel)
        );
        let (_, labels) = engine.numeric_value_labels(fh, "x").unwrap();
        assert_eq!(labels[0].len(), MAX_VALLABEL);
        engine.close(fh).unwrap();
    }

    #[test]
    fn test_non_finite_dictionary_values_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("f.sav");
        let engine = FileEngine::new();
        let fh = engine.open_write(&path).unwrap();
        engine.set_variable_name(fh, "x", 0).unwrap();

        assert_eq!(
            engine.set_numeric_missing_values(fh, "x", MISSING_RANGE, [f64::NEG_INFINITY, 0.0, 0.0]),
            Err(ReturnCode::InvalidMissingFormat)
        );
        assert_eq!(
            engine.set_numeric_missing_values(fh, "x", 1, [f64::NAN, 0.0, 0.0]),
            Err(ReturnCode::InvalidMissingFormat)
        );
        assert_eq!(
            engine.set_numeric_value_label(fh, "x", f64::INFINITY, "inf"),
            Err(ReturnCode::InvalidMissingFormat)
        );
        engine
            .set_numeric_missing_values(fh, "x", MISSING_RANGE, [-f64::MAX, 0.0, 0.0])
            .unwrap();
        engine.set_numeric_value_label(fh, "x", 1.0, "one").unwrap();
        engine.commit_header(fh).unwrap();
        engine.close(fh).unwrap();

        // Rejected values never reach the file, so it opens again
        let fh = engine.open_read(&path).unwrap();
        assert_eq!(
            engine.numeric_missing_values(fh, "x").unwrap(),
            (MISSING_RANGE, [-f64::MAX, 0.0, 0.0])
        );
        assert_eq!(
            engine.numeric_value_labels(fh, "x").unwrap(),
            (vec![1.0], vec!["one".to_string()])
        );
        engine.close(fh).unwrap();
    }
}
