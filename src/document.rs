//! Data documents
//!
//! A [`Document`] owns one engine file handle and moves through
//!
//! ```text
//! Authoring --commit_dictionary--> Committed --close--> Closed
//! ```
//!
//! Created documents start in `Authoring`; opened ones start `Committed`.
//! Dictionary edits are only accepted while authoring and case access only
//! once committed.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cases::{CaseCollection, CaseCursor};
use crate::config::Config;
use crate::dictionary::{generate_column_name, ColumnCallback, VariableCollection};
use crate::engine::{self, check, FileHandle};
use crate::errors::{SavError, SavResult};
use crate::observability::{log_event_with_fields, Event};
use crate::table::{DataRow, DataTable};

/// How a document's file was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// New file; rows can be appended but not read back
    Create,
    /// Existing file, read only
    Read,
    /// Existing file; rows can be read and appended
    Append,
}

impl AccessMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMode::Create => "create",
            AccessMode::Read => "read",
            AccessMode::Append => "append",
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Authoring,
    Committed,
    Closed,
}

/// Closes the engine handle if the document is dropped without `close`
#[derive(Debug)]
struct FileGuard {
    handle: Option<FileHandle>,
    path: PathBuf,
}

impl FileGuard {
    fn new(handle: FileHandle, path: &Path) -> Self {
        Self {
            handle: Some(handle),
            path: path.to_path_buf(),
        }
    }

    fn handle(&self) -> SavResult<FileHandle> {
        self.handle
            .ok_or_else(|| SavError::invalid_operation("Document is closed"))
    }

    fn close(&mut self) -> SavResult<()> {
        match self.handle.take() {
            Some(handle) => check("close", engine::binding().close(handle)),
            None => Ok(()),
        }
    }
}

impl Drop for FileGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let outcome = match engine::binding().close(handle) {
                Ok(()) => "closed".to_string(),
                Err(code) => code.to_string(),
            };
            let path = self.path.display().to_string();
            log_event_with_fields(Event::HandleLeakClosed, &[("path", &path), ("outcome", &outcome)]);
        }
    }
}

#[derive(Debug)]
pub struct Document {
    path: PathBuf,
    mode: AccessMode,
    state: DocumentState,
    compressed: bool,
    variables: VariableCollection,
    cursor: CaseCursor,
    guard: FileGuard,
}

impl Document {
    /// Opens an existing file for reading or appending.
    ///
    /// The dictionary is loaded and the document starts committed.
    pub fn open(path: impl AsRef<Path>, mode: AccessMode) -> SavResult<Self> {
        let path = path.as_ref();
        let engine = engine::binding();
        let handle = match mode {
            AccessMode::Read => check("open_read", engine.open_read(path))?,
            AccessMode::Append => check("open_append", engine.open_append(path))?,
            AccessMode::Create => {
                return Err(SavError::invalid_argument(
                    "Use Document::create to create a new file",
                ))
            }
        };
        let guard = FileGuard::new(handle, path);

        let variables = VariableCollection::load(handle)?;
        let compressed = check("compression", engine.compression(handle))?;

        let path_field = path.display().to_string();
        let count = variables.len().to_string();
        log_event_with_fields(
            Event::DocumentOpen,
            &[("path", &path_field), ("mode", mode.as_str()), ("variables", &count)],
        );

        Ok(Self {
            path: path.to_path_buf(),
            mode,
            state: DocumentState::Committed,
            compressed,
            variables,
            cursor: CaseCursor::default(),
            guard,
        })
    }

    /// Creates (or truncates) a file and starts authoring its dictionary
    pub fn create(path: impl AsRef<Path>) -> SavResult<Self> {
        let path = path.as_ref();
        let engine = engine::binding();
        let handle = check("open_write", engine.open_write(path))?;
        let guard = FileGuard::new(handle, path);
        let compressed = check("compression", engine.compression(handle))?;
        Ok(Self::authoring(path, guard, compressed))
    }

    /// Like [`Document::create`], with compression taken from `config`
    pub fn create_with_config(path: impl AsRef<Path>, config: &Config) -> SavResult<Self> {
        let path = path.as_ref();
        let engine = engine::binding();
        let handle = check("open_write", engine.open_write(path))?;
        let guard = FileGuard::new(handle, path);
        check("set_compression", engine.set_compression(handle, config.compression))?;
        Ok(Self::authoring(path, guard, config.compression))
    }

    fn authoring(path: &Path, guard: FileGuard, compressed: bool) -> Self {
        let path_field = path.display().to_string();
        log_event_with_fields(
            Event::DocumentCreate,
            &[("path", &path_field), ("compressed", if compressed { "true" } else { "false" })],
        );
        Self {
            path: path.to_path_buf(),
            mode: AccessMode::Create,
            state: DocumentState::Authoring,
            compressed,
            variables: VariableCollection::new(),
            cursor: CaseCursor::default(),
            guard,
        }
    }

    /// Creates a file whose dictionary copies the one in `source`.
    ///
    /// The new document is returned committed and ready for rows.
    pub fn create_from_dictionary(path: impl AsRef<Path>, source: impl AsRef<Path>) -> SavResult<Self> {
        let mut source = Document::open(source, AccessMode::Read)?;
        let mut document = Document::create(path)?;
        for variable in source.variables() {
            document.variables.add(variable.clone_detached()?)?;
        }
        document.commit_dictionary()?;
        source.close()?;
        Ok(document)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    pub fn is_authoring(&self) -> bool {
        self.state == DocumentState::Authoring
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Turns compression on or off; only before the dictionary is committed
    pub fn set_compressed(&mut self, compressed: bool) -> SavResult<()> {
        self.require_authoring("change compression")?;
        let handle = self.guard.handle()?;
        check("set_compression", engine::binding().set_compression(handle, compressed))?;
        self.compressed = compressed;
        Ok(())
    }

    pub fn variables(&self) -> &VariableCollection {
        &self.variables
    }

    /// Mutable access to the dictionary.
    ///
    /// After commit the collection and its variables refuse edits.
    pub fn variables_mut(&mut self) -> &mut VariableCollection {
        &mut self.variables
    }

    fn require_authoring(&self, action: &str) -> SavResult<()> {
        match self.state {
            DocumentState::Authoring => Ok(()),
            DocumentState::Committed => Err(SavError::invalid_operation(format!(
                "Cannot {} after the dictionary is committed",
                action
            ))),
            DocumentState::Closed => Err(SavError::invalid_operation(format!(
                "Cannot {} on a closed document",
                action
            ))),
        }
    }

    /// Writes every variable and the header, then freezes the dictionary
    pub fn commit_dictionary(&mut self) -> SavResult<()> {
        self.require_authoring("commit the dictionary")?;
        let handle = self.guard.handle()?;

        self.variables.commit(handle)?;
        check("commit_header", engine::binding().commit_header(handle))?;
        self.variables.dictionary_committed(handle)?;
        self.state = DocumentState::Committed;

        let path = self.path.display().to_string();
        let count = self.variables.len().to_string();
        log_event_with_fields(Event::DictionaryCommit, &[("path", &path), ("variables", &count)]);
        Ok(())
    }

    /// Row access; requires a committed dictionary
    pub fn cases(&mut self) -> SavResult<CaseCollection<'_>> {
        match self.state {
            DocumentState::Committed => {}
            DocumentState::Authoring => {
                return Err(SavError::invalid_operation(
                    "Commit the dictionary before accessing cases",
                ))
            }
            DocumentState::Closed => return Err(SavError::invalid_operation("Document is closed")),
        }
        let handle = self.guard.handle()?;
        Ok(CaseCollection::new(handle, self.mode, &self.variables, &mut self.cursor))
    }

    /// Releases the engine handle. Closing twice is a no-op.
    pub fn close(&mut self) -> SavResult<()> {
        if self.state == DocumentState::Closed {
            return Ok(());
        }
        let result = self.guard.close();
        self.state = DocumentState::Closed;

        let path = self.path.display().to_string();
        log_event_with_fields(Event::DocumentClose, &[("path", &path)]);
        result
    }

    /// Imports `rows` laid out as `table`'s columns.
    ///
    /// While authoring, one variable is derived per column and the
    /// dictionary is committed first. Returns the number of rows written.
    pub fn import_data(&mut self, table: &DataTable, rows: &[DataRow]) -> SavResult<usize> {
        self.import(table, rows, None)
    }

    /// Like [`Document::import_data`], calling `callback` on each derived
    /// variable before it is added
    pub fn import_data_with(
        &mut self,
        table: &DataTable,
        rows: &[DataRow],
        callback: ColumnCallback<'_>,
    ) -> SavResult<usize> {
        self.import(table, rows, Some(callback))
    }

    fn import(
        &mut self,
        table: &DataTable,
        rows: &[DataRow],
        callback: Option<ColumnCallback<'_>>,
    ) -> SavResult<usize> {
        if self.is_authoring() {
            self.variables.import_schema(table, callback)?;
            self.commit_dictionary()?;
        }

        let names: Vec<String> = table.columns.iter().map(|c| generate_column_name(&c.name)).collect();
        let mut cases = self.cases()?;
        for (row_index, row) in rows.iter().enumerate() {
            if row.len() != table.columns.len() {
                return Err(SavError::invalid_argument(format!(
                    "Row {} has {} values, expected {}",
                    row_index,
                    row.len(),
                    table.columns.len()
                )));
            }
            let mut case = cases.new_case()?;
            for ((column, name), value) in table.columns.iter().zip(&names).zip(row) {
                case.set(name, column.coerce(value.clone()))?;
            }
            case.commit()?;
        }

        let path = self.path.display().to_string();
        let count = rows.len().to_string();
        log_event_with_fields(Event::ImportComplete, &[("path", &path), ("rows", &count)]);
        Ok(rows.len())
    }

    /// Every variable as a typed column and every row
    pub fn to_data_table(&mut self) -> SavResult<DataTable> {
        self.cases()?.to_data_table()
    }
}
