//! Case (row) access for a committed document
//!
//! [`CaseCollection`] is a short-lived view borrowed from a
//! [`Document`](crate::Document). It reads rows through the engine's row
//! cursor and appends new rows one at a time.
//!
//! # Counting
//!
//! - read: the engine's count
//! - append: the engine's count at open plus rows committed since
//! - create: rows committed this session (the engine cannot report one)
//!
//! # Pending rows
//!
//! [`CaseCollection::new_case`] returns a pending [`Case`] that holds the
//! view's mutable borrow, so at most one uncommitted row exists at a time.
//! Values are kept locally until [`Case::commit`] writes the row.

mod case;
mod rows;

pub use case::Case;
pub use rows::Rows;

use crate::dictionary::{Value, VariableCollection, VariableKind};
use crate::document::AccessMode;
use crate::engine::{self, check, FileHandle};
use crate::errors::{SavError, SavResult};
use crate::table::{ColumnType, DataColumn, DataTable};

/// Row cursor state owned by a document
#[derive(Debug, Default)]
pub(crate) struct CaseCursor {
    /// Row currently loaded in the engine's case buffer
    position: Option<usize>,
    /// Rows committed through this document
    committed_rows: usize,
}

impl CaseCursor {
    /// Loads `row` into the engine buffer unless it is already there
    fn move_to(&mut self, file: FileHandle, row: usize) -> SavResult<()> {
        if self.position == Some(row) {
            return Ok(());
        }
        let engine = engine::binding();
        self.position = None;
        check("seek_case", engine.seek_case(file, row))?;
        check("read_case_record", engine.read_case_record(file))?;
        self.position = Some(row);
        Ok(())
    }

    /// Records a committed row; the engine buffer no longer holds a read row
    fn row_committed(&mut self) {
        self.committed_rows += 1;
        self.position = None;
    }
}

pub struct CaseCollection<'a> {
    file: FileHandle,
    mode: AccessMode,
    variables: &'a VariableCollection,
    cursor: &'a mut CaseCursor,
}

impl<'a> CaseCollection<'a> {
    pub(crate) fn new(
        file: FileHandle,
        mode: AccessMode,
        variables: &'a VariableCollection,
        cursor: &'a mut CaseCursor,
    ) -> Self {
        Self {
            file,
            mode,
            variables,
            cursor,
        }
    }

    /// Whether rows can only be appended, not read back
    pub fn is_append_only(&self) -> bool {
        self.mode == AccessMode::Create
    }

    pub fn variables(&self) -> &VariableCollection {
        self.variables
    }

    /// Number of rows
    pub fn count(&self) -> SavResult<usize> {
        match self.mode {
            AccessMode::Create => Ok(self.cursor.committed_rows),
            AccessMode::Append => {
                let baseline = check("case_count", engine::binding().case_count(self.file))?;
                Ok(baseline + self.cursor.committed_rows)
            }
            AccessMode::Read => check("case_count", engine::binding().case_count(self.file)),
        }
    }

    fn set_position(&mut self, row: usize) -> SavResult<()> {
        if self.is_append_only() {
            return Err(SavError::invalid_operation(
                "Rows of a newly created document cannot be read back",
            ));
        }
        let count = self.count()?;
        if row >= count {
            return Err(SavError::out_of_range("Case", row, count));
        }
        self.cursor.move_to(self.file, row)
    }

    /// A read-only view of an existing row
    pub fn get(&mut self, row: usize) -> SavResult<Case<'_>> {
        self.set_position(row)?;
        Ok(Case::existing(self.file, self.variables, &mut *self.cursor, row))
    }

    /// A pending row at index `count()`, committed with [`Case::commit`]
    pub fn new_case(&mut self) -> SavResult<Case<'_>> {
        if self.mode == AccessMode::Read {
            return Err(SavError::invalid_operation("Cannot add rows to a document opened for reading"));
        }
        let row = self.count()?;
        Ok(Case::pending(self.file, self.variables, &mut *self.cursor, row))
    }

    /// Iterates over all rows as value vectors.
    ///
    /// The row count is taken when the iterator is created; call again to
    /// restart.
    pub fn rows(&mut self) -> SavResult<Rows<'_>> {
        if self.is_append_only() {
            return Err(SavError::invalid_operation(
                "Rows of a newly created document cannot be enumerated",
            ));
        }
        let count = self.count()?;
        Ok(Rows::new(self.file, self.variables, &mut *self.cursor, count))
    }

    /// Materializes every variable as a typed column and every row
    pub fn to_data_table(&mut self) -> SavResult<DataTable> {
        let columns = self
            .variables
            .iter()
            .map(|var| {
                let column_type = match var.kind() {
                    VariableKind::Numeric(_) => ColumnType::Number,
                    VariableKind::Date(_) => ColumnType::DateTime,
                    VariableKind::String(s) => ColumnType::Text {
                        max_length: Some(s.length()),
                    },
                };
                DataColumn::new(var.name(), column_type)
            })
            .collect();
        let rows = self.rows()?.collect::<SavResult<Vec<Vec<Value>>>>()?;
        Ok(DataTable { columns, rows })
    }
}
