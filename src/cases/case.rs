//! One row of a document

use crate::dictionary::{Value, Variable, VariableCollection};
use crate::engine::{self, check, FileHandle};
use crate::errors::{SavError, SavResult};
use crate::observability::{log_event_with_fields, Event};

use super::CaseCursor;

/// A transient view of one row.
///
/// Existing rows are read-only and read straight from the engine's case
/// buffer. A pending row keeps its values until [`Case::commit`]; dropping
/// it uncommitted discards them.
pub struct Case<'c> {
    file: FileHandle,
    variables: &'c VariableCollection,
    cursor: &'c mut CaseCursor,
    row: usize,
    pending: Option<Vec<Value>>,
}

impl<'c> Case<'c> {
    pub(super) fn existing(
        file: FileHandle,
        variables: &'c VariableCollection,
        cursor: &'c mut CaseCursor,
        row: usize,
    ) -> Self {
        Self {
            file,
            variables,
            cursor,
            row,
            pending: None,
        }
    }

    pub(super) fn pending(
        file: FileHandle,
        variables: &'c VariableCollection,
        cursor: &'c mut CaseCursor,
        row: usize,
    ) -> Self {
        Self {
            file,
            variables,
            cursor,
            row,
            pending: Some(vec![Value::Null; variables.len()]),
        }
    }

    /// Row index of this case
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn index_of(&self, name: &str) -> SavResult<usize> {
        self.variables
            .position(name)
            .ok_or_else(|| SavError::invalid_argument(format!("No variable named '{}'", name)))
    }

    fn variable_at(&self, index: usize) -> SavResult<&'c Variable> {
        self.variables
            .get_at(index)
            .ok_or_else(|| SavError::out_of_range("Variable index", index, self.variables.len()))
    }

    /// Value of the named variable
    pub fn get(&self, name: &str) -> SavResult<Value> {
        self.get_at(self.index_of(name)?)
    }

    /// Value of the variable at `index`
    pub fn get_at(&self, index: usize) -> SavResult<Value> {
        let variable = self.variable_at(index)?;
        match &self.pending {
            Some(values) => Ok(values[index].clone()),
            None => {
                debug_assert_eq!(self.cursor.position, Some(self.row));
                variable.read_value()
            }
        }
    }

    /// All values in variable order
    pub fn values(&self) -> SavResult<Vec<Value>> {
        (0..self.variables.len()).map(|i| self.get_at(i)).collect()
    }

    /// Sets the named variable on a pending row
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> SavResult<()> {
        let index = self.index_of(name)?;
        self.set_at(index, value)
    }

    /// Sets the variable at `index` on a pending row
    pub fn set_at(&mut self, index: usize, value: impl Into<Value>) -> SavResult<()> {
        let value = value.into();
        let variable = self.variable_at(index)?;
        variable.validate_value(&value)?;
        match self.pending.as_mut() {
            Some(values) => {
                values[index] = value;
                Ok(())
            }
            None => Err(SavError::invalid_operation(format!(
                "Row {} already exists and is read-only",
                self.row
            ))),
        }
    }

    /// Writes the pending row. Every variable is written; unset ones as
    /// missing.
    pub fn commit(mut self) -> SavResult<()> {
        let values = self
            .pending
            .ok_or_else(|| SavError::invalid_operation(format!("Row {} is already committed", self.row)))?;

        for (variable, value) in self.variables.iter().zip(&values) {
            variable.write_value(value)?;
        }
        check("commit_case_record", engine::binding().commit_case_record(self.file))?;
        self.cursor.row_committed();

        let row = self.row.to_string();
        log_event_with_fields(Event::CaseCommit, &[("row", &row)]);
        Ok(())
    }
}
