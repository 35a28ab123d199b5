//! Lazy row enumeration

use crate::dictionary::{Value, VariableCollection};
use crate::engine::FileHandle;
use crate::errors::SavResult;

use super::CaseCursor;

/// Iterator over rows `0..count`, each as values in variable order.
///
/// Stops after the first error.
pub struct Rows<'r> {
    file: FileHandle,
    variables: &'r VariableCollection,
    cursor: &'r mut CaseCursor,
    next: usize,
    count: usize,
}

impl<'r> Rows<'r> {
    pub(super) fn new(file: FileHandle, variables: &'r VariableCollection, cursor: &'r mut CaseCursor, count: usize) -> Self {
        Self {
            file,
            variables,
            cursor,
            next: 0,
            count,
        }
    }

    fn read_row(&mut self, row: usize) -> SavResult<Vec<Value>> {
        self.cursor.move_to(self.file, row)?;
        self.variables.iter().map(|v| v.read_value()).collect()
    }
}

impl Iterator for Rows<'_> {
    type Item = SavResult<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let row = self.next;
        let result = self.read_row(row);
        self.next = if result.is_ok() { row + 1 } else { self.count };
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.next;
        (remaining, Some(remaining))
    }
}
