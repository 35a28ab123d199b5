//! Ordered, name-indexed variable registry of one document
//!
//! Insertion order is column order on disk. The name index maps the
//! upper-cased name to a position and is rebuilt on every structural
//! change, so it always agrees with the list.

use std::collections::HashMap;
use std::ops::Index;

use crate::engine::{self, check, FileHandle, FormatSpec, FormatType, MAX_LONG_STRING, MAX_VARNAME};
use crate::errors::{SavError, SavResult};
use crate::table::{ColumnType, DataColumn, DataTable};

use super::variable::{validate_name, Variable};

/// Per-column hook run by [`VariableCollection::import_schema`] before a
/// derived variable is added
pub type ColumnCallback<'a> = &'a mut dyn FnMut(&mut Variable, &DataColumn) -> SavResult<()>;

#[derive(Debug, Default)]
pub struct VariableCollection {
    variables: Vec<Variable>,
    index: HashMap<String, usize>,
    committed: bool,
}

fn key(name: &str) -> String {
    name.to_uppercase()
}

impl VariableCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Whether the dictionary is committed and the schema frozen
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Variable> {
        self.variables.iter()
    }

    /// Variable names in column order
    pub fn names(&self) -> Vec<&str> {
        self.variables.iter().map(Variable::name).collect()
    }

    /// Position of `name`, matched case-insensitively
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(&key(name)).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.position(name).map(|i| &self.variables[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Variable> {
        let i = self.position(name)?;
        self.variables.get_mut(i)
    }

    pub fn get_at(&self, index: usize) -> Option<&Variable> {
        self.variables.get(index)
    }

    fn require_authoring(&self, action: &str) -> SavResult<()> {
        if self.committed {
            return Err(SavError::invalid_operation(format!(
                "Cannot {} after the dictionary is committed",
                action
            )));
        }
        Ok(())
    }

    /// Appends a variable
    pub fn add(&mut self, variable: Variable) -> SavResult<()> {
        self.insert(self.variables.len(), variable)
    }

    /// Inserts a variable at `index`, shifting later columns right
    pub fn insert(&mut self, index: usize, mut variable: Variable) -> SavResult<()> {
        self.require_authoring("add variables")?;
        if index > self.variables.len() {
            return Err(SavError::out_of_range("Variable index", index, self.variables.len()));
        }
        if variable.is_committed() {
            return Err(SavError::invalid_argument(format!(
                "Variable '{}' is committed to another file; add a detached clone",
                variable.name()
            )));
        }
        if let Some(existing) = self.get(variable.name()) {
            return Err(SavError::name_conflict(existing.name(), variable.name()));
        }

        variable.set_attached(true);
        self.variables.insert(index, variable);
        self.reindex();
        Ok(())
    }

    /// Detaches and returns the variable named `name`
    pub fn remove(&mut self, name: &str) -> SavResult<Variable> {
        self.require_authoring("remove variables")?;
        let index = self.position(name).ok_or_else(|| unknown(name))?;
        let mut variable = self.variables.remove(index);
        self.reindex();
        variable.set_attached(false);
        Ok(variable)
    }

    /// Renames a variable, keeping its position.
    ///
    /// Fails without changing anything if `new_name` is taken by another
    /// variable (case-insensitively).
    pub fn rename(&mut self, current: &str, new_name: &str) -> SavResult<()> {
        self.require_authoring("rename variables")?;
        let index = self.position(current).ok_or_else(|| unknown(current))?;
        validate_name(new_name)?;
        if let Some(other) = self.position(new_name) {
            if other != index {
                return Err(SavError::name_conflict(self.variables[index].name(), new_name));
            }
        }

        self.index.remove(&key(self.variables[index].name()));
        self.variables[index].rename_unchecked(new_name);
        self.index.insert(key(new_name), index);
        self.debug_check_index();
        Ok(())
    }

    fn reindex(&mut self) {
        self.index = self
            .variables
            .iter()
            .enumerate()
            .map(|(i, v)| (key(v.name()), i))
            .collect();
        self.debug_check_index();
    }

    fn debug_check_index(&self) {
        debug_assert_eq!(self.index.len(), self.variables.len());
        debug_assert!(self
            .variables
            .iter()
            .enumerate()
            .all(|(i, v)| self.index.get(&key(v.name())) == Some(&i)));
    }

    /// Creates every variable in the engine dictionary, in column order
    pub(crate) fn commit(&self, file: FileHandle) -> SavResult<()> {
        self.require_authoring("commit the dictionary")?;
        for variable in &self.variables {
            variable.commit_to_dictionary(file)?;
        }
        Ok(())
    }

    /// Freezes the schema and hands every variable its engine handle
    pub(crate) fn dictionary_committed(&mut self, file: FileHandle) -> SavResult<()> {
        for variable in &mut self.variables {
            variable.dictionary_committed(file)?;
        }
        self.committed = true;
        Ok(())
    }

    /// Reads the committed dictionary of an open file
    pub(crate) fn load(file: FileHandle) -> SavResult<Self> {
        let names = check("variable_names", engine::binding().variable_names(file))?;
        let mut collection = Self::new();
        for (name, native_type) in names {
            let mut variable = Variable::load(file, &name, native_type)?;
            variable.set_attached(true);
            collection.variables.push(variable);
        }
        collection.reindex();
        collection.committed = true;
        Ok(collection)
    }

    /// Derives one variable per table column and adds it.
    ///
    /// Text becomes a string sized to the declared maximum (or the long
    /// string limit), date-time becomes a date variable, every other type
    /// a numeric one. Over-long column names are shortened with
    /// [`generate_column_name`]. The callback may adjust each variable
    /// before it is added.
    pub fn import_schema(&mut self, table: &DataTable, mut callback: Option<ColumnCallback<'_>>) -> SavResult<()> {
        self.require_authoring("import a schema")?;
        for column in &table.columns {
            let name = generate_column_name(&column.name);
            let mut variable = match &column.column_type {
                ColumnType::Text { max_length } => {
                    let length = max_length.unwrap_or(MAX_LONG_STRING).clamp(1, MAX_LONG_STRING);
                    Variable::string(&name, length)?
                }
                ColumnType::DateTime => Variable::date(&name)?,
                ColumnType::Integer => {
                    let mut variable = Variable::numeric(&name)?;
                    variable.numeric_mut()?.set_format(FormatSpec::new(FormatType::F, 8, 0))?;
                    variable
                }
                ColumnType::Boolean => {
                    let mut variable = Variable::numeric(&name)?;
                    variable.numeric_mut()?.set_format(FormatSpec::new(FormatType::F, 1, 0))?;
                    variable
                }
                ColumnType::Number => Variable::numeric(&name)?,
            };
            if let Some(callback) = callback.as_deref_mut() {
                callback(&mut variable, column)?;
            }
            self.add(variable)?;
        }
        Ok(())
    }
}

impl Index<usize> for VariableCollection {
    type Output = Variable;

    fn index(&self, index: usize) -> &Variable {
        &self.variables[index]
    }
}

impl<'a> IntoIterator for &'a VariableCollection {
    type Item = &'a Variable;
    type IntoIter = std::slice::Iter<'a, Variable>;

    fn into_iter(self) -> Self::IntoIter {
        self.variables.iter()
    }
}

fn unknown(name: &str) -> SavError {
    SavError::invalid_argument(format!("No variable named '{}'", name))
}

/// Turns a column header into a usable variable name.
///
/// Whitespace becomes `_` and a leading digit gets a `_` prefix. Names
/// over the maximum length keep their first and last halves, so two
/// names that differ only in the dropped middle map to the same result.
pub fn generate_column_name(name: &str) -> String {
    let mut chars: Vec<char> = name
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    if chars.first().is_some_and(|c| c.is_ascii_digit()) {
        chars.insert(0, '_');
    }
    if chars.len() <= MAX_VARNAME {
        return chars.into_iter().collect();
    }
    let half = MAX_VARNAME / 2;
    chars[..half].iter().chain(&chars[chars.len() - half..]).collect()
}
