//! String variables

use crate::engine::{self, check, FileHandle, MAX_LONG_STRING, MAX_MISSING_VALUES, MAX_SHORT_STRING};
use crate::errors::{SavError, SavResult};

use super::value_labels::ValueLabels;

/// Kind-specific part of a string variable.
///
/// The declared length (in bytes) fixes the column's on-disk type.
#[derive(Debug, Clone, PartialEq)]
pub struct StringVariable {
    length: u32,
    missing_values: Vec<String>,
    value_labels: ValueLabels<String>,
}

impl StringVariable {
    pub(crate) fn new(length: u32) -> SavResult<Self> {
        validate_length(length)?;
        Ok(Self {
            length,
            missing_values: Vec::new(),
            value_labels: ValueLabels::new(),
        })
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    /// Changes the declared length.
    ///
    /// Lengths above the short-string threshold cannot keep value labels.
    pub fn set_length(&mut self, length: u32) -> SavResult<()> {
        validate_length(length)?;
        if length > MAX_SHORT_STRING && !self.value_labels.is_empty() {
            return Err(SavError::invalid_operation(format!(
                "Strings longer than {} cannot carry value labels",
                MAX_SHORT_STRING
            )));
        }
        if let Some(too_long) = self.missing_values.iter().find(|v| v.len() > length as usize) {
            return Err(SavError::invalid_argument(format!(
                "Missing value '{}' does not fit length {}",
                too_long, length
            )));
        }
        self.length = length;
        Ok(())
    }

    /// Whether value labels may be added
    pub fn is_short(&self) -> bool {
        self.length <= MAX_SHORT_STRING
    }

    pub fn missing_values(&self) -> &[String] {
        &self.missing_values
    }

    pub fn set_missing_values(&mut self, values: Vec<String>) -> SavResult<()> {
        if values.len() > MAX_MISSING_VALUES {
            return Err(SavError::invalid_argument(format!(
                "At most {} missing values are allowed",
                MAX_MISSING_VALUES
            )));
        }
        if let Some(too_long) = values.iter().find(|v| v.len() > self.length as usize) {
            return Err(SavError::invalid_argument(format!(
                "Missing value '{}' does not fit length {}",
                too_long, self.length
            )));
        }
        self.missing_values = values;
        Ok(())
    }

    pub fn value_labels(&self) -> &ValueLabels<String> {
        &self.value_labels
    }

    pub fn add_value_label(&mut self, value: impl Into<String>, label: impl Into<String>) -> SavResult<()> {
        if !self.is_short() {
            return Err(SavError::invalid_operation(format!(
                "Value labels require a string length of at most {} (length is {})",
                MAX_SHORT_STRING, self.length
            )));
        }
        let value = value.into();
        if value.len() > self.length as usize {
            return Err(SavError::invalid_argument(format!(
                "Labeled value '{}' does not fit length {}",
                value, self.length
            )));
        }
        self.value_labels.add(value, label)
    }

    pub fn remove_value_label(&mut self, value: &str) -> Option<String> {
        self.value_labels.remove(&value.to_string())
    }

    pub fn clear_value_labels(&mut self) {
        self.value_labels.clear();
    }

    pub(crate) fn update(&self, file: FileHandle, name: &str) -> SavResult<()> {
        if !self.missing_values.is_empty() {
            check(
                "set_string_missing_values",
                engine::binding().set_string_missing_values(file, name, &self.missing_values),
            )?;
        }
        self.value_labels.update(file, name)
    }

    pub(crate) fn load(file: FileHandle, name: &str, length: u32) -> SavResult<Self> {
        let missing_values = check("string_missing_values", engine::binding().string_missing_values(file, name))?;
        let value_labels = if length <= MAX_SHORT_STRING {
            ValueLabels::load(file, name)?
        } else {
            ValueLabels::new()
        };
        Ok(Self {
            length,
            missing_values,
            value_labels,
        })
    }
}

fn validate_length(length: u32) -> SavResult<()> {
    if !(1..=MAX_LONG_STRING).contains(&length) {
        return Err(SavError::invalid_argument(format!(
            "String length {} is outside 1..={}",
            length, MAX_LONG_STRING
        )));
    }
    Ok(())
}
