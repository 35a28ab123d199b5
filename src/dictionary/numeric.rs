//! Numeric variables

use crate::engine::{
    self, check, FileHandle, FormatSpec, MAX_MISSING_VALUES, MISSING_NONE, MISSING_RANGE, MISSING_RANGE_AND_VALUE,
};
use crate::errors::{SavError, SavResult};

use super::value_labels::ValueLabels;

/// User-defined missing values of a numeric variable
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MissingValues {
    #[default]
    None,
    /// Up to three discrete values
    Discrete(Vec<f64>),
    /// Every value in `low..=high`
    Range { low: f64, high: f64 },
    /// A range plus one discrete value
    RangeAndValue { low: f64, high: f64, value: f64 },
}

impl MissingValues {
    fn validate(&self) -> SavResult<()> {
        if let Some(value) = self.values().into_iter().find(|v| !v.is_finite()) {
            return Err(SavError::invalid_argument(format!(
                "Missing value {} is not a finite number",
                value
            )));
        }
        match self {
            MissingValues::None => Ok(()),
            MissingValues::Discrete(values) if values.len() > MAX_MISSING_VALUES => Err(SavError::invalid_argument(
                format!("At most {} discrete missing values are allowed", MAX_MISSING_VALUES),
            )),
            MissingValues::Discrete(_) => Ok(()),
            MissingValues::Range { low, high } | MissingValues::RangeAndValue { low, high, .. } if low > high => Err(
                SavError::invalid_argument(format!("Missing range {}..{} is empty", low, high)),
            ),
            MissingValues::Range { .. } | MissingValues::RangeAndValue { .. } => Ok(()),
        }
    }

    fn values(&self) -> Vec<f64> {
        match self {
            MissingValues::None => Vec::new(),
            MissingValues::Discrete(values) => values.clone(),
            MissingValues::Range { low, high } => vec![*low, *high],
            MissingValues::RangeAndValue { low, high, value } => vec![*low, *high, *value],
        }
    }

    /// Engine encoding: format tag plus three slots
    pub(crate) fn to_engine(&self) -> (i32, [f64; 3]) {
        match self {
            MissingValues::None => (MISSING_NONE, [0.0; 3]),
            MissingValues::Discrete(values) => {
                let mut slots = [0.0; 3];
                for (slot, v) in slots.iter_mut().zip(values) {
                    *slot = *v;
                }
                (values.len() as i32, slots)
            }
            MissingValues::Range { low, high } => (MISSING_RANGE, [*low, *high, 0.0]),
            MissingValues::RangeAndValue { low, high, value } => (MISSING_RANGE_AND_VALUE, [*low, *high, *value]),
        }
    }

    pub(crate) fn from_engine(format: i32, slots: [f64; 3]) -> SavResult<Self> {
        match format {
            MISSING_NONE => Ok(MissingValues::None),
            1..=3 => Ok(MissingValues::Discrete(slots[..format as usize].to_vec())),
            MISSING_RANGE => Ok(MissingValues::Range {
                low: slots[0],
                high: slots[1],
            }),
            MISSING_RANGE_AND_VALUE => Ok(MissingValues::RangeAndValue {
                low: slots[0],
                high: slots[1],
                value: slots[2],
            }),
            other => Err(SavError::internal(format!("Unknown missing-value format {}", other))),
        }
    }

    /// Whether `value` is declared missing
    pub fn contains(&self, value: f64) -> bool {
        match self {
            MissingValues::None => false,
            MissingValues::Discrete(values) => values.contains(&value),
            MissingValues::Range { low, high } => (*low..=*high).contains(&value),
            MissingValues::RangeAndValue { low, high, value: v } => (*low..=*high).contains(&value) || *v == value,
        }
    }
}

/// Kind-specific part of a numeric variable
#[derive(Debug, Clone, PartialEq)]
pub struct NumericVariable {
    print_format: FormatSpec,
    write_format: FormatSpec,
    missing_values: MissingValues,
    value_labels: ValueLabels<f64>,
}

impl Default for NumericVariable {
    fn default() -> Self {
        Self {
            print_format: FormatSpec::numeric_default(),
            write_format: FormatSpec::numeric_default(),
            missing_values: MissingValues::None,
            value_labels: ValueLabels::new(),
        }
    }
}

fn validate_format(format: &FormatSpec) -> SavResult<()> {
    if format.format.is_date() || format.format.is_string() {
        return Err(SavError::invalid_argument(format!(
            "Format {} does not apply to numeric variables",
            format
        )));
    }
    if !format.is_well_formed() {
        return Err(SavError::invalid_argument(format!("Format {} has invalid width or decimals", format)));
    }
    Ok(())
}

impl NumericVariable {
    pub fn print_format(&self) -> FormatSpec {
        self.print_format
    }

    pub fn write_format(&self) -> FormatSpec {
        self.write_format
    }

    pub fn set_print_format(&mut self, format: FormatSpec) -> SavResult<()> {
        validate_format(&format)?;
        self.print_format = format;
        Ok(())
    }

    pub fn set_write_format(&mut self, format: FormatSpec) -> SavResult<()> {
        validate_format(&format)?;
        self.write_format = format;
        Ok(())
    }

    /// Sets print and write format together
    pub fn set_format(&mut self, format: FormatSpec) -> SavResult<()> {
        validate_format(&format)?;
        self.print_format = format;
        self.write_format = format;
        Ok(())
    }

    pub fn missing_values(&self) -> &MissingValues {
        &self.missing_values
    }

    /// Replaces the missing-value declaration. An empty discrete list
    /// is stored as [`MissingValues::None`].
    pub fn set_missing_values(&mut self, missing: MissingValues) -> SavResult<()> {
        missing.validate()?;
        self.missing_values = match missing {
            MissingValues::Discrete(values) if values.is_empty() => MissingValues::None,
            other => other,
        };
        Ok(())
    }

    pub fn value_labels(&self) -> &ValueLabels<f64> {
        &self.value_labels
    }

    pub fn add_value_label(&mut self, value: f64, label: impl Into<String>) -> SavResult<()> {
        self.value_labels.add(value, label)
    }

    pub fn remove_value_label(&mut self, value: f64) -> Option<String> {
        self.value_labels.remove(&value)
    }

    pub fn clear_value_labels(&mut self) {
        self.value_labels.clear();
    }

    pub(crate) fn update(&self, file: FileHandle, name: &str) -> SavResult<()> {
        let engine = engine::binding();
        check("set_print_format", engine.set_print_format(file, name, self.print_format))?;
        check("set_write_format", engine.set_write_format(file, name, self.write_format))?;
        if self.missing_values != MissingValues::None {
            let (format, slots) = self.missing_values.to_engine();
            check(
                "set_numeric_missing_values",
                engine.set_numeric_missing_values(file, name, format, slots),
            )?;
        }
        self.value_labels.update(file, name)
    }

    pub(crate) fn load(file: FileHandle, name: &str, print_format: FormatSpec) -> SavResult<Self> {
        let engine = engine::binding();
        let write_format = check("write_format", engine.write_format(file, name))?;
        let (format, slots) = check("numeric_missing_values", engine.numeric_missing_values(file, name))?;
        Ok(Self {
            print_format,
            write_format,
            missing_values: MissingValues::from_engine(format, slots)?,
            value_labels: ValueLabels::load(file, name)?,
        })
    }
}
