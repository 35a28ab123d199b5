//! The variable: a typed column descriptor plus its per-case value accessor
//!
//! A variable is either uncommitted (no engine handle, every field mutable)
//! or committed (handle set, structural fields frozen). Variables loaded
//! from an existing file are committed from the start.

use std::cell::OnceCell;

use crate::engine::{self, check, Alignment, FileHandle, MeasurementLevel, VarHandle, MAX_LONG_STRING, MAX_VARLABEL, MAX_VARNAME};
use crate::errors::{SavError, SavResult};

use super::date::{decode_datetime, encode_datetime, DateVariable};
use super::numeric::NumericVariable;
use super::string::StringVariable;
use super::value::Value;

const DEFAULT_COLUMN_WIDTH: u32 = 8;

/// The three variable kinds and their kind-specific data
#[derive(Debug, Clone, PartialEq)]
pub enum VariableKind {
    Numeric(NumericVariable),
    String(StringVariable),
    Date(DateVariable),
}

impl VariableKind {
    pub fn name(&self) -> &'static str {
        match self {
            VariableKind::Numeric(_) => "numeric",
            VariableKind::String(_) => "string",
            VariableKind::Date(_) => "date",
        }
    }
}

/// Engine location of a committed variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VariableBinding {
    file: FileHandle,
    handle: VarHandle,
}

#[derive(Debug)]
pub struct Variable {
    name: String,
    label: String,
    // Display attributes of loaded variables are pulled on first access.
    column_width: OnceCell<u32>,
    measurement_level: OnceCell<MeasurementLevel>,
    alignment: OnceCell<Alignment>,
    binding: Option<VariableBinding>,
    attached: bool,
    kind: VariableKind,
}

/// Validates a variable name without touching the engine
pub(crate) fn validate_name(name: &str) -> SavResult<()> {
    if name.is_empty() {
        return Err(SavError::invalid_argument("Variable name must not be empty"));
    }
    if name.chars().count() > MAX_VARNAME {
        return Err(SavError::invalid_argument(format!(
            "Variable name '{}' exceeds {} characters",
            name, MAX_VARNAME
        )));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(SavError::invalid_argument(format!(
            "Variable name '{}' must not contain whitespace",
            name
        )));
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(SavError::invalid_argument(format!(
            "Variable name '{}' must not start with a digit",
            name
        )));
    }
    Ok(())
}

impl Variable {
    fn with_kind(name: &str, kind: VariableKind, level: MeasurementLevel, alignment: Alignment) -> SavResult<Self> {
        validate_name(name)?;
        Ok(Self {
            name: name.to_string(),
            label: String::new(),
            column_width: OnceCell::from(DEFAULT_COLUMN_WIDTH),
            measurement_level: OnceCell::from(level),
            alignment: OnceCell::from(alignment),
            binding: None,
            attached: false,
            kind,
        })
    }

    /// A detached numeric variable with format F8.2
    pub fn numeric(name: &str) -> SavResult<Self> {
        Self::with_kind(
            name,
            VariableKind::Numeric(NumericVariable::default()),
            MeasurementLevel::Scale,
            Alignment::Right,
        )
    }

    /// A detached string variable of `length` bytes
    pub fn string(name: &str, length: u32) -> SavResult<Self> {
        Self::with_kind(
            name,
            VariableKind::String(StringVariable::new(length)?),
            MeasurementLevel::Nominal,
            Alignment::Left,
        )
    }

    /// A detached date variable with format DATETIME23.3
    pub fn date(name: &str) -> SavResult<Self> {
        Self::with_kind(
            name,
            VariableKind::Date(DateVariable::default()),
            MeasurementLevel::Scale,
            Alignment::Right,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames a detached variable.
    ///
    /// Attached variables are renamed through
    /// [`VariableCollection::rename`](super::VariableCollection::rename).
    pub fn set_name(&mut self, name: &str) -> SavResult<()> {
        self.require_uncommitted()?;
        if self.attached {
            return Err(SavError::invalid_operation(format!(
                "Variable '{}' belongs to a collection; rename it there",
                self.name
            )));
        }
        validate_name(name)?;
        self.name = name.to_string();
        Ok(())
    }

    pub(crate) fn rename_unchecked(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: &str) -> SavResult<()> {
        self.require_uncommitted()?;
        if label.chars().count() > MAX_VARLABEL {
            return Err(SavError::invalid_argument(format!(
                "Variable label exceeds {} characters",
                MAX_VARLABEL
            )));
        }
        self.label = label.to_string();
        Ok(())
    }

    pub fn column_width(&self) -> SavResult<u32> {
        if let Some(width) = self.column_width.get() {
            return Ok(*width);
        }
        let file = self.committed_file()?;
        let width = check("column_width", engine::binding().column_width(file, &self.name))?;
        Ok(*self.column_width.get_or_init(|| width))
    }

    pub fn set_column_width(&mut self, width: u32) -> SavResult<()> {
        self.require_uncommitted()?;
        self.column_width = OnceCell::from(width);
        Ok(())
    }

    pub fn measurement_level(&self) -> SavResult<MeasurementLevel> {
        if let Some(level) = self.measurement_level.get() {
            return Ok(*level);
        }
        let file = self.committed_file()?;
        let level = check("measurement_level", engine::binding().measurement_level(file, &self.name))?;
        Ok(*self.measurement_level.get_or_init(|| level))
    }

    pub fn set_measurement_level(&mut self, level: MeasurementLevel) -> SavResult<()> {
        self.require_uncommitted()?;
        if level == MeasurementLevel::Scale && matches!(self.kind, VariableKind::String(_)) {
            return Err(SavError::invalid_argument("String variables cannot use the scale level"));
        }
        self.measurement_level = OnceCell::from(level);
        Ok(())
    }

    pub fn alignment(&self) -> SavResult<Alignment> {
        if let Some(alignment) = self.alignment.get() {
            return Ok(*alignment);
        }
        let file = self.committed_file()?;
        let alignment = check("alignment", engine::binding().alignment(file, &self.name))?;
        Ok(*self.alignment.get_or_init(|| alignment))
    }

    pub fn set_alignment(&mut self, alignment: Alignment) -> SavResult<()> {
        self.require_uncommitted()?;
        self.alignment = OnceCell::from(alignment);
        Ok(())
    }

    pub fn kind(&self) -> &VariableKind {
        &self.kind
    }

    pub fn as_numeric(&self) -> Option<&NumericVariable> {
        match &self.kind {
            VariableKind::Numeric(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&StringVariable> {
        match &self.kind {
            VariableKind::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateVariable> {
        match &self.kind {
            VariableKind::Date(d) => Some(d),
            _ => None,
        }
    }

    /// Mutable numeric settings; fails on committed or non-numeric variables
    pub fn numeric_mut(&mut self) -> SavResult<&mut NumericVariable> {
        self.require_uncommitted()?;
        match &mut self.kind {
            VariableKind::Numeric(n) => Ok(n),
            other => Err(wrong_kind(&self.name, "numeric", other)),
        }
    }

    /// Mutable string settings; fails on committed or non-string variables
    pub fn string_mut(&mut self) -> SavResult<&mut StringVariable> {
        self.require_uncommitted()?;
        match &mut self.kind {
            VariableKind::String(s) => Ok(s),
            other => Err(wrong_kind(&self.name, "string", other)),
        }
    }

    /// Mutable date settings; fails on committed or non-date variables
    pub fn date_mut(&mut self) -> SavResult<&mut DateVariable> {
        self.require_uncommitted()?;
        match &mut self.kind {
            VariableKind::Date(d) => Ok(d),
            other => Err(wrong_kind(&self.name, "date", other)),
        }
    }

    /// Native type code: 0 for numeric and date, the length for strings
    pub fn spss_type(&self) -> i32 {
        match &self.kind {
            VariableKind::Numeric(_) | VariableKind::Date(_) => 0,
            VariableKind::String(s) => s.length() as i32,
        }
    }

    pub fn is_committed(&self) -> bool {
        self.binding.is_some()
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Engine handle, set once the dictionary is committed
    pub fn handle(&self) -> Option<VarHandle> {
        self.binding.map(|b| b.handle)
    }

    pub(crate) fn set_attached(&mut self, attached: bool) {
        self.attached = attached;
    }

    /// A detached, uncommitted copy of the same kind and settings.
    ///
    /// Display attributes of a loaded variable are resolved first, so the
    /// source file must still be open.
    pub fn clone_detached(&self) -> SavResult<Variable> {
        Ok(Variable {
            name: self.name.clone(),
            label: self.label.clone(),
            column_width: OnceCell::from(self.column_width()?),
            measurement_level: OnceCell::from(self.measurement_level()?),
            alignment: OnceCell::from(self.alignment()?),
            binding: None,
            attached: false,
            kind: self.kind.clone(),
        })
    }

    fn require_uncommitted(&self) -> SavResult<()> {
        if self.is_committed() {
            return Err(SavError::invalid_operation(format!(
                "Variable '{}' is committed and cannot be changed",
                self.name
            )));
        }
        Ok(())
    }

    fn committed_file(&self) -> SavResult<FileHandle> {
        self.binding.map(|b| b.file).ok_or_else(|| {
            SavError::internal(format!("Variable '{}' has neither a cached attribute nor a file", self.name))
        })
    }

    fn value_binding(&self) -> SavResult<VariableBinding> {
        self.binding.ok_or_else(|| {
            SavError::invalid_operation(format!(
                "Variable '{}' has no values before the dictionary is committed",
                self.name
            ))
        })
    }

    /// Creates the variable in the engine dictionary and writes its settings
    pub(crate) fn commit_to_dictionary(&self, file: FileHandle) -> SavResult<()> {
        check(
            "set_variable_name",
            engine::binding().set_variable_name(file, &self.name, self.spss_type()),
        )?;
        self.update(file)
    }

    fn update(&self, file: FileHandle) -> SavResult<()> {
        let engine = engine::binding();
        if !self.label.is_empty() {
            check("set_variable_label", engine.set_variable_label(file, &self.name, &self.label))?;
        }
        check("set_column_width", engine.set_column_width(file, &self.name, self.column_width()?))?;
        check(
            "set_measurement_level",
            engine.set_measurement_level(file, &self.name, self.measurement_level()?),
        )?;
        check("set_alignment", engine.set_alignment(file, &self.name, self.alignment()?))?;
        match &self.kind {
            VariableKind::Numeric(n) => n.update(file, &self.name),
            VariableKind::String(s) => s.update(file, &self.name),
            VariableKind::Date(d) => d.update(file, &self.name),
        }
    }

    /// Called once the header is committed: obtains the engine handle
    pub(crate) fn dictionary_committed(&mut self, file: FileHandle) -> SavResult<()> {
        let handle = check("variable_handle", engine::binding().variable_handle(file, &self.name))?;
        self.binding = Some(VariableBinding { file, handle });
        Ok(())
    }

    /// Loads a committed variable from an open file
    pub(crate) fn load(file: FileHandle, name: &str, native_type: i32) -> SavResult<Self> {
        let engine = engine::binding();
        let kind = match native_type {
            0 => {
                let print_format = check("print_format", engine.print_format(file, name))?;
                if print_format.format.is_date() {
                    VariableKind::Date(DateVariable::load(file, name, print_format)?)
                } else {
                    VariableKind::Numeric(NumericVariable::load(file, name, print_format)?)
                }
            }
            length if length > 0 && length <= MAX_LONG_STRING as i32 => {
                VariableKind::String(StringVariable::load(file, name, length as u32)?)
            }
            _ => return Err(SavError::unrecognized_variable(name, native_type)),
        };
        let label = check("variable_label", engine.variable_label(file, name))?;
        let handle = check("variable_handle", engine.variable_handle(file, name))?;

        Ok(Self {
            name: name.to_string(),
            label,
            column_width: OnceCell::new(),
            measurement_level: OnceCell::new(),
            alignment: OnceCell::new(),
            binding: Some(VariableBinding { file, handle }),
            attached: false,
            kind,
        })
    }

    /// Checks that `value` fits this variable, without touching the engine
    pub fn validate_value(&self, value: &Value) -> SavResult<()> {
        let fits = match (&self.kind, value) {
            (_, Value::Null) => true,
            (VariableKind::Numeric(_), Value::Number(_) | Value::Bool(_)) => true,
            (VariableKind::Date(_), Value::DateTime(_)) => true,
            (VariableKind::String(s), Value::Text(text)) => {
                if text.len() > s.length() as usize {
                    return Err(SavError::invalid_argument(format!(
                        "Value of {} bytes exceeds length {} of '{}'",
                        text.len(),
                        s.length(),
                        self.name
                    )));
                }
                true
            }
            _ => false,
        };
        if fits {
            Ok(())
        } else {
            Err(SavError::invalid_argument(format!(
                "A {} value cannot be stored in {} variable '{}'",
                value.kind_name(),
                self.kind.name(),
                self.name
            )))
        }
    }

    /// Reads this variable from the engine's current case.
    ///
    /// System-missing reads as `Value::Null`; strings lose trailing blanks.
    pub(crate) fn read_value(&self) -> SavResult<Value> {
        let VariableBinding { file, handle } = self.value_binding()?;
        let engine = engine::binding();
        match &self.kind {
            VariableKind::Numeric(_) => {
                let v = check("numeric_value", engine.numeric_value(file, handle))?;
                Ok(if v == engine.system_missing() {
                    Value::Null
                } else {
                    Value::Number(v)
                })
            }
            VariableKind::Date(_) => {
                let v = check("numeric_value", engine.numeric_value(file, handle))?;
                if v == engine.system_missing() {
                    Ok(Value::Null)
                } else {
                    Ok(Value::DateTime(decode_datetime(v)?))
                }
            }
            VariableKind::String(_) => {
                let s = check("string_value", engine.string_value(file, handle))?;
                Ok(Value::Text(s.trim_end_matches(' ').to_string()))
            }
        }
    }

    /// Writes `value` into the engine's case buffer
    pub(crate) fn write_value(&self, value: &Value) -> SavResult<()> {
        self.validate_value(value)?;
        let VariableBinding { file, handle } = self.value_binding()?;
        let engine = engine::binding();
        match (&self.kind, value) {
            (VariableKind::String(_), Value::Text(text)) => {
                check("set_string_value", engine.set_string_value(file, handle, text))
            }
            (VariableKind::String(_), _) => check("set_string_value", engine.set_string_value(file, handle, "")),
            (VariableKind::Date(_), Value::DateTime(dt)) => {
                let encoded = encode_datetime(dt)?;
                check("set_numeric_value", engine.set_numeric_value(file, handle, encoded))
            }
            (_, value) => {
                let number = value.as_f64().unwrap_or_else(|| engine.system_missing());
                check("set_numeric_value", engine.set_numeric_value(file, handle, number))
            }
        }
    }
}

fn wrong_kind(name: &str, wanted: &str, actual: &VariableKind) -> SavError {
    SavError::invalid_operation(format!(
        "Variable '{}' is a {} variable, not {}",
        name,
        actual.name(),
        wanted
    ))
}
