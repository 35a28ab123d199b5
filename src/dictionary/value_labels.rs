//! Ordered value → label dictionaries
//!
//! One generic map serves both key types. The per-type engine calls live
//! behind [`LabelKey`], so loading and pushing are written once.

use std::fmt;

use crate::engine::{self, check, check_allowing, EngineResult, FileHandle, ReturnCode, MAX_VALLABEL};
use crate::errors::{SavError, SavResult};

/// A value type that can carry labels in the engine.
pub trait LabelKey: Clone + PartialEq + fmt::Debug {
    /// Pushes one pair to the engine
    fn push_label(file: FileHandle, variable: &str, value: &Self, label: &str) -> EngineResult<()>;

    /// Pulls parallel value and label arrays from the engine
    fn fetch_labels(file: FileHandle, variable: &str) -> EngineResult<(Vec<Self>, Vec<String>)>;

    /// Rejects keys the engine cannot store
    fn validate_key(&self) -> SavResult<()> {
        Ok(())
    }
}

impl LabelKey for f64 {
    fn validate_key(&self) -> SavResult<()> {
        if self.is_finite() {
            Ok(())
        } else {
            Err(SavError::invalid_argument(format!("Cannot label non-finite value {}", self)))
        }
    }

    fn push_label(file: FileHandle, variable: &str, value: &Self, label: &str) -> EngineResult<()> {
        engine::binding().set_numeric_value_label(file, variable, *value, label)
    }

    fn fetch_labels(file: FileHandle, variable: &str) -> EngineResult<(Vec<Self>, Vec<String>)> {
        engine::binding().numeric_value_labels(file, variable)
    }
}

impl LabelKey for String {
    fn push_label(file: FileHandle, variable: &str, value: &Self, label: &str) -> EngineResult<()> {
        engine::binding().set_string_value_label(file, variable, value, label)
    }

    fn fetch_labels(file: FileHandle, variable: &str) -> EngineResult<(Vec<Self>, Vec<String>)> {
        engine::binding().string_value_labels(file, variable)
    }
}

/// Value labels of one variable, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueLabels<K> {
    entries: Vec<(K, String)>,
}

impl<K> Default for ValueLabels<K> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<K: LabelKey> ValueLabels<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a label. Each value may be labeled once.
    pub(crate) fn add(&mut self, value: K, label: impl Into<String>) -> SavResult<()> {
        value.validate_key()?;
        let label = label.into();
        if label.chars().count() > MAX_VALLABEL {
            return Err(SavError::invalid_argument(format!(
                "Value label exceeds {} characters",
                MAX_VALLABEL
            )));
        }
        if self.get(&value).is_some() {
            return Err(SavError::invalid_argument(format!("Value {:?} is already labeled", value)));
        }
        self.entries.push((value, label));
        Ok(())
    }

    /// Removes the label for `value`, returning it if present
    pub(crate) fn remove(&mut self, value: &K) -> Option<String> {
        let index = self.entries.iter().position(|(v, _)| v == value)?;
        Some(self.entries.remove(index).1)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, value: &K) -> Option<&str> {
        self.entries
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, label)| label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &str)> {
        self.entries.iter().map(|(v, label)| (v, label.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pushes every pair to the engine, one call each
    pub(crate) fn update(&self, file: FileHandle, variable: &str) -> SavResult<()> {
        for (value, label) in &self.entries {
            check("set_value_label", K::push_label(file, variable, value, label))?;
        }
        Ok(())
    }

    /// Reads the labels stored for `variable`; none defined is an empty map
    pub(crate) fn load(file: FileHandle, variable: &str) -> SavResult<Self> {
        let (values, labels) = check_allowing(
            "value_labels",
            K::fetch_labels(file, variable),
            &[ReturnCode::NoLabels],
        )?;
        if values.len() != labels.len() {
            return Err(SavError::internal(format!(
                "Engine returned {} values but {} labels for '{}'",
                values.len(),
                labels.len(),
                variable
            )));
        }
        Ok(Self {
            entries: values.into_iter().zip(labels).collect(),
        })
    }
}
