//! Date variables
//!
//! Stored as numeric columns holding seconds since 1582-10-14, shown with a
//! date or time format. Values are split into a calendar date and a
//! time-of-day part, each converted by its own engine primitive; the
//! fractional second carries milliseconds.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

use crate::engine::{self, check, FileHandle, FormatSpec, MAX_MISSING_VALUES, MISSING_NONE};
use crate::errors::{SavError, SavResult};
use crate::observability::{log_event_with_fields, Event};

/// Kind-specific part of a date variable
#[derive(Debug, Clone, PartialEq)]
pub struct DateVariable {
    format: FormatSpec,
    missing_values: Vec<NaiveDateTime>,
}

impl Default for DateVariable {
    fn default() -> Self {
        Self {
            format: FormatSpec::date_default(),
            missing_values: Vec::new(),
        }
    }
}

impl DateVariable {
    /// Print and write format
    pub fn format(&self) -> FormatSpec {
        self.format
    }

    /// Sets the format; only date and time formats apply
    pub fn set_format(&mut self, format: FormatSpec) -> SavResult<()> {
        if !format.format.is_date() {
            return Err(SavError::invalid_argument(format!(
                "Format {} does not apply to date variables",
                format
            )));
        }
        if !format.is_well_formed() {
            return Err(SavError::invalid_argument(format!("Format {} has invalid width or decimals", format)));
        }
        self.format = format;
        Ok(())
    }

    pub fn missing_values(&self) -> &[NaiveDateTime] {
        &self.missing_values
    }

    pub fn set_missing_values(&mut self, values: Vec<NaiveDateTime>) -> SavResult<()> {
        if values.len() > MAX_MISSING_VALUES {
            return Err(SavError::invalid_argument(format!(
                "At most {} missing values are allowed",
                MAX_MISSING_VALUES
            )));
        }
        self.missing_values = values;
        Ok(())
    }

    pub(crate) fn update(&self, file: FileHandle, name: &str) -> SavResult<()> {
        let engine = engine::binding();
        check("set_print_format", engine.set_print_format(file, name, self.format))?;
        check("set_write_format", engine.set_write_format(file, name, self.format))?;
        if !self.missing_values.is_empty() {
            let mut slots = [0.0; 3];
            for (slot, value) in slots.iter_mut().zip(&self.missing_values) {
                *slot = encode_datetime(value)?;
            }
            check(
                "set_numeric_missing_values",
                engine.set_numeric_missing_values(file, name, self.missing_values.len() as i32, slots),
            )?;
        }
        Ok(())
    }

    pub(crate) fn load(file: FileHandle, name: &str, format: FormatSpec) -> SavResult<Self> {
        let (tag, slots) = check("numeric_missing_values", engine::binding().numeric_missing_values(file, name))?;
        let missing_values = match tag {
            MISSING_NONE => Vec::new(),
            1..=3 => slots[..tag as usize]
                .iter()
                .map(|v| decode_datetime(*v))
                .collect::<SavResult<_>>()?,
            // Ranges have no date-time representation here.
            other => {
                let format = other.to_string();
                log_event_with_fields(Event::MissingRangeDropped, &[("variable", name), ("format", &format)]);
                Vec::new()
            }
        };
        Ok(Self { format, missing_values })
    }
}

/// Encodes a date-time as the engine's double: date part plus time of day.
pub fn encode_datetime(value: &NaiveDateTime) -> SavResult<f64> {
    let engine = engine::binding();
    let date = value.date();
    let days = check("convert_date", engine.convert_date(date.day(), date.month(), date.year()))?;

    let time = value.time();
    let seconds = f64::from(time.second()) + f64::from(time.nanosecond() / 1_000_000) / 1000.0;
    let time_of_day = check(
        "convert_time",
        engine.convert_time(0, time.hour(), time.minute(), seconds),
    )?;
    Ok(days + time_of_day)
}

/// Decodes the engine's double into a date-time with millisecond resolution.
pub fn decode_datetime(value: f64) -> SavResult<NaiveDateTime> {
    let engine = engine::binding();
    let (day, month, year) = check("convert_spss_date", engine.convert_spss_date(value))?;
    let (_, hour, minute, second) = check("convert_spss_time", engine.convert_spss_time(value))?;

    let date = NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| SavError::internal(format!("Engine returned invalid date {}-{}-{}", year, month, day)))?;
    let start = date
        .and_hms_opt(hour, minute, 0)
        .ok_or_else(|| SavError::internal(format!("Engine returned invalid time {}:{}", hour, minute)))?;
    let millis = (second * 1000.0).round() as i64;
    Ok(start + Duration::milliseconds(millis))
}
