//! Date and time-of-day conversions for the engine's double encoding.
//!
//! Date values are seconds since 1582-10-14 00:00:00 (proleptic Gregorian).
//! Time values are seconds, with whole days allowed for duration formats.

use chrono::{Datelike, NaiveDate};

use super::codes::ReturnCode;

const SECONDS_PER_DAY: f64 = 86_400.0;

fn epoch() -> NaiveDate {
    // 1582-10-14 is always representable; the fallback keeps this total.
    NaiveDate::from_ymd_opt(1582, 10, 14).unwrap_or(NaiveDate::MIN)
}

/// Encodes a calendar date as seconds since the epoch.
pub fn date_to_seconds(day: u32, month: u32, year: i32) -> Result<f64, ReturnCode> {
    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(ReturnCode::InvalidDate)?;
    let days = date.signed_duration_since(epoch()).num_days();
    if days < 0 {
        return Err(ReturnCode::InvalidDate);
    }
    Ok(days as f64 * SECONDS_PER_DAY)
}

/// Decodes seconds since the epoch into (day, month, year).
///
/// Any time-of-day part is discarded.
pub fn seconds_to_date(value: f64) -> Result<(u32, u32, i32), ReturnCode> {
    if !value.is_finite() || value < 0.0 {
        return Err(ReturnCode::InvalidDate);
    }
    let days = (value / SECONDS_PER_DAY).floor();
    // Beyond chrono's calendar range.
    if days > 100_000_000.0 {
        return Err(ReturnCode::InvalidDate);
    }
    let date = epoch()
        .checked_add_signed(chrono::Duration::days(days as i64))
        .ok_or(ReturnCode::InvalidDate)?;
    Ok((date.day(), date.month(), date.year()))
}

/// Encodes a duration of days, hours, minutes and (fractional) seconds.
pub fn time_to_seconds(day: i64, hour: u32, minute: u32, second: f64) -> Result<f64, ReturnCode> {
    if hour >= 24 || minute >= 60 || !(0.0..60.0).contains(&second) {
        return Err(ReturnCode::InvalidTime);
    }
    Ok(day as f64 * SECONDS_PER_DAY + f64::from(hour) * 3600.0 + f64::from(minute) * 60.0 + second)
}

/// Decodes seconds into (days, hour, minute, fractional second).
pub fn seconds_to_time(value: f64) -> Result<(i64, u32, u32, f64), ReturnCode> {
    if !value.is_finite() {
        return Err(ReturnCode::InvalidTime);
    }
    let days = (value / SECONDS_PER_DAY).floor();
    let mut remainder = value - days * SECONDS_PER_DAY;
    let hour = (remainder / 3600.0).floor();
    remainder -= hour * 3600.0;
    let minute = (remainder / 60.0).floor();
    let second = remainder - minute * 60.0;
    Ok((days as i64, hour as u32, minute as u32, second))
}
