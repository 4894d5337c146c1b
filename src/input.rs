//! Typed boundary between raw form values and the estimator.
//!
//! Every string that reaches the estimator passes through here; a value that
//! fails to convert is rejected with an [`InputError`] before any calculation.

use crate::state::Observation;
use thiserror::Error;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const MILLIS_PER_SECOND: i64 = 1_000;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputError {
    #[error("level is not a finite number: {0:?}")]
    InvalidLevel(String),
    #[error("level {0} is outside 0..=100")]
    LevelOutOfRange(f64),
    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),
}

pub fn parse_level(raw: &str) -> Result<f64, InputError> {
    let level: f64 = raw
        .trim()
        .parse()
        .map_err(|_| InputError::InvalidLevel(raw.to_string()))?;
    if !level.is_finite() {
        return Err(InputError::InvalidLevel(raw.to_string()));
    }
    check_level(level)
}

/// Accepts an already numeric level, applying the same range check.
pub fn check_level(level: f64) -> Result<f64, InputError> {
    if !level.is_finite() || !(0.0..=100.0).contains(&level) {
        return Err(InputError::LevelOutOfRange(level));
    }
    Ok(level)
}

pub fn parse_date(raw: &str) -> Result<Date, InputError> {
    Date::parse(raw.trim(), DATE_FORMAT).map_err(|_| InputError::InvalidDate(raw.to_string()))
}

pub fn format_date(date: Date) -> Option<String> {
    date.format(DATE_FORMAT).ok()
}

/// Epoch milliseconds at UTC midnight of `date`.
pub fn date_to_timestamp(date: Date) -> i64 {
    date.midnight().assume_utc().unix_timestamp() * MILLIS_PER_SECOND
}

pub fn timestamp_to_date(timestamp: i64) -> Option<Date> {
    OffsetDateTime::from_unix_timestamp(timestamp.div_euclid(MILLIS_PER_SECOND))
        .ok()
        .map(OffsetDateTime::date)
}

pub fn parse_observation(date: &str, level: &str) -> Result<Observation, InputError> {
    let date = parse_date(date)?;
    let level = parse_level(level)?;
    Ok(Observation::new(date_to_timestamp(date), level))
}
