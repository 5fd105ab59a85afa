use std::time::Duration;

use super::types::{PositiveU64, PositiveUsize};
use crate::error::{AppError, AppResult, ValidationError};

pub(super) fn parse_positive_u64(s: &str) -> AppResult<PositiveU64> {
    s.parse::<PositiveU64>().map_err(AppError::from)
}

pub(super) fn parse_positive_usize(s: &str) -> AppResult<PositiveUsize> {
    s.parse::<PositiveUsize>().map_err(AppError::from)
}

pub(super) fn parse_duration_arg(s: &str) -> AppResult<Duration> {
    duration_from_str(s).map_err(AppError::validation)
}

/// Parses `500ms`, `10s`, `2m`, `1h` or a bare millisecond count.
/// Zero durations are rejected.
pub(crate) fn duration_from_str(s: &str) -> Result<Duration, ValidationError> {
    let value = s.trim();
    let split = value
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);

    let count: u64 = match digits.parse() {
        Ok(count) => count,
        Err(_) => return Err(invalid_duration(value)),
    };

    let duration = match unit {
        "" | "ms" => Duration::from_millis(count),
        "s" => Duration::from_secs(count),
        "m" => Duration::from_secs(scale(count, 60, value)?),
        "h" => Duration::from_secs(scale(count, 3600, value)?),
        _ => return Err(invalid_duration(value)),
    };

    if duration.is_zero() {
        return Err(ValidationError::DurationZero);
    }
    Ok(duration)
}

fn scale(count: u64, factor: u64, value: &str) -> Result<u64, ValidationError> {
    count
        .checked_mul(factor)
        .ok_or_else(|| ValidationError::DurationOverflow {
            value: value.to_owned(),
        })
}

fn invalid_duration(value: &str) -> ValidationError {
    ValidationError::InvalidDuration {
        value: value.to_owned(),
    }
}
