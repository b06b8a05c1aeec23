//! Date and time tokens in the shapes observed across station files.
//!
//! Older files write `2012-03-05` and `12:00`; the automatic-station exports
//! from 2019 on write `2019/01/01` and `0000 UTC`, and their founding-date
//! header uses `05/03/12`.

use crate::error::FormatError;
use crate::utils::constants::TWO_DIGIT_YEAR_PIVOT;
use chrono::{NaiveDate, NaiveTime};

/// Parse a date in any of `YYYY-MM-DD`, `YYYY/MM/DD` or `DD/MM/YY`.
pub fn parse_date(token: &str) -> Result<NaiveDate, FormatError> {
    let token = token.trim();
    let invalid = || FormatError::InvalidDate(token.to_string());

    if token.contains('-') {
        return NaiveDate::parse_from_str(token, "%Y-%m-%d").map_err(|_| invalid());
    }

    if !token.contains('/') {
        return Err(invalid());
    }

    match token.split('/').next().map(str::len) {
        Some(4) => NaiveDate::parse_from_str(token, "%Y/%m/%d").map_err(|_| invalid()),
        Some(1) | Some(2) => parse_day_first_short_year(token).ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

/// `DD/MM/YY`, where years below the pivot land in the 2000s.
fn parse_day_first_short_year(token: &str) -> Option<NaiveDate> {
    let mut parts = token.split('/');
    let day = parts.next()?.parse::<u32>().ok()?;
    let month = parts.next()?.parse::<u32>().ok()?;
    let year_part = parts.next()?;
    if parts.next().is_some() || year_part.len() != 2 {
        return None;
    }
    let short_year = year_part.parse::<i32>().ok()?;

    let year = if short_year < TWO_DIGIT_YEAR_PIVOT {
        2000 + short_year
    } else {
        1900 + short_year
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse a time in `HH:MM`, `HH:MM:SS` or compact `HHMM`, with an optional
/// zone marker suffix such as `UTC`.
pub fn parse_time(token: &str) -> Result<NaiveTime, FormatError> {
    let token = token.trim();
    let invalid = || FormatError::InvalidTime(token.to_string());

    let clock = token
        .split_whitespace()
        .next()
        .unwrap_or("")
        .trim_end_matches(|c: char| c.is_ascii_alphabetic());

    if clock.contains(':') {
        return NaiveTime::parse_from_str(clock, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(clock, "%H:%M:%S"))
            .map_err(|_| invalid());
    }

    if clock.len() != 4 || !clock.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let hours = clock[..2].parse::<u32>().map_err(|_| invalid())?;
    let minutes = clock[2..].parse::<u32>().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hours, minutes, 0).ok_or_else(invalid)
}
