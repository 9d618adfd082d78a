use chrono::{Datelike, NaiveDate};
use crate::error::{RosterError, RosterResult};
use super::types::year_bounds;

/// Every date of `year`. Empty when the year cannot be represented.
pub fn build_calendar(year: i32) -> Vec<NaiveDate> {
    match year_bounds(year) {
        Some((start, end)) => start.iter_days().take_while(|d| *d <= end).collect(),
        None => Vec::new(),
    }
}

/// Checks that `dates` covers exactly `year`: ascending, no gaps, no repeats
pub fn validate_calendar(year: i32, dates: &[NaiveDate]) -> RosterResult<()> {
    let (start, end) = year_bounds(year)
        .ok_or_else(|| RosterError::incomplete_year(year, "year is outside the supported date range"))?;

    let (first, last) = match (dates.first(), dates.last()) {
        (Some(f), Some(l)) => (*f, *l),
        _ => return Err(RosterError::incomplete_year(year, "calendar is empty")),
    };
    if first != start {
        return Err(RosterError::incomplete_year(year, format!("starts on {} instead of {}", first, start)));
    }
    if last != end {
        return Err(RosterError::incomplete_year(year, format!("ends on {} instead of {}", last, end)));
    }

    for pair in dates.windows(2) {
        if pair[0].succ_opt() != Some(pair[1]) {
            return Err(RosterError::incomplete_year(
                year,
                format!("{} is not followed by the next day (got {})", pair[0], pair[1]),
            ));
        }
    }

    let expected = if NaiveDate::from_ymd_opt(year, 2, 29).is_some() { 366 } else { 365 };
    if dates.len() != expected || dates.iter().any(|d| d.year() != year) {
        return Err(RosterError::incomplete_year(year, format!("{} dates, expected {}", dates.len(), expected)));
    }

    Ok(())
}
