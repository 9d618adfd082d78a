use std::collections::{BTreeSet, HashSet};
use chrono::NaiveDate;
use crate::error::{RosterError, RosterResult};
use super::types::{HolidayDescriptor, HolidayRecord, Recurrence};

/// Validated set of holidays, looked up by date
#[derive(Debug, Clone, Default)]
pub struct HolidayRegistry {
    holidays: Vec<HolidayDescriptor>, // registration order decides overlaps
}

impl HolidayRegistry {
    /// Validates raw records; every record needs exactly one recurrence form
    pub fn from_records(records: &[HolidayRecord]) -> RosterResult<Self> {
        let mut seen = HashSet::new();
        let mut holidays = Vec::with_capacity(records.len());

        for record in records {
            let descriptor = validate_record(record)?;
            if !seen.insert(descriptor.name.clone()) {
                return Err(RosterError::configuration(format!(
                    "duplicate holiday name '{}'",
                    descriptor.name
                )));
            }
            holidays.push(descriptor);
        }

        Ok(Self { holidays })
    }

    pub fn resolve(&self, date: NaiveDate) -> Option<&HolidayDescriptor> {
        self.holidays.iter().find(|h| h.matches(date))
    }

    pub fn get(&self, name: &str) -> Option<&HolidayDescriptor> {
        self.holidays.iter().find(|h| h.name == name)
    }

    /// Every holiday date in `year`, ascending. Overlapping dates resolve to one holiday.
    pub fn holidays_in_year(&self, year: i32) -> Vec<(NaiveDate, &HolidayDescriptor)> {
        let dates: BTreeSet<NaiveDate> = self
            .holidays
            .iter()
            .flat_map(|h| h.dates_in_year(year))
            .collect();
        dates
            .into_iter()
            .filter_map(|d| self.resolve(d).map(|h| (d, h)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.holidays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holidays.is_empty()
    }
}

fn validate_record(record: &HolidayRecord) -> RosterResult<HolidayDescriptor> {
    let name = record.name.trim();
    if name.is_empty() {
        return Err(RosterError::configuration("holiday name is required"));
    }

    let has_fixed = record.month.is_some() || record.day.is_some();
    let recurrence = match (has_fixed, &record.dates) {
        (true, Some(_)) => {
            return Err(RosterError::configuration(format!(
                "holiday '{}' has both a fixed date and a date list",
                name
            )))
        }
        (false, None) => {
            return Err(RosterError::configuration(format!(
                "holiday '{}' has neither a fixed date nor a date list",
                name
            )))
        }
        (true, None) => {
            let (month, day) = match (record.month, record.day) {
                (Some(m), Some(d)) => (m, d),
                _ => {
                    return Err(RosterError::configuration(format!(
                        "holiday '{}' needs both month and day",
                        name
                    )))
                }
            };
            // 2000 is a leap year, so Feb 29 is accepted here
            if NaiveDate::from_ymd_opt(2000, month, day).is_none() {
                return Err(RosterError::configuration(format!(
                    "holiday '{}' has invalid month/day {}/{}",
                    name, month, day
                )));
            }
            Recurrence::Fixed { month, day }
        }
        (false, Some(dates)) => {
            if dates.is_empty() {
                return Err(RosterError::configuration(format!(
                    "holiday '{}' has an empty date list",
                    name
                )));
            }
            Recurrence::Dates(dates.iter().copied().collect())
        }
    };

    Ok(HolidayDescriptor {
        name: name.to_string(),
        recurrence,
    })
}
