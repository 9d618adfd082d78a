use std::collections::{BTreeMap, BTreeSet};
use chrono::NaiveDate;
use serde::{Serialize, Deserialize};

pub type DoctorId = String;

/// A single worked shift in a doctor's history
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Assignment {
    pub date: NaiveDate,
    pub holiday: Option<String>,
}

/// A doctor as supplied by the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: DoctorId,
    pub name: String,
    pub rank: u32,
    #[serde(default)]
    pub history: Vec<Assignment>,
    /// Per-date weight added to priority. Positive avoids the date, negative asks for it.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub preferences: BTreeMap<NaiveDate, i64>,
}

impl Doctor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, rank: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            rank,
            history: Vec::new(),
            preferences: BTreeMap::new(),
        }
    }

    /// Rank 0 marks a doctor who never works holidays
    pub fn is_holiday_exempt(&self) -> bool {
        self.rank == 0
    }
}

/// Raw holiday as stored on disk; validated into a `HolidayDescriptor`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HolidayRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dates: Option<Vec<NaiveDate>>,
}

/// How a holiday recurs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recurrence {
    /// Same month and day every year
    Fixed { month: u32, day: u32 },
    /// Explicit list of dates
    Dates(BTreeSet<NaiveDate>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolidayDescriptor {
    pub name: String,
    pub recurrence: Recurrence,
}

impl HolidayDescriptor {
    pub fn matches(&self, date: NaiveDate) -> bool {
        use chrono::Datelike;
        match &self.recurrence {
            Recurrence::Fixed { month, day } => date.month() == *month && date.day() == *day,
            Recurrence::Dates(dates) => dates.contains(&date),
        }
    }

    /// Dates this holiday falls on within `year`
    pub fn dates_in_year(&self, year: i32) -> Vec<NaiveDate> {
        match &self.recurrence {
            Recurrence::Fixed { month, day } => {
                NaiveDate::from_ymd_opt(year, *month, *day).into_iter().collect()
            }
            Recurrence::Dates(dates) => match year_bounds(year) {
                Some((start, end)) => dates.range(start..=end).copied().collect(),
                None => Vec::new(),
            },
        }
    }

    /// Number of occurrences in the half-open range (after, up_to]
    pub fn occurrences_between(&self, after: NaiveDate, up_to: NaiveDate) -> i64 {
        use chrono::Datelike;
        if up_to <= after {
            return 0;
        }
        match &self.recurrence {
            Recurrence::Fixed { month, day } => (after.year()..=up_to.year())
                .filter_map(|y| NaiveDate::from_ymd_opt(y, *month, *day))
                .filter(|d| *d > after && *d <= up_to)
                .count() as i64,
            Recurrence::Dates(dates) => dates
                .range((std::ops::Bound::Excluded(after), std::ops::Bound::Included(up_to)))
                .count() as i64,
        }
    }
}

/// One calendar day of a roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleDay {
    pub date: NaiveDate,
    pub holiday: Option<String>,
    pub doctor: Option<DoctorId>,
}

impl ScheduleDay {
    pub fn is_holiday(&self) -> bool {
        self.holiday.is_some()
    }
}

/// Full-year roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub year: i32,
    pub days: Vec<ScheduleDay>, // ascending, one per date
    pub holidays_assigned: BTreeSet<String>,
}

impl Schedule {
    pub fn day(&self, date: NaiveDate) -> Option<&ScheduleDay> {
        self.days
            .binary_search_by_key(&date, |d| d.date)
            .ok()
            .map(|i| &self.days[i])
    }

    pub fn doctor_on(&self, date: NaiveDate) -> Option<&str> {
        self.day(date).and_then(|d| d.doctor.as_deref())
    }

    pub fn is_complete(&self) -> bool {
        self.days.iter().all(|d| d.doctor.is_some())
    }

    pub fn unfilled(&self) -> usize {
        self.days.iter().filter(|d| d.doctor.is_none()).count()
    }
}

/// First and last day of a year; `None` outside the representable range
pub fn year_bounds(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)?;
    let end = NaiveDate::from_ymd_opt(year, 12, 31)?;
    Some((start, end))
}
