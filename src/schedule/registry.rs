use std::collections::{BTreeSet, HashMap};
use chrono::NaiveDate;
use crate::error::{RosterError, RosterResult};
use super::types::{Assignment, Doctor, DoctorId};

/// A doctor plus the lookup index over their history
#[derive(Debug, Clone)]
pub struct DoctorRecord {
    pub doctor: Doctor,
    worked: BTreeSet<NaiveDate>,
    holidays: HashMap<String, BTreeSet<NaiveDate>>,
}

impl DoctorRecord {
    fn new(doctor: Doctor) -> Self {
        let Doctor { id, name, rank, mut history, preferences } = doctor;
        let mut record = Self {
            doctor: Doctor { id, name, rank, history: Vec::new(), preferences },
            worked: BTreeSet::new(),
            holidays: HashMap::new(),
        };
        history.sort();
        history.dedup();
        for assignment in history {
            record.push(assignment);
        }
        record
    }

    fn push(&mut self, assignment: Assignment) {
        self.worked.insert(assignment.date);
        if let Some(name) = &assignment.holiday {
            self.holidays.entry(name.clone()).or_default().insert(assignment.date);
        }
        self.doctor.history.push(assignment);
    }

    pub fn id(&self) -> &str {
        &self.doctor.id
    }

    pub fn rank(&self) -> u32 {
        self.doctor.rank
    }

    /// Days to the nearest shift of any kind, in either direction
    pub fn days_to_nearest_shift(&self, date: NaiveDate) -> Option<i64> {
        nearest(&self.worked, date).map(|d| (date - d).num_days().abs())
    }

    /// Nearest date this doctor worked the named holiday
    pub fn nearest_holiday(&self, name: &str, date: NaiveDate) -> Option<NaiveDate> {
        self.holidays.get(name).and_then(|dates| nearest(dates, date))
    }

    /// Preference weight for `date`; 0 when none was recorded
    pub fn preference(&self, date: NaiveDate) -> i64 {
        self.doctor.preferences.get(&date).copied().unwrap_or(0)
    }

    pub fn shift_count(&self) -> usize {
        self.worked.len()
    }

    pub fn holiday_count(&self) -> usize {
        self.holidays.values().map(BTreeSet::len).sum()
    }
}

fn nearest(dates: &BTreeSet<NaiveDate>, date: NaiveDate) -> Option<NaiveDate> {
    let before = dates.range(..=date).next_back();
    let after = dates.range(date..).next();
    match (before, after) {
        (Some(b), Some(a)) => {
            if (date - *b) <= (*a - date) { Some(*b) } else { Some(*a) }
        }
        (Some(b), None) => Some(*b),
        (None, Some(a)) => Some(*a),
        (None, None) => None,
    }
}

/// Arena of doctors for one scheduling run
#[derive(Debug, Clone, Default)]
pub struct PersonRegistry {
    records: Vec<DoctorRecord>,
    by_id: HashMap<DoctorId, usize>,
}

impl PersonRegistry {
    pub fn new(doctors: Vec<Doctor>) -> RosterResult<Self> {
        let mut registry = Self::default();
        for doctor in doctors {
            if registry.by_id.contains_key(&doctor.id) {
                return Err(RosterError::configuration(format!(
                    "duplicate doctor id '{}'",
                    doctor.id
                )));
            }
            registry.by_id.insert(doctor.id.clone(), registry.records.len());
            registry.records.push(DoctorRecord::new(doctor));
        }
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[DoctorRecord] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&DoctorRecord> {
        self.by_id.get(id).map(|&i| &self.records[i])
    }

    pub fn rank_sum(&self) -> i64 {
        self.records.iter().map(|r| i64::from(r.rank())).sum()
    }

    /// Appends to the doctor's history; the only mutation after construction
    pub fn record(&mut self, index: usize, date: NaiveDate, holiday: Option<String>) -> RosterResult<()> {
        let record = self
            .records
            .get_mut(index)
            .ok_or_else(|| RosterError::UnknownDoctor { id: format!("#{}", index) })?;
        record.push(Assignment { date, holiday });
        Ok(())
    }
}
