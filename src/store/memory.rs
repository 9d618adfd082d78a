use std::collections::BTreeMap;
use chrono::NaiveDate;
use tracing::warn;

use crate::error::{RosterError, RosterResult};
use crate::schedule::{Assignment, Doctor, HolidayRecord, HolidayRegistry};
use super::{check_date_range, RosterAdmin, RosterStore, SavedAssignment, SavedPreference};

/// Store kept entirely in memory. Assignments are keyed by date, so saving a
/// date twice keeps only the latest doctor. Saves are staged until `commit`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    doctors: Vec<Doctor>,
    holidays: Vec<HolidayRecord>,
    ledger: BTreeMap<NaiveDate, SavedAssignment>,
    pending: BTreeMap<NaiveDate, SavedAssignment>,
}

impl MemoryStore {
    /// Doctor histories are moved into the date ledger
    pub fn new(doctors: Vec<Doctor>, holidays: Vec<HolidayRecord>) -> Self {
        let mut store = Self {
            holidays,
            ..Self::default()
        };
        for mut doctor in doctors {
            for assignment in std::mem::take(&mut doctor.history) {
                store.ledger.insert(
                    assignment.date,
                    SavedAssignment {
                        date: assignment.date,
                        doctor_id: doctor.id.clone(),
                        holiday: assignment.holiday,
                    },
                );
            }
            store.doctors.push(doctor);
        }
        store
    }

    pub fn with_assignments(mut self, assignments: Vec<SavedAssignment>) -> Self {
        for assignment in assignments {
            self.ledger.insert(assignment.date, assignment);
        }
        self
    }

    /// Applies saved preferences; entries for unknown doctors are skipped
    pub fn with_preferences(mut self, preferences: Vec<SavedPreference>) -> Self {
        for pref in preferences {
            match self.doctors.iter_mut().find(|d| d.id == pref.doctor_id) {
                Some(doctor) if pref.weight != 0 => {
                    doctor.preferences.insert(pref.date, pref.weight);
                }
                Some(_) => {}
                None => warn!(doctor = %pref.doctor_id, "Skipping preference for unknown doctor"),
            }
        }
        self
    }

    /// Committed assignments, ascending by date
    pub fn assignments(&self) -> Vec<&SavedAssignment> {
        self.ledger.values().collect()
    }

    /// Committed assignments with anything staged laid over them
    pub fn assignments_with_pending(&self) -> Vec<&SavedAssignment> {
        let mut merged: BTreeMap<NaiveDate, &SavedAssignment> = self.ledger.iter().map(|(d, a)| (*d, a)).collect();
        merged.extend(self.pending.iter().map(|(d, a)| (*d, a)));
        merged.into_values().collect()
    }

    pub fn preferences(&self) -> Vec<SavedPreference> {
        self.doctors
            .iter()
            .flat_map(|d| {
                d.preferences.iter().map(|(date, weight)| SavedPreference {
                    doctor_id: d.id.clone(),
                    date: *date,
                    weight: *weight,
                })
            })
            .collect()
    }

    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    pub fn holidays(&self) -> &[HolidayRecord] {
        &self.holidays
    }

    fn ensure_doctor(&self, doctor_id: &str) -> RosterResult<()> {
        if !self.doctors.iter().any(|d| d.id == doctor_id) {
            return Err(RosterError::UnknownDoctor { id: doctor_id.to_string() });
        }
        Ok(())
    }

    fn stage(&mut self, date: NaiveDate, doctor_id: &str, holiday: Option<String>) -> RosterResult<()> {
        self.ensure_doctor(doctor_id)?;
        self.pending.insert(
            date,
            SavedAssignment {
                date,
                doctor_id: doctor_id.to_string(),
                holiday,
            },
        );
        Ok(())
    }
}

impl RosterStore for MemoryStore {
    fn load_doctors(&self) -> RosterResult<Vec<Doctor>> {
        let mut doctors = self.doctors.clone();
        for saved in self.ledger.values() {
            if let Some(doctor) = doctors.iter_mut().find(|d| d.id == saved.doctor_id) {
                doctor.history.push(Assignment {
                    date: saved.date,
                    holiday: saved.holiday.clone(),
                });
            }
        }
        Ok(doctors)
    }

    fn load_holidays(&self) -> RosterResult<Vec<HolidayRecord>> {
        Ok(self.holidays.clone())
    }

    fn save_assignment(&mut self, date: NaiveDate, doctor_id: &str) -> RosterResult<()> {
        self.stage(date, doctor_id, None)
    }

    fn save_holiday_assignment(&mut self, holiday: &str, date: NaiveDate, doctor_id: &str) -> RosterResult<()> {
        self.stage(date, doctor_id, Some(holiday.to_string()))
    }

    fn commit(&mut self) -> RosterResult<()> {
        self.ledger.append(&mut self.pending);
        Ok(())
    }

    fn rollback(&mut self) {
        self.pending.clear();
    }
}

impl RosterAdmin for MemoryStore {
    fn add_doctor(&mut self, doctor: Doctor) -> RosterResult<()> {
        if self.doctors.iter().any(|d| d.id == doctor.id) {
            return Err(RosterError::configuration(format!("doctor '{}' already exists", doctor.id)));
        }
        self.doctors.push(Doctor { history: Vec::new(), ..doctor });
        Ok(())
    }

    fn remove_doctor(&mut self, id: &str) -> RosterResult<()> {
        let before = self.doctors.len();
        self.doctors.retain(|d| d.id != id);
        if self.doctors.len() == before {
            return Err(RosterError::UnknownDoctor { id: id.to_string() });
        }
        self.ledger.retain(|_, saved| saved.doctor_id != id);
        self.pending.retain(|_, saved| saved.doctor_id != id);
        Ok(())
    }

    fn add_holiday(&mut self, record: HolidayRecord) -> RosterResult<()> {
        let mut candidate = self.holidays.clone();
        candidate.push(record);
        HolidayRegistry::from_records(&candidate)?;
        self.holidays = candidate;
        Ok(())
    }

    fn set_preference(
        &mut self,
        doctor_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        weight: i64,
    ) -> RosterResult<usize> {
        check_date_range(start, end)?;
        let doctor = self
            .doctors
            .iter_mut()
            .find(|d| d.id == doctor_id)
            .ok_or_else(|| RosterError::UnknownDoctor { id: doctor_id.to_string() })?;

        let mut touched = 0;
        for date in start.iter_days().take_while(|d| *d <= end) {
            if weight == 0 {
                doctor.preferences.remove(&date);
            } else {
                doctor.preferences.insert(date, weight);
            }
            touched += 1;
        }
        Ok(touched)
    }

    fn override_assignment(&mut self, date: NaiveDate, doctor_id: &str) -> RosterResult<SavedAssignment> {
        self.ensure_doctor(doctor_id)?;
        let holidays = HolidayRegistry::from_records(&self.holidays)?;
        let saved = SavedAssignment {
            date,
            doctor_id: doctor_id.to_string(),
            holiday: holidays.resolve(date).map(|h| h.name.clone()),
        };
        self.ledger.insert(date, saved.clone());
        Ok(saved)
    }

    fn assignments_between(&self, start: NaiveDate, end: NaiveDate) -> RosterResult<Vec<SavedAssignment>> {
        if end < start {
            return Err(RosterError::configuration(format!("range ends ({}) before it starts ({})", end, start)));
        }
        Ok(self.ledger.range(start..=end).map(|(_, saved)| saved.clone()).collect())
    }
}
