use std::path::{Path, PathBuf};
use chrono::NaiveDate;
use tracing::debug;

use crate::error::RosterResult;
use crate::form::{append_doctor_to_csv, write_doctors_csv};
use crate::parser::{load_doctors, load_holidays};
use crate::schedule::{Doctor, HolidayRecord};
use super::{MemoryStore, RosterAdmin, RosterStore, SavedAssignment, SavedPreference};

pub const DOCTORS_FILE: &str = "doctors.csv";
pub const HOLIDAYS_FILE: &str = "holidays.json";
pub const HISTORY_FILE: &str = "history.json";
pub const PREFERENCES_FILE: &str = "preferences.json";

/// Store backed by a data directory. Saved assignments are buffered until `commit`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    inner: MemoryStore,
}

fn read_json_list<T: serde::de::DeserializeOwned>(path: &Path) -> RosterResult<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
}

impl FileStore {
    /// Opens `dir`, creating it if needed. Missing files mean an empty roster.
    pub fn open<P: AsRef<Path>>(dir: P) -> RosterResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;

        let doctors_path = dir.join(DOCTORS_FILE);
        let doctors = if doctors_path.exists() { load_doctors(&doctors_path)? } else { Vec::new() };

        let holidays_path = dir.join(HOLIDAYS_FILE);
        let holidays = if holidays_path.exists() { load_holidays(&holidays_path)? } else { Vec::new() };

        let history: Vec<SavedAssignment> = read_json_list(&dir.join(HISTORY_FILE))?;
        let preferences: Vec<SavedPreference> = read_json_list(&dir.join(PREFERENCES_FILE))?;

        debug!(
            dir = %dir.display(),
            doctors = doctors.len(),
            holidays = holidays.len(),
            history = history.len(),
            preferences = preferences.len(),
            "Opened data directory"
        );

        Ok(Self {
            dir,
            inner: MemoryStore::new(doctors, holidays)
                .with_assignments(history)
                .with_preferences(preferences),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn doctors(&self) -> &[Doctor] {
        self.inner.doctors()
    }

    pub fn assignments(&self) -> Vec<&SavedAssignment> {
        self.inner.assignments()
    }

    fn write_history(&self, assignments: &[&SavedAssignment]) -> RosterResult<()> {
        let json = serde_json::to_string_pretty(assignments)?;
        std::fs::write(self.dir.join(HISTORY_FILE), json)?;
        Ok(())
    }

    fn write_preferences(&self) -> RosterResult<()> {
        let json = serde_json::to_string_pretty(&self.inner.preferences())?;
        std::fs::write(self.dir.join(PREFERENCES_FILE), json)?;
        Ok(())
    }
}

impl RosterStore for FileStore {
    fn load_doctors(&self) -> RosterResult<Vec<Doctor>> {
        self.inner.load_doctors()
    }

    fn load_holidays(&self) -> RosterResult<Vec<HolidayRecord>> {
        self.inner.load_holidays()
    }

    fn save_assignment(&mut self, date: NaiveDate, doctor_id: &str) -> RosterResult<()> {
        self.inner.save_assignment(date, doctor_id)
    }

    fn save_holiday_assignment(&mut self, holiday: &str, date: NaiveDate, doctor_id: &str) -> RosterResult<()> {
        self.inner.save_holiday_assignment(holiday, date, doctor_id)
    }

    // Staged entries merge into memory only after the file is written
    fn commit(&mut self) -> RosterResult<()> {
        self.write_history(&self.inner.assignments_with_pending())?;
        self.inner.commit()
    }

    fn rollback(&mut self) {
        self.inner.rollback()
    }
}

impl RosterAdmin for FileStore {
    fn add_doctor(&mut self, doctor: Doctor) -> RosterResult<()> {
        self.inner.add_doctor(doctor.clone())?;
        append_doctor_to_csv(&doctor, &self.dir.join(DOCTORS_FILE))
    }

    fn remove_doctor(&mut self, id: &str) -> RosterResult<()> {
        self.inner.remove_doctor(id)?;
        write_doctors_csv(self.inner.doctors(), &self.dir.join(DOCTORS_FILE))?;
        self.write_history(&self.inner.assignments())?;
        self.write_preferences()
    }

    fn add_holiday(&mut self, record: HolidayRecord) -> RosterResult<()> {
        self.inner.add_holiday(record)?;
        let json = serde_json::to_string_pretty(self.inner.holidays())?;
        std::fs::write(self.dir.join(HOLIDAYS_FILE), json)?;
        Ok(())
    }

    fn set_preference(
        &mut self,
        doctor_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        weight: i64,
    ) -> RosterResult<usize> {
        let touched = self.inner.set_preference(doctor_id, start, end, weight)?;
        self.write_preferences()?;
        Ok(touched)
    }

    fn override_assignment(&mut self, date: NaiveDate, doctor_id: &str) -> RosterResult<SavedAssignment> {
        let saved = self.inner.override_assignment(date, doctor_id)?;
        self.write_history(&self.inner.assignments())?;
        Ok(saved)
    }

    fn assignments_between(&self, start: NaiveDate, end: NaiveDate) -> RosterResult<Vec<SavedAssignment>> {
        self.inner.assignments_between(start, end)
    }
}
