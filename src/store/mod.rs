//! Collaborators around the scheduling core
//!
//! A [`RosterStore`] loads doctors and holidays before a run and receives one
//! save call per selection afterwards. The core itself performs no I/O.
//!
//! - [`MemoryStore`] keeps everything in memory
//! - [`FileStore`] reads `doctors.csv` and `holidays.json` from a data
//!   directory and persists assignments to `history.json` and preferences
//!   to `preferences.json`

pub mod file;
pub mod memory;

use chrono::{Datelike, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{RosterError, RosterResult};
use crate::schedule::types::year_bounds;
use crate::schedule::{
    build_calendar, AssignmentScheduler, Doctor, DoctorId, HolidayDistance, HolidayRecord, HolidayRegistry,
    OrderingKind, PersonRegistry, PriorityEngine, Schedule, Selected, DEFAULT_RECENCY_WINDOW,
};

pub use file::FileStore;
pub use memory::MemoryStore;

/// Longest date range a single preference call may cover
pub const MAX_PREFERENCE_SPAN_DAYS: i64 = 366;

/// Source of run inputs and sink for its assignments
pub trait RosterStore {
    fn load_doctors(&self) -> RosterResult<Vec<Doctor>>;

    fn load_holidays(&self) -> RosterResult<Vec<HolidayRecord>>;

    fn build_calendar(&self, year: i32) -> RosterResult<Vec<NaiveDate>> {
        Ok(build_calendar(year))
    }

    fn save_assignment(&mut self, date: NaiveDate, doctor_id: &str) -> RosterResult<()>;

    fn save_holiday_assignment(&mut self, holiday: &str, date: NaiveDate, doctor_id: &str) -> RosterResult<()>;

    /// Make everything staged by the save calls visible and durable
    fn commit(&mut self) -> RosterResult<()> {
        Ok(())
    }

    /// Drop everything staged since the last commit
    fn rollback(&mut self) {}
}

/// Roster maintenance used by the HTTP and CLI front ends
pub trait RosterAdmin: RosterStore {
    /// Fails if the id is already taken
    fn add_doctor(&mut self, doctor: Doctor) -> RosterResult<()>;

    /// Also forgets the doctor's assignments and preferences
    fn remove_doctor(&mut self, id: &str) -> RosterResult<()>;

    /// Fails if the record is malformed or its name is taken
    fn add_holiday(&mut self, record: HolidayRecord) -> RosterResult<()>;

    /// Sets the doctor's preference weight on every date in `start..=end`.
    /// A weight of 0 clears it. Returns the number of dates touched.
    fn set_preference(
        &mut self,
        doctor_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        weight: i64,
    ) -> RosterResult<usize>;

    /// Replaces whoever holds `date` with `doctor_id`, keeping the date's holiday
    fn override_assignment(&mut self, date: NaiveDate, doctor_id: &str) -> RosterResult<SavedAssignment>;

    /// Stored assignments in `start..=end`, ascending by date
    fn assignments_between(&self, start: NaiveDate, end: NaiveDate) -> RosterResult<Vec<SavedAssignment>>;
}

/// A persisted assignment; one per date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedAssignment {
    pub date: NaiveDate,
    pub doctor_id: DoctorId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holiday: Option<String>,
}

/// A persisted preference weight for one doctor and date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPreference {
    pub doctor_id: DoctorId,
    pub date: NaiveDate,
    pub weight: i64,
}

/// Rejects reversed or overly long ranges before anything is expanded
pub fn check_date_range(start: NaiveDate, end: NaiveDate) -> RosterResult<()> {
    if end < start {
        return Err(RosterError::configuration(format!("range ends ({}) before it starts ({})", end, start)));
    }
    if (end - start).num_days() >= MAX_PREFERENCE_SPAN_DAYS {
        return Err(RosterError::configuration(format!(
            "range {}..{} is longer than {} days",
            start, end, MAX_PREFERENCE_SPAN_DAYS
        )));
    }
    Ok(())
}

/// Tunables for a single run
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub recency_window: i64,
    pub holiday_distance: HolidayDistance,
    pub ordering: OrderingKind,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            recency_window: DEFAULT_RECENCY_WINDOW,
            holiday_distance: HolidayDistance::Occurrences,
            ordering: OrderingKind::RankSum,
        }
    }
}

/// Loads inputs, builds the year and persists every selection.
///
/// History already stored for `year` is ignored, so re-running a year
/// replaces it instead of penalising doctors for their own previous roster.
/// If any save fails the staged selections are rolled back.
pub fn run_scheduling_for_year<S, R>(
    store: &mut S,
    year: i32,
    rng: &mut R,
    options: RunOptions,
) -> RosterResult<Schedule>
where
    S: RosterStore + ?Sized,
    R: Rng + ?Sized,
{
    if year_bounds(year).is_none() {
        return Err(RosterError::incomplete_year(year, "year is outside the supported date range"));
    }

    let mut doctors = store.load_doctors()?;
    for doctor in &mut doctors {
        doctor.history.retain(|a| a.date.year() != year);
    }
    let holidays = HolidayRegistry::from_records(&store.load_holidays()?)?;
    let calendar = store.build_calendar(year)?;

    let people = PersonRegistry::new(doctors)?;
    let engine = PriorityEngine::new(options.recency_window, options.holiday_distance);
    let run = AssignmentScheduler::new(year, &calendar, people, &holidays, engine)?
        .with_ordering(options.ordering.build())
        .run(rng)?;

    if let Err(err) = persist(store, &run.selections) {
        warn!(year, error = %err, "Persisting schedule failed, rolling back");
        store.rollback();
        return Err(err);
    }

    info!(year, saved = run.selections.len(), "Persisted schedule");
    Ok(run.schedule)
}

fn persist<S: RosterStore + ?Sized>(store: &mut S, selections: &[Selected]) -> RosterResult<()> {
    for selected in selections {
        match &selected.holiday {
            Some(name) => store.save_holiday_assignment(name, selected.date, &selected.doctor)?,
            None => store.save_assignment(selected.date, &selected.doctor)?,
        }
    }
    store.commit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RosterError;
    use crate::schedule::Assignment;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_run_persists_every_day() {
        let mut store = MemoryStore::new(
            vec![Doctor::new("a", "A", 1), Doctor::new("b", "B", 2)],
            vec![HolidayRecord { name: "NewYear".into(), month: Some(1), day: Some(1), dates: None }],
        );
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let schedule = run_scheduling_for_year(&mut store, 2025, &mut rng, RunOptions::default()).unwrap();

        assert!(schedule.is_complete());
        assert_eq!(store.assignments().len(), 365);
        let assignments = store.assignments();
        let new_year = assignments.iter().find(|s| s.date == date(2025, 1, 1)).unwrap();
        assert_eq!(new_year.holiday.as_deref(), Some("NewYear"));
    }

    #[test]
    fn test_rerun_ignores_same_year_history() {
        let mut a = Doctor::new("a", "A", 1);
        a.history = vec![Assignment { date: date(2025, 1, 2), holiday: None }];
        let mut store = MemoryStore::new(vec![a, Doctor::new("b", "B", 1)], vec![]);

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let schedule = run_scheduling_for_year(&mut store, 2025, &mut rng, RunOptions::default()).unwrap();
        assert_eq!(schedule.days.len(), 365);

        let doctors = store.load_doctors().unwrap();
        let on_jan_2: usize = doctors
            .iter()
            .map(|d| d.history.iter().filter(|h| h.date == date(2025, 1, 2)).count())
            .sum();
        assert_eq!(on_jan_2, 1);
    }

    #[test]
    fn test_zero_doctors_saves_nothing() {
        let mut store = MemoryStore::new(vec![], vec![]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = run_scheduling_for_year(&mut store, 2025, &mut rng, RunOptions::default()).unwrap_err();
        assert!(matches!(err, RosterError::EmptyCandidateSet { .. }));
        assert!(store.assignments().is_empty());
    }

    #[test]
    fn test_unsupported_year_rejected_up_front() {
        let mut store = MemoryStore::new(vec![Doctor::new("a", "A", 1)], vec![]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = run_scheduling_for_year(&mut store, 300_000, &mut rng, RunOptions::default()).unwrap_err();
        assert!(matches!(err, RosterError::IncompleteYear { year: 300_000, .. }));
        assert!(store.assignments().is_empty());
    }

    /// Delegates to a MemoryStore but fails once `saves_left` runs out
    struct FailingStore {
        inner: MemoryStore,
        saves_left: usize,
    }

    impl FailingStore {
        fn tick(&mut self) -> RosterResult<()> {
            if self.saves_left == 0 {
                return Err(RosterError::storage("save", "disk full"));
            }
            self.saves_left -= 1;
            Ok(())
        }
    }

    impl RosterStore for FailingStore {
        fn load_doctors(&self) -> RosterResult<Vec<Doctor>> {
            self.inner.load_doctors()
        }

        fn load_holidays(&self) -> RosterResult<Vec<HolidayRecord>> {
            self.inner.load_holidays()
        }

        fn save_assignment(&mut self, date: NaiveDate, doctor_id: &str) -> RosterResult<()> {
            self.tick()?;
            self.inner.save_assignment(date, doctor_id)
        }

        fn save_holiday_assignment(&mut self, holiday: &str, date: NaiveDate, doctor_id: &str) -> RosterResult<()> {
            self.tick()?;
            self.inner.save_holiday_assignment(holiday, date, doctor_id)
        }

        fn commit(&mut self) -> RosterResult<()> {
            self.inner.commit()
        }

        fn rollback(&mut self) {
            self.inner.rollback()
        }
    }

    #[test]
    fn test_failed_save_keeps_previous_year_intact() {
        let mut inner = MemoryStore::new(vec![Doctor::new("a", "A", 1), Doctor::new("b", "B", 1)], vec![]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        run_scheduling_for_year(&mut inner, 2025, &mut rng, RunOptions::default()).unwrap();
        let before: Vec<SavedAssignment> = inner.assignments().into_iter().cloned().collect();

        let mut store = FailingStore { inner, saves_left: 100 };
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let err = run_scheduling_for_year(&mut store, 2025, &mut rng, RunOptions::default()).unwrap_err();
        assert!(err.is_retryable());

        store.inner.commit().unwrap();
        let after: Vec<SavedAssignment> = store.inner.assignments().into_iter().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_check_date_range() {
        assert!(check_date_range(date(2025, 1, 1), date(2025, 1, 1)).is_ok());
        assert!(check_date_range(date(2025, 1, 1), date(2025, 12, 31)).is_ok());
        assert!(check_date_range(date(2025, 1, 2), date(2025, 1, 1)).is_err());
        assert!(check_date_range(date(2025, 1, 1), date(2027, 1, 1)).is_err());
    }

    #[test]
    fn test_malformed_holiday_is_configuration_error() {
        let mut store = MemoryStore::new(
            vec![Doctor::new("a", "A", 1)],
            vec![HolidayRecord { name: "Broken".into(), ..Default::default() }],
        );
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = run_scheduling_for_year(&mut store, 2025, &mut rng, RunOptions::default()).unwrap_err();
        assert!(matches!(err, RosterError::Configuration { .. }));
    }
}
