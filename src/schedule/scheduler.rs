use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};
use std::fmt;
use chrono::NaiveDate;
use rand::Rng;
use serde::{Serialize, Deserialize};
use tracing::{debug, info, warn};
use crate::error::{RosterError, RosterResult};
use super::calendar::validate_calendar;
use super::holidays::HolidayRegistry;
use super::priority::PriorityEngine;
use super::registry::PersonRegistry;
use super::selector::select;
use super::types::{DoctorId, Schedule, ScheduleDay};

/// Decides which pending day is filled next: largest key first, earlier date on ties
pub trait DayOrdering {
    fn key(&self, date: NaiveDate, people: &PersonRegistry) -> i64;
}

impl<F> DayOrdering for F
where
    F: Fn(NaiveDate, &PersonRegistry) -> i64,
{
    fn key(&self, date: NaiveDate, people: &PersonRegistry) -> i64 {
        self(date, people)
    }
}

/// Sum of every doctor's base rank.
///
/// The key is identical for every day, so the fill order collapses to
/// calendar order through the tie rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct RankSum;

impl DayOrdering for RankSum {
    fn key(&self, _date: NaiveDate, people: &PersonRegistry) -> i64 {
        people.rank_sum()
    }
}

/// Plain calendar order
#[derive(Debug, Clone, Copy, Default)]
pub struct Chronological;

impl DayOrdering for Chronological {
    fn key(&self, date: NaiveDate, _people: &PersonRegistry) -> i64 {
        use chrono::Datelike;
        -i64::from(date.num_days_from_ce())
    }
}

/// Named orderings selectable from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderingKind {
    #[default]
    RankSum,
    Chronological,
}

impl OrderingKind {
    pub fn build(self) -> Box<dyn DayOrdering + Send + Sync> {
        match self {
            Self::RankSum => Box::new(RankSum),
            Self::Chronological => Box::new(Chronological),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Uninitialized,
    HolidaysAssigned,
    Filling,
    Complete,
}

impl SchedulerState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::HolidaysAssigned => "holidays-assigned",
            Self::Filling => "filling",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One successful selection, in the order it was made
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selected {
    pub date: NaiveDate,
    pub doctor: DoctorId,
    pub holiday: Option<String>,
    pub priority: i64,
}

/// Builds one year's roster. Owns the run state; discard it when done.
pub struct AssignmentScheduler<'a> {
    holidays: &'a HolidayRegistry,
    people: PersonRegistry,
    schedule: Schedule,
    engine: PriorityEngine,
    ordering: Box<dyn DayOrdering + Send + Sync>,
    state: SchedulerState,
    selections: Vec<Selected>,
}

impl<'a> AssignmentScheduler<'a> {
    /// `dates` must be exactly the days of `year`
    pub fn new(
        year: i32,
        dates: &[NaiveDate],
        people: PersonRegistry,
        holidays: &'a HolidayRegistry,
        engine: PriorityEngine,
    ) -> RosterResult<Self> {
        validate_calendar(year, dates)?;

        let days = dates
            .iter()
            .map(|&date| ScheduleDay {
                date,
                holiday: holidays.resolve(date).map(|h| h.name.clone()),
                doctor: None,
            })
            .collect();

        Ok(Self {
            holidays,
            people,
            schedule: Schedule {
                year,
                days,
                holidays_assigned: BTreeSet::new(),
            },
            engine,
            ordering: Box::new(RankSum),
            state: SchedulerState::Uninitialized,
            selections: Vec::new(),
        })
    }

    pub fn with_ordering(mut self, ordering: Box<dyn DayOrdering + Send + Sync>) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn people(&self) -> &PersonRegistry {
        &self.people
    }

    pub fn selections(&self) -> &[Selected] {
        &self.selections
    }

    fn expect_state(&self, expected: SchedulerState) -> RosterResult<()> {
        if self.state != expected {
            return Err(RosterError::State {
                current: self.state.name(),
                expected: expected.name(),
            });
        }
        Ok(())
    }

    fn ensure_doctors(&self) -> RosterResult<()> {
        if self.people.is_empty() {
            let date = self
                .schedule
                .days
                .first()
                .map(|d| d.date)
                .unwrap_or(NaiveDate::MIN);
            return Err(RosterError::EmptyCandidateSet { date });
        }
        Ok(())
    }

    /// Uninitialized -> HolidaysAssigned. Returns the number of holidays filled.
    pub fn assign_holidays<R: Rng + ?Sized>(&mut self, rng: &mut R) -> RosterResult<usize> {
        self.expect_state(SchedulerState::Uninitialized)?;
        self.ensure_doctors()?;

        let holiday_days: Vec<usize> = self
            .schedule
            .days
            .iter()
            .enumerate()
            .filter(|(_, d)| d.is_holiday())
            .map(|(i, _)| i)
            .collect();

        for &index in &holiday_days {
            self.fill_day(index, rng)?;
        }

        self.state = SchedulerState::HolidaysAssigned;
        Ok(holiday_days.len())
    }

    /// HolidaysAssigned -> Filling -> Complete. Returns the number of days filled.
    pub fn fill<R: Rng + ?Sized>(&mut self, rng: &mut R) -> RosterResult<usize> {
        self.expect_state(SchedulerState::HolidaysAssigned)?;
        self.ensure_doctors()?;

        let mut pending: BinaryHeap<(i64, Reverse<usize>)> = self
            .schedule
            .days
            .iter()
            .enumerate()
            .filter(|(_, d)| !d.is_holiday() && d.doctor.is_none())
            .map(|(i, d)| (self.ordering.key(d.date, &self.people), Reverse(i)))
            .collect();

        if pending.is_empty() {
            return Err(RosterError::NoSchedulableDays {
                year: self.schedule.year,
            });
        }

        self.state = SchedulerState::Filling;
        let mut filled = 0;
        while let Some((_, Reverse(index))) = pending.pop() {
            self.fill_day(index, rng)?;
            filled += 1;
        }

        self.state = SchedulerState::Complete;
        Ok(filled)
    }

    /// Runs every stage and hands back the finished schedule
    pub fn run<R: Rng + ?Sized>(mut self, rng: &mut R) -> RosterResult<ScheduleRun> {
        info!(
            year = self.schedule.year,
            doctors = self.people.len(),
            holidays = self.holidays.len(),
            "Building on-call schedule"
        );

        let holidays = self.assign_holidays(rng)?;
        let regular = self.fill(rng)?;

        info!(
            year = self.schedule.year,
            holidays,
            regular,
            "Schedule complete"
        );

        Ok(ScheduleRun {
            schedule: self.schedule,
            people: self.people,
            selections: self.selections,
        })
    }

    fn candidates(&self, holiday: bool) -> Vec<usize> {
        let all = 0..self.people.len();
        if !holiday {
            return all.collect();
        }
        let eligible: Vec<usize> = all
            .clone()
            .filter(|&i| !self.people.records()[i].doctor.is_holiday_exempt())
            .collect();
        if eligible.is_empty() {
            warn!("Every doctor is holiday-exempt; considering the full roster");
            return all.collect();
        }
        eligible
    }

    /// Scores, selects and records a single day. Nothing is written unless a doctor is chosen.
    fn fill_day<R: Rng + ?Sized>(&mut self, index: usize, rng: &mut R) -> RosterResult<()> {
        let (date, holiday_name) = {
            let day = &self.schedule.days[index];
            (day.date, day.holiday.clone())
        };
        let holidays = self.holidays;
        let holiday = holiday_name.as_deref().and_then(|name| holidays.get(name));
        let doctor_count = self.people.len();

        let scored: Vec<(usize, i64)> = self
            .candidates(holiday.is_some())
            .into_iter()
            .map(|i| {
                let record = &self.people.records()[i];
                (i, self.engine.priority(record, date, holiday, doctor_count))
            })
            .collect();

        let selection = select(date, &scored, rng)?;
        self.people.record(selection.winner, date, holiday_name.clone())?;

        let doctor_id = self.people.records()[selection.winner].id().to_string();
        debug!(
            %date,
            doctor = %doctor_id,
            priority = selection.priority,
            tied = selection.tied,
            holiday = holiday_name.as_deref().unwrap_or(""),
            "Filled day"
        );

        self.schedule.days[index].doctor = Some(doctor_id.clone());
        if let Some(name) = &holiday_name {
            self.schedule.holidays_assigned.insert(name.clone());
        }
        self.selections.push(Selected {
            date,
            doctor: doctor_id,
            holiday: holiday_name,
            priority: selection.priority,
        });
        Ok(())
    }
}

/// Result of a finished run
#[derive(Debug, Clone)]
pub struct ScheduleRun {
    pub schedule: Schedule,
    pub people: PersonRegistry,
    pub selections: Vec<Selected>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use crate::schedule::calendar::build_calendar;
    use crate::schedule::types::{Doctor, HolidayRecord};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_year_registry() -> HolidayRegistry {
        HolidayRegistry::from_records(&[HolidayRecord {
            name: "NewYear".into(),
            month: Some(1),
            day: Some(1),
            dates: None,
        }])
        .unwrap()
    }

    fn people(doctors: &[(&str, u32)]) -> PersonRegistry {
        PersonRegistry::new(doctors.iter().map(|(id, rank)| Doctor::new(*id, *id, *rank)).collect())
            .unwrap()
    }

    #[test]
    fn test_rank_zero_doctor_skips_holiday() {
        let holidays = new_year_registry();
        let calendar = build_calendar(2025);
        let mut scheduler = AssignmentScheduler::new(
            2025,
            &calendar,
            people(&[("a", 0), ("b", 1)]),
            &holidays,
            PriorityEngine::default(),
        )
        .unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(scheduler.assign_holidays(&mut rng).unwrap(), 1);
        assert_eq!(scheduler.state(), SchedulerState::HolidaysAssigned);
        assert_eq!(scheduler.schedule().doctor_on(date(2025, 1, 1)), Some("b"));
        assert!(scheduler.schedule().holidays_assigned.contains("NewYear"));
    }

    #[test]
    fn test_all_exempt_falls_back_to_everyone() {
        let holidays = new_year_registry();
        let calendar = build_calendar(2025);
        let mut scheduler = AssignmentScheduler::new(
            2025,
            &calendar,
            people(&[("a", 0), ("b", 0)]),
            &holidays,
            PriorityEngine::default(),
        )
        .unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        scheduler.assign_holidays(&mut rng).unwrap();
        assert!(scheduler.schedule().doctor_on(date(2025, 1, 1)).is_some());
    }

    #[test]
    fn test_fill_before_holidays_is_state_error() {
        let holidays = HolidayRegistry::default();
        let calendar = build_calendar(2025);
        let mut scheduler = AssignmentScheduler::new(
            2025,
            &calendar,
            people(&[("a", 1)]),
            &holidays,
            PriorityEngine::default(),
        )
        .unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(matches!(scheduler.fill(&mut rng), Err(RosterError::State { .. })));
    }

    #[test]
    fn test_zero_doctors_mutates_nothing() {
        let holidays = new_year_registry();
        let calendar = build_calendar(2025);
        let mut scheduler =
            AssignmentScheduler::new(2025, &calendar, people(&[]), &holidays, PriorityEngine::default())
                .unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let err = scheduler.assign_holidays(&mut rng).unwrap_err();
        assert!(matches!(err, RosterError::EmptyCandidateSet { .. }));
        assert_eq!(scheduler.schedule().unfilled(), 365);
        assert_eq!(scheduler.state(), SchedulerState::Uninitialized);
    }

    #[test]
    fn test_all_holidays_means_nothing_to_fill() {
        let holidays = HolidayRegistry::from_records(&[HolidayRecord {
            name: "Everything".into(),
            month: None,
            day: None,
            dates: Some(build_calendar(2025)),
        }])
        .unwrap();
        let calendar = build_calendar(2025);
        let mut scheduler = AssignmentScheduler::new(
            2025,
            &calendar,
            people(&[("a", 1), ("b", 2)]),
            &holidays,
            PriorityEngine::default(),
        )
        .unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(scheduler.assign_holidays(&mut rng).unwrap(), 365);
        assert!(matches!(
            scheduler.fill(&mut rng),
            Err(RosterError::NoSchedulableDays { year: 2025 })
        ));
    }

    #[test]
    fn test_incomplete_calendar_rejected() {
        let holidays = HolidayRegistry::default();
        let mut calendar = build_calendar(2025);
        calendar.truncate(200);
        let result =
            AssignmentScheduler::new(2025, &calendar, people(&[("a", 1)]), &holidays, PriorityEngine::default());
        assert!(matches!(result, Err(RosterError::IncompleteYear { .. })));
    }

    #[test]
    fn test_full_run_fills_every_day() {
        let holidays = new_year_registry();
        let calendar = build_calendar(2024);
        let scheduler = AssignmentScheduler::new(
            2024,
            &calendar,
            people(&[("a", 1), ("b", 1), ("c", 2)]),
            &holidays,
            PriorityEngine::default(),
        )
        .unwrap();

        let run = scheduler.run(&mut ChaCha8Rng::seed_from_u64(11)).unwrap();
        assert_eq!(run.schedule.days.len(), 366);
        assert!(run.schedule.is_complete());
        assert_eq!(run.selections.len(), 366);
        assert_eq!(run.selections[0].holiday.as_deref(), Some("NewYear"));
    }

    #[test]
    fn test_chronological_ordering_visits_dates_in_order() {
        let holidays = HolidayRegistry::default();
        let calendar = build_calendar(2025);
        let scheduler = AssignmentScheduler::new(
            2025,
            &calendar,
            people(&[("a", 1), ("b", 1)]),
            &holidays,
            PriorityEngine::default(),
        )
        .unwrap()
        .with_ordering(OrderingKind::Chronological.build());

        let run = scheduler.run(&mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        let dates: Vec<NaiveDate> = run.selections.iter().map(|s| s.date).collect();
        assert_eq!(dates, calendar);
    }

    #[test]
    fn test_custom_ordering_closure() {
        let holidays = HolidayRegistry::default();
        let calendar = build_calendar(2025);
        // latest date first
        let latest_first = |d: NaiveDate, _: &PersonRegistry| {
            use chrono::Datelike;
            i64::from(d.ordinal())
        };
        let scheduler = AssignmentScheduler::new(
            2025,
            &calendar,
            people(&[("a", 1), ("b", 1)]),
            &holidays,
            PriorityEngine::default(),
        )
        .unwrap()
        .with_ordering(Box::new(latest_first));

        let run = scheduler.run(&mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        assert_eq!(run.selections.first().map(|s| s.date), Some(date(2025, 12, 31)));
    }
}
