use chrono::NaiveDate;
use serde::{Serialize, Deserialize};
use super::registry::DoctorRecord;
use super::types::HolidayDescriptor;

/// Shifts closer than this many days to a previous shift are penalised
pub const DEFAULT_RECENCY_WINDOW: i64 = 8;

/// Unit used when measuring distance to a doctor's last same-name holiday
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HolidayDistance {
    /// Calendar days
    Days,
    /// Occurrences of the holiday since it was last worked
    #[default]
    Occurrences,
}

/// Scores a (doctor, day) pair. Lower is more eligible.
#[derive(Debug, Clone, Copy)]
pub struct PriorityEngine {
    recency_window: i64,
    holiday_distance: HolidayDistance,
}

impl Default for PriorityEngine {
    fn default() -> Self {
        Self {
            recency_window: DEFAULT_RECENCY_WINDOW,
            holiday_distance: HolidayDistance::Occurrences,
        }
    }
}

impl PriorityEngine {
    pub fn new(recency_window: i64, holiday_distance: HolidayDistance) -> Self {
        Self {
            recency_window: recency_window.max(1),
            holiday_distance,
        }
    }

    /// Base rank, plus a holiday penalty for recently working the same holiday,
    /// plus a recency penalty for any shift inside the window, plus the
    /// doctor's own preference weight for the date.
    ///
    /// `None` distances mean "never worked" and contribute no penalty.
    pub fn priority(
        &self,
        doctor: &DoctorRecord,
        date: NaiveDate,
        holiday: Option<&HolidayDescriptor>,
        doctor_count: usize,
    ) -> i64 {
        let mut priority = i64::from(doctor.rank());

        if let Some(holiday) = holiday {
            if doctor.rank() != 0 {
                if let Some(distance) = self.holiday_distance(doctor, date, holiday) {
                    priority += (doctor_count as i64 - distance).max(0);
                }
            }
        }

        if let Some(distance) = doctor.days_to_nearest_shift(date) {
            priority += (self.recency_window - distance).max(0);
        }

        priority + doctor.preference(date)
    }

    /// Distance from `date` to the doctor's nearest assignment of `holiday`
    pub fn holiday_distance(
        &self,
        doctor: &DoctorRecord,
        date: NaiveDate,
        holiday: &HolidayDescriptor,
    ) -> Option<i64> {
        let worked = doctor.nearest_holiday(&holiday.name, date)?;
        let distance = match self.holiday_distance {
            HolidayDistance::Days => (date - worked).num_days().abs(),
            HolidayDistance::Occurrences => {
                holiday.occurrences_between(worked.min(date), worked.max(date))
            }
        };
        Some(distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::registry::PersonRegistry;
    use crate::schedule::types::{Doctor, Recurrence};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_year() -> HolidayDescriptor {
        HolidayDescriptor {
            name: "NewYear".to_string(),
            recurrence: Recurrence::Fixed { month: 1, day: 1 },
        }
    }

    #[test]
    fn test_base_rank_only_without_history() {
        let registry = PersonRegistry::new(vec![
            Doctor::new("a", "A", 0),
            Doctor::new("b", "B", 1),
        ])
        .unwrap();
        let engine = PriorityEngine::default();
        let day = date(2025, 1, 1);
        let holiday = new_year();

        assert_eq!(engine.priority(registry.get("a").unwrap(), day, Some(&holiday), 2), 0);
        assert_eq!(engine.priority(registry.get("b").unwrap(), day, Some(&holiday), 2), 1);
    }

    #[test]
    fn test_recency_penalty() {
        let mut registry = PersonRegistry::new(vec![Doctor::new("a", "A", 2)]).unwrap();
        registry.record(0, date(2025, 3, 1), None).unwrap();
        let engine = PriorityEngine::default();
        let doctor = registry.get("a").unwrap();

        assert_eq!(engine.priority(doctor, date(2025, 3, 2), None, 1), 2 + 7);
        assert_eq!(engine.priority(doctor, date(2025, 3, 8), None, 1), 2 + 1);
        assert_eq!(engine.priority(doctor, date(2025, 3, 9), None, 1), 2);
        assert_eq!(engine.priority(doctor, date(2025, 2, 27), None, 1), 2 + 6);
    }

    #[test]
    fn test_holiday_penalty_in_days() {
        let mut registry = PersonRegistry::new(vec![Doctor::new("a", "A", 1)]).unwrap();
        registry.record(0, date(2025, 1, 1), Some("NewYear".into())).unwrap();
        let engine = PriorityEngine::new(DEFAULT_RECENCY_WINDOW, HolidayDistance::Days);
        let doctor = registry.get("a").unwrap();
        let holiday = new_year();

        // 10 doctors, worked the holiday 3 days ago: 10 - 3 holiday, 8 - 3 recency
        assert_eq!(engine.priority(doctor, date(2025, 1, 4), Some(&holiday), 10), 1 + 7 + 5);
        assert_eq!(engine.holiday_distance(doctor, date(2025, 1, 1), &holiday), Some(0));
    }

    #[test]
    fn test_holiday_penalty_in_occurrences() {
        let mut registry = PersonRegistry::new(vec![Doctor::new("a", "A", 1)]).unwrap();
        registry.record(0, date(2024, 1, 1), Some("NewYear".into())).unwrap();
        let engine = PriorityEngine::new(8, HolidayDistance::Occurrences);
        let doctor = registry.get("a").unwrap();
        let holiday = new_year();

        assert_eq!(engine.holiday_distance(doctor, date(2025, 1, 1), &holiday), Some(1));
        // 3 doctors, one occurrence since: penalty 2
        assert_eq!(engine.priority(doctor, date(2025, 1, 1), Some(&holiday), 3), 1 + 2);
    }

    #[test]
    fn test_rank_zero_skips_holiday_penalty() {
        let mut registry = PersonRegistry::new(vec![Doctor::new("a", "A", 0)]).unwrap();
        registry.record(0, date(2024, 12, 20), Some("NewYear".into())).unwrap();
        let engine = PriorityEngine::default();
        let doctor = registry.get("a").unwrap();

        // 12 days since the last shift, outside the recency window
        assert_eq!(engine.priority(doctor, date(2025, 1, 1), Some(&new_year()), 50), 0);
    }

    #[test]
    fn test_default_counts_occurrences() {
        let mut registry = PersonRegistry::new(vec![Doctor::new("a", "A", 1)]).unwrap();
        registry.record(0, date(2024, 1, 1), Some("NewYear".into())).unwrap();
        let doctor = registry.get("a").unwrap();

        // a year away in days, but only one occurrence: 3 - 1
        assert_eq!(PriorityEngine::default().priority(doctor, date(2025, 1, 1), Some(&new_year()), 3), 1 + 2);
    }

    #[test]
    fn test_preference_shifts_priority() {
        let mut doctor = Doctor::new("a", "A", 2);
        doctor.preferences.insert(date(2025, 8, 1), 4);
        doctor.preferences.insert(date(2025, 8, 2), -2);
        let registry = PersonRegistry::new(vec![doctor]).unwrap();
        let engine = PriorityEngine::default();
        let doctor = registry.get("a").unwrap();

        assert_eq!(engine.priority(doctor, date(2025, 8, 1), None, 1), 6);
        assert_eq!(engine.priority(doctor, date(2025, 8, 2), None, 1), 0);
        assert_eq!(engine.priority(doctor, date(2025, 8, 3), None, 1), 2);
    }

    #[test]
    fn test_priority_is_idempotent() {
        let mut registry = PersonRegistry::new(vec![Doctor::new("a", "A", 3)]).unwrap();
        registry.record(0, date(2025, 5, 5), None).unwrap();
        let engine = PriorityEngine::default();
        let doctor = registry.get("a").unwrap();

        let first = engine.priority(doctor, date(2025, 5, 7), None, 4);
        let second = engine.priority(doctor, date(2025, 5, 7), None, 4);
        assert_eq!(first, second);
    }
}
