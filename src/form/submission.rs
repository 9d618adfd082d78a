use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::schedule::{Doctor, HolidayRecord};
use crate::store::MAX_PREFERENCE_SPAN_DAYS;

/// Highest base rank accepted from the form
pub const MAX_RANK: u32 = 1000;

/// Largest preference weight in either direction
pub const MAX_PREFERENCE: i64 = 5;

/// New doctor submitted from the front end
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSubmission {
    pub id: String,
    pub name: String,
    pub rank: u32,
}

impl DoctorSubmission {
    pub fn into_doctor(self) -> Doctor {
        Doctor::new(self.id.trim(), self.name.trim(), self.rank)
    }
}

/// New holiday submitted from the front end: either month/day or a list of dates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolidaySubmission {
    pub name: String,
    pub month: Option<u32>,
    pub day: Option<u32>,
    #[serde(default)]
    pub dates: Vec<NaiveDate>,
}

impl HolidaySubmission {
    pub fn into_record(self) -> HolidayRecord {
        HolidayRecord {
            name: self.name.trim().to_string(),
            month: self.month,
            day: self.day,
            dates: if self.dates.is_empty() { None } else { Some(self.dates) },
        }
    }
}

/// Availability for a date range. Positive weights avoid the dates, negative ones ask for them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferenceSubmission {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub weight: i64,
}

/// Manual replacement of the doctor on one date
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideSubmission {
    pub doctor_id: String,
}

/// Validates a doctor submission
pub fn validate_doctor(req: &DoctorSubmission) -> Result<(), String> {
    let id = req.id.trim();
    if id.is_empty() {
        return Err("Doctor id is required".to_string());
    }
    if !id.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')) {
        return Err("Doctor id may only contain letters, digits, '-', '_' and '.'".to_string());
    }

    if req.name.trim().is_empty() {
        return Err("Doctor name is required".to_string());
    }

    if req.rank > MAX_RANK {
        return Err(format!("Rank must be between 0 and {}", MAX_RANK));
    }

    Ok(())
}

/// Validates the shape of a holiday submission; recurrence rules are checked by the registry
pub fn validate_holiday(req: &HolidaySubmission) -> Result<(), String> {
    if req.name.trim().is_empty() {
        return Err("Holiday name is required".to_string());
    }

    let fixed = req.month.is_some() || req.day.is_some();
    if fixed && !req.dates.is_empty() {
        return Err("Give either a month/day or a list of dates, not both".to_string());
    }
    if !fixed && req.dates.is_empty() {
        return Err("A month/day or at least one date is required".to_string());
    }

    Ok(())
}

/// Validates a preference range and weight
pub fn validate_preference(req: &PreferenceSubmission) -> Result<(), String> {
    if req.end < req.start {
        return Err("End date must not be before start date".to_string());
    }
    if (req.end - req.start).num_days() >= MAX_PREFERENCE_SPAN_DAYS {
        return Err(format!("A preference may cover at most {} days", MAX_PREFERENCE_SPAN_DAYS));
    }
    if !(-MAX_PREFERENCE..=MAX_PREFERENCE).contains(&req.weight) {
        return Err(format!("Weight must be between -{} and {}", MAX_PREFERENCE, MAX_PREFERENCE));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctor(id: &str, name: &str, rank: u32) -> DoctorSubmission {
        DoctorSubmission { id: id.into(), name: name.into(), rank }
    }

    #[test]
    fn test_valid_doctor() {
        assert!(validate_doctor(&doctor("dr.grey", "Meredith Grey", 2)).is_ok());
    }

    #[test]
    fn test_invalid_doctors() {
        assert!(validate_doctor(&doctor("", "A", 1)).is_err());
        assert!(validate_doctor(&doctor("has space", "A", 1)).is_err());
        assert!(validate_doctor(&doctor("a,b", "A", 1)).is_err());
        assert!(validate_doctor(&doctor("a", "  ", 1)).is_err());
        assert!(validate_doctor(&doctor("a", "A", MAX_RANK + 1)).is_err());
    }

    #[test]
    fn test_holiday_shapes() {
        let fixed = HolidaySubmission { name: "NewYear".into(), month: Some(1), day: Some(1), dates: vec![] };
        assert!(validate_holiday(&fixed).is_ok());
        assert_eq!(fixed.into_record().dates, None);

        let neither = HolidaySubmission { name: "X".into(), month: None, day: None, dates: vec![] };
        assert!(validate_holiday(&neither).is_err());

        let both = HolidaySubmission {
            name: "X".into(),
            month: Some(1),
            day: Some(1),
            dates: vec![NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()],
        };
        assert!(validate_holiday(&both).is_err());
    }

    #[test]
    fn test_preference_bounds() {
        let day = |m, d| NaiveDate::from_ymd_opt(2025, m, d).unwrap();
        let pref = |start, end, weight| PreferenceSubmission { start, end, weight };

        assert!(validate_preference(&pref(day(7, 1), day(7, 14), 3)).is_ok());
        assert!(validate_preference(&pref(day(7, 1), day(7, 1), -MAX_PREFERENCE)).is_ok());
        assert!(validate_preference(&pref(day(7, 2), day(7, 1), 1)).is_err());
        assert!(validate_preference(&pref(day(7, 1), day(7, 1), MAX_PREFERENCE + 1)).is_err());
        let far = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        assert!(validate_preference(&pref(day(1, 1), far, 1)).is_err());
    }
}
