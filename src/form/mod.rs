pub mod submission;
pub mod export;

pub use submission::{
    DoctorSubmission, HolidaySubmission, OverrideSubmission, PreferenceSubmission, validate_doctor,
    validate_holiday, validate_preference,
};
pub use export::{append_doctor_to_csv, write_doctors_csv};
