pub mod types;
pub mod calendar;
pub mod holidays;
pub mod registry;
pub mod priority;
pub mod selector;
pub mod scheduler;

pub use types::{Assignment, Doctor, DoctorId, HolidayDescriptor, HolidayRecord, Recurrence, Schedule, ScheduleDay};
pub use calendar::{build_calendar, validate_calendar};
pub use holidays::HolidayRegistry;
pub use registry::{DoctorRecord, PersonRegistry};
pub use priority::{HolidayDistance, PriorityEngine, DEFAULT_RECENCY_WINDOW};
pub use selector::{select, Selection};
pub use scheduler::{AssignmentScheduler, Chronological, DayOrdering, OrderingKind, RankSum, ScheduleRun, SchedulerState, Selected};
