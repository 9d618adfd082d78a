//! On-call roster scheduling
//!
//! Builds a year of daily on-call assignments for a team of doctors. Holidays
//! are handed out first, then the remaining days are filled in priority
//! order, balancing rank, recency and holiday rotation.

pub mod config;
pub mod display;
pub mod error;
pub mod form;
pub mod parser;
pub mod schedule;
pub mod store;
pub mod web;

pub use config::Config;
pub use error::{RosterError, RosterResult};
pub use schedule::{AssignmentScheduler, Doctor, HolidayRecord, Schedule, ScheduleDay};
pub use store::{run_scheduling_for_year, FileStore, MemoryStore, RosterAdmin, RosterStore, RunOptions};
