//! Error types for roster building

use chrono::NaiveDate;
use thiserror::Error;

/// Result type for roster operations
pub type RosterResult<T> = Result<T, RosterError>;

/// Errors raised while loading, scheduling or persisting a roster
#[derive(Debug, Error)]
pub enum RosterError {
    /// A holiday descriptor or doctor row is malformed
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    /// No doctors were available to score for a day
    #[error("No candidate doctors available for {date}")]
    EmptyCandidateSet { date: NaiveDate },

    /// Every day of the year is a holiday, nothing left to fill
    #[error("No schedulable days remain in {year}")]
    NoSchedulableDays { year: i32 },

    /// The calendar does not cover exactly the requested year
    #[error("Calendar for {year} is incomplete: {reason}")]
    IncompleteYear { year: i32, reason: String },

    /// A scheduler step was invoked out of order
    #[error("Scheduler is in state {current}, expected {expected}")]
    State {
        current: &'static str,
        expected: &'static str,
    },

    /// Referenced doctor does not exist
    #[error("Unknown doctor '{id}'")]
    UnknownDoctor { id: String },

    /// Failure in the backing store
    #[error("Storage error during '{operation}': {reason}")]
    Storage { operation: String, reason: String },
}

impl RosterError {
    /// Create a configuration error
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Create an incomplete year error
    pub fn incomplete_year(year: i32, reason: impl Into<String>) -> Self {
        Self::IncompleteYear {
            year,
            reason: reason.into(),
        }
    }

    /// Create a storage error with context
    pub fn storage(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Storage {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Only storage failures are worth retrying; everything else is a logic error
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }
}

impl From<std::io::Error> for RosterError {
    fn from(err: std::io::Error) -> Self {
        Self::storage("io", err.to_string())
    }
}

impl From<csv::Error> for RosterError {
    fn from(err: csv::Error) -> Self {
        Self::storage("csv", err.to_string())
    }
}

impl From<serde_json::Error> for RosterError {
    fn from(err: serde_json::Error) -> Self {
        Self::storage("json", err.to_string())
    }
}
