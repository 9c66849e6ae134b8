//! Unified error type for `DriveTrack`.
//!
//! Errors fall into two families. Validation failures are raised before any
//! store call and leave no state behind. Repository failures come straight
//! from the store and are surfaced with the store's own message.

use chrono::NaiveDate;
use thiserror::Error;

/// Every failure a workflow can report.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or malformed user input
    #[error("Validation error: {message}")]
    Validation {
        /// What was wrong with the input
        message: String,
    },

    /// A currency amount that is zero, negative or not finite where a positive one is required
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// A course, session time or plan key outside the fixed enumerations
    #[error("Invalid selection for {field}: {value}")]
    InvalidSelection {
        /// Which selector was invalid
        field: &'static str,
        /// The raw value that did not match
        value: String,
    },

    /// The student already has a check-in for this lesson type on this date
    #[error("Student {student_id} is already checked in for {lesson_type} on {date}")]
    DuplicateCheckIn {
        /// Student that was checked in twice
        student_id: i64,
        /// Stored lesson type (`bike` or `car`)
        lesson_type: String,
        /// Lesson date
        date: NaiveDate,
    },

    /// Student lookup failed
    #[error("Student not found: {id}")]
    StudentNotFound {
        /// Requested student id
        id: i64,
    },

    /// Enrollment lookup failed
    #[error("Enrollment not found: {id}")]
    EnrollmentNotFound {
        /// Requested enrollment id
        id: i64,
    },

    /// Transaction lookup failed
    #[error("Transaction not found: {id}")]
    TransactionNotFound {
        /// Requested transaction id
        id: i64,
    },

    /// Attendance lookup failed
    #[error("Attendance record not found: {id}")]
    AttendanceNotFound {
        /// Requested attendance id
        id: i64,
    },

    /// Instructor lookup failed
    #[error("Instructor not found: {id}")]
    InstructorNotFound {
        /// Requested instructor id
        id: i64,
    },

    /// Configuration file or environment problem
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// The store rejected a read or write
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A persisted JSON document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for building a [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// True for input errors that were caught before any store call.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::InvalidAmount { .. }
                | Self::InvalidSelection { .. }
                | Self::DuplicateCheckIn { .. }
        )
    }

    /// Message suitable for an inline notification.
    ///
    /// Store errors are passed through verbatim.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(e) => e.to_string(),
            Self::Validation { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
