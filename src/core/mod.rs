//! Core layer - the school's billing and record-keeping logic
//!
//! Framework-agnostic operations over the entities: pricing, balances, the
//! enrollment/payment/attendance workflows and the dashboard aggregators.
//! Any front end (desktop, web, terminal) drives the school through these functions.

/// Lesson check-ins, scheduling and consumption against plans
pub mod attendance;
/// Balance calculation over enrollments and ledger rows
pub mod balance;
/// Revenue, due-soon and discount aggregations for the dashboard
pub mod dashboard;
/// Enrollment form state machine and enrollment records
pub mod enrollment;
/// Instructor records
pub mod instructor;
/// Payment workflow and payment events
pub mod payment;
/// Pricing table with persisted overrides
pub mod pricing;
/// Receipt data and plain-text rendering
pub mod receipt;
/// Student registration and lookup
pub mod student;
/// Ledger queries
pub mod transaction;
/// Shared enumerations
pub mod types;
