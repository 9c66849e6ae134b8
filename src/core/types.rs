//! Closed vocabularies shared by the entities and the workflows.
//!
//! Every enumeration that is stored in a column derives `DeriveActiveEnum`, so the
//! store only ever sees the canonical string (or integer) value and invalid
//! intermediate values cannot be represented in Rust.

use crate::errors::{Error, Result};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Course offered by the school, as chosen on the enrollment form and used as a pricing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Course {
    /// Motorcycle training, stored as license type `bike`
    Motorcycle,
    /// Car training
    Car,
}

impl Course {
    /// All courses in pricing-table order.
    pub const ALL: [Self; 2] = [Self::Motorcycle, Self::Car];

    /// Key used in the persisted pricing document.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Motorcycle => "motorcycle",
            Self::Car => "car",
        }
    }

    /// User-facing label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Motorcycle => "Motorcycle",
            Self::Car => "Car",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Motorcycle => 0,
            Self::Car => 1,
        }
    }
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Course {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "motorcycle" | "bike" => Ok(Self::Motorcycle),
            "car" => Ok(Self::Car),
            _ => Err(Error::InvalidSelection {
                field: "course",
                value: s.to_string(),
            }),
        }
    }
}

impl From<LicenseType> for Course {
    fn from(value: LicenseType) -> Self {
        match value {
            LicenseType::Bike => Self::Motorcycle,
            LicenseType::Car => Self::Car,
        }
    }
}

/// Stored license type of an enrollment, and the lesson type of an attendance record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum LicenseType {
    /// Motorcycle
    #[sea_orm(string_value = "bike")]
    Bike,
    /// Car
    #[sea_orm(string_value = "car")]
    Car,
}

impl LicenseType {
    /// Stored value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bike => "bike",
            Self::Car => "car",
        }
    }

    /// Display label ("Motorcycle" / "Car").
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bike => "Motorcycle",
            Self::Car => "Car",
        }
    }
}

impl From<Course> for LicenseType {
    fn from(value: Course) -> Self {
        match value {
            Course::Motorcycle => Self::Bike,
            Course::Car => Self::Car,
        }
    }
}

impl fmt::Display for LicenseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Length of each lesson session.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum SessionTime {
    /// Half-hour sessions
    #[sea_orm(string_value = "30min")]
    #[serde(rename = "30min")]
    ThirtyMinutes,
    /// One-hour sessions
    #[sea_orm(string_value = "1hr")]
    #[serde(rename = "1hr")]
    OneHour,
}

impl SessionTime {
    /// All session times in pricing-table order.
    pub const ALL: [Self; 2] = [Self::ThirtyMinutes, Self::OneHour];

    /// Key used in the persisted pricing document and in storage.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::ThirtyMinutes => "30min",
            Self::OneHour => "1hr",
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::ThirtyMinutes => 0,
            Self::OneHour => 1,
        }
    }
}

impl fmt::Display for SessionTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SessionTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "30min" => Ok(Self::ThirtyMinutes),
            "1hr" => Ok(Self::OneHour),
            _ => Err(Error::InvalidSelection {
                field: "session_time",
                value: s.to_string(),
            }),
        }
    }
}

/// Day-count tier of an enrollment. Also bounds the number of billable lessons.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum PaymentPlan {
    /// Single day
    #[sea_orm(num_value = 1)]
    OneDay,
    /// One week
    #[sea_orm(num_value = 7)]
    SevenDays,
    /// Fifteen days
    #[sea_orm(num_value = 15)]
    FifteenDays,
    /// Thirty days
    #[sea_orm(num_value = 30)]
    ThirtyDays,
}

impl PaymentPlan {
    /// All plans in pricing-table order.
    pub const ALL: [Self; 4] = [
        Self::OneDay,
        Self::SevenDays,
        Self::FifteenDays,
        Self::ThirtyDays,
    ];

    /// Number of calendar days (and lessons) the plan covers.
    #[must_use]
    pub const fn days(self) -> u32 {
        match self {
            Self::OneDay => 1,
            Self::SevenDays => 7,
            Self::FifteenDays => 15,
            Self::ThirtyDays => 30,
        }
    }

    /// Parses a plan from its day count.
    pub fn from_days(days: i64) -> Result<Self> {
        match days {
            1 => Ok(Self::OneDay),
            7 => Ok(Self::SevenDays),
            15 => Ok(Self::FifteenDays),
            30 => Ok(Self::ThirtyDays),
            _ => Err(Error::InvalidSelection {
                field: "payment_plan",
                value: days.to_string(),
            }),
        }
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::OneDay => 0,
            Self::SevenDays => 1,
            Self::FifteenDays => 2,
            Self::ThirtyDays => 3,
        }
    }
}

impl fmt::Display for PaymentPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.days())
    }
}

impl FromStr for PaymentPlan {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let days = s.trim().parse::<i64>().map_err(|_| Error::InvalidSelection {
            field: "payment_plan",
            value: s.to_string(),
        })?;
        Self::from_days(days)
    }
}

/// Lifecycle of a student record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum StudentStatus {
    /// Currently training
    #[sea_orm(string_value = "active")]
    Active,
    /// Finished training
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Left before finishing
    #[sea_orm(string_value = "dropped")]
    Dropped,
}

/// Lifecycle of an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    /// Plan is running
    #[sea_orm(string_value = "active")]
    Active,
    /// Plan finished
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Plan abandoned
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// State of a single lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "kebab-case")]
pub enum AttendanceStatus {
    /// Booked for a future date
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    /// Student attended; counts against the plan
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Called off
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    /// Student did not show up
    #[sea_orm(string_value = "no-show")]
    NoShow,
}

/// How money (or a discount) was tendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash at the counter
    #[sea_orm(string_value = "cash")]
    Cash,
    /// QR wallet payment
    #[sea_orm(string_value = "qr")]
    Qr,
    /// Card
    #[sea_orm(string_value = "card")]
    Card,
    /// Bank transfer
    #[sea_orm(string_value = "bank_transfer")]
    BankTransfer,
    /// UPI
    #[sea_orm(string_value = "upi")]
    Upi,
    /// Not money: marks a discount row
    #[sea_orm(string_value = "discount")]
    Discount,
}

impl PaymentMethod {
    /// Stored value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Qr => "qr",
            Self::Card => "card",
            Self::BankTransfer => "bank_transfer",
            Self::Upi => "upi",
            Self::Discount => "discount",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().replace('_', " ").to_uppercase())
    }
}

impl FromStr for PaymentMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(Self::Cash),
            "qr" => Ok(Self::Qr),
            "card" => Ok(Self::Card),
            "bank_transfer" => Ok(Self::BankTransfer),
            "upi" => Ok(Self::Upi),
            "discount" => Ok(Self::Discount),
            _ => Err(Error::InvalidSelection {
                field: "payment_method",
                value: s.to_string(),
            }),
        }
    }
}

/// What a ledger entry is for. `Discount` is the canonical discount tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// Fee paid at enrollment
    #[sea_orm(string_value = "enrollment_fee")]
    EnrollmentFee,
    /// Lesson payment
    #[sea_orm(string_value = "tuition")]
    Tuition,
    /// Discount granted against the balance
    #[sea_orm(string_value = "discount")]
    Discount,
    /// Anything else
    #[sea_orm(string_value = "other")]
    Other,
}

/// Settlement state of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Settled; counts toward the paid total
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Awaiting settlement
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Voided before settlement
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    /// Returned to the student
    #[sea_orm(string_value = "refunded")]
    Refunded,
}

/// Employment state of an instructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum InstructorStatus {
    /// Teaching
    #[sea_orm(string_value = "active")]
    Active,
    /// Not currently teaching
    #[sea_orm(string_value = "inactive")]
    Inactive,
}
