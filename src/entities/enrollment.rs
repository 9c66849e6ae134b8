//! Enrollment entity - a student's priced commitment to a course.
//!
//! `total_amount` is copied from the pricing table when the row is created and is
//! never rewritten afterwards, so later price edits do not reprice old enrollments.

use crate::core::types::{EnrollmentStatus, LicenseType, PaymentPlan, SessionTime};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Enrollment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "enrollments")]
pub struct Model {
    /// Unique identifier for the enrollment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning student
    pub student_id: i64,
    /// Stored course category (`bike` or `car`)
    pub license_type: LicenseType,
    /// Lesson length
    pub session_time: SessionTime,
    /// Day-count tier
    pub payment_plan: PaymentPlan,
    /// Price fixed at creation
    pub total_amount: f64,
    /// First day of the plan
    pub start_date: Date,
    /// `start_date` plus the plan's day count
    pub end_date: Date,
    /// Lifecycle state
    pub status: EnrollmentStatus,
    /// When the enrollment was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Enrollment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each enrollment belongs to one student
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id",
        on_delete = "Cascade"
    )]
    Student,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
