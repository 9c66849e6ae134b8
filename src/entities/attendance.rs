//! Attendance entity - one lesson occurrence, scheduled or completed.

use crate::core::types::{AttendanceStatus, LicenseType};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Attendance database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance")]
pub struct Model {
    /// Unique identifier for the lesson record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Student taking the lesson
    pub student_id: i64,
    /// Day of the lesson
    pub lesson_date: Date,
    /// Start time of the lesson
    pub lesson_time: Time,
    /// Vehicle used (`bike` or `car`)
    pub lesson_type: LicenseType,
    /// Length of the lesson in hours
    pub duration_hours: f64,
    /// Only `completed` rows count as attended days
    pub status: AttendanceStatus,
    /// Free-form notes from the scheduling form
    pub notes: Option<String>,
}

/// Defines relationships between Attendance and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each lesson belongs to one student
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
