//! Student entity - the root aggregate of the school's records.
//!
//! Enrollments, attendance records and transactions all point back at a student.
//! Deleting a student removes those rows through the store's `ON DELETE CASCADE`,
//! the application never deletes them itself.

use crate::core::types::StudentStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Student database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    /// Unique identifier for the student
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Full name as shown on rosters and receipts
    pub full_name: String,
    /// Contact phone; together with the name forms the display identity
    pub phone: String,
    /// Optional email address
    pub email: Option<String>,
    /// Whether the student is training, finished or dropped
    pub status: StudentStatus,
    /// Day the student joined the school
    pub enrollment_date: Date,
    /// When the record was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Student and the records it owns
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One student has many enrollments
    #[sea_orm(has_many = "super::enrollment::Entity")]
    Enrollments,
    /// One student has many attendance records
    #[sea_orm(has_many = "super::attendance::Entity")]
    Attendance,
    /// One student has many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollments.def()
    }
}

impl Related<super::attendance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attendance.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
