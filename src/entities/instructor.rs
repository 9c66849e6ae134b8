//! Instructor entity - staff records, independent of billing.

use crate::core::types::InstructorStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Instructor database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "instructors")]
pub struct Model {
    /// Unique identifier for the instructor
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Full name
    pub full_name: String,
    /// Contact phone
    pub phone: String,
    /// Optional email address
    pub email: Option<String>,
    /// Driving-instructor license number, if on file
    pub license_number: Option<String>,
    /// Comma-separated license types taught (e.g. `"bike,car"`)
    pub specialization: String,
    /// Whether the instructor is currently teaching
    pub status: InstructorStatus,
    /// When the record was created
    pub created_at: DateTimeUtc,
}

/// Instructor has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
