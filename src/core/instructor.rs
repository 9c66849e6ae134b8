//! Instructor records.
//!
//! Instructors are not linked to lessons or billing; the school keeps them for
//! contact details and to know who can teach which vehicle.

use crate::{
    core::types::{Course, InstructorStatus, LicenseType},
    entities::{Instructor, instructor},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

/// Parses a stored specialization list such as `"bike,car"`.
///
/// Unknown entries are skipped and duplicates collapse.
#[must_use]
pub fn parse_specialization(value: &str) -> Vec<LicenseType> {
    let mut types = Vec::new();
    for part in value.split(',') {
        if let Ok(course) = part.parse::<Course>() {
            let license = LicenseType::from(course);
            if !types.contains(&license) {
                types.push(license);
            }
        }
    }
    types
}

/// Formats license types into the stored comma-separated form.
#[must_use]
pub fn format_specialization(types: &[LicenseType]) -> String {
    types
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Form input for a new instructor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewInstructor {
    /// Full name
    pub full_name: String,
    /// Contact phone
    pub phone: String,
    /// Optional email
    pub email: Option<String>,
    /// Optional instructor license number
    pub license_number: Option<String>,
    /// Vehicles taught
    pub specialization: Vec<LicenseType>,
}

fn blank_to_none(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Adds an instructor with status `active`.
pub async fn create_instructor(
    db: &DatabaseConnection,
    form: &NewInstructor,
) -> Result<instructor::Model> {
    let full_name = form.full_name.trim();
    if full_name.is_empty() {
        return Err(Error::validation("Full name is required"));
    }
    let phone = form.phone.trim();
    if phone.is_empty() {
        return Err(Error::validation("Phone number is required"));
    }
    if form.specialization.is_empty() {
        return Err(Error::validation("At least one specialization is required"));
    }

    let instructor = instructor::ActiveModel {
        full_name: Set(full_name.to_string()),
        phone: Set(phone.to_string()),
        email: Set(blank_to_none(form.email.as_deref())),
        license_number: Set(blank_to_none(form.license_number.as_deref())),
        specialization: Set(format_specialization(&form.specialization)),
        status: Set(InstructorStatus::Active),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Added instructor {} ({})", instructor.full_name, instructor.id);
    Ok(instructor)
}

/// Retrieves every instructor, newest first.
pub async fn get_all_instructors(db: &DatabaseConnection) -> Result<Vec<instructor::Model>> {
    Instructor::find()
        .order_by_desc(instructor::Column::CreatedAt)
        .order_by_desc(instructor::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific instructor by ID.
pub async fn get_instructor_by_id(
    db: &DatabaseConnection,
    instructor_id: i64,
) -> Result<Option<instructor::Model>> {
    Instructor::find_by_id(instructor_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves active instructors who teach the given vehicle.
pub async fn get_instructors_for(
    db: &DatabaseConnection,
    license_type: LicenseType,
) -> Result<Vec<instructor::Model>> {
    let active = Instructor::find()
        .filter(instructor::Column::Status.eq(InstructorStatus::Active))
        .order_by_asc(instructor::Column::FullName)
        .all(db)
        .await?;

    Ok(active
        .into_iter()
        .filter(|i| parse_specialization(&i.specialization).contains(&license_type))
        .collect())
}

/// Activates or deactivates an instructor.
pub async fn set_instructor_status(
    db: &DatabaseConnection,
    instructor_id: i64,
    status: InstructorStatus,
) -> Result<instructor::Model> {
    let existing = Instructor::find_by_id(instructor_id)
        .one(db)
        .await?
        .ok_or(Error::InstructorNotFound { id: instructor_id })?;

    let mut active_model: instructor::ActiveModel = existing.into();
    active_model.status = Set(status);
    active_model.update(db).await.map_err(Into::into)
}

/// Permanently deletes an instructor.
pub async fn delete_instructor(db: &DatabaseConnection, instructor_id: i64) -> Result<()> {
    let result = Instructor::delete_by_id(instructor_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::InstructorNotFound { id: instructor_id });
    }
    Ok(())
}
