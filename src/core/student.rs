//! Student records - registration, lookup, search and removal.

use crate::{
    core::types::StudentStatus,
    entities::{Student, student},
    errors::{Error, Result},
};
use chrono::{Local, NaiveDate, Utc};
use sea_orm::{Condition, QueryOrder, Set, prelude::*};
use tracing::info;

/// Registration form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewStudent {
    /// Full name
    pub full_name: String,
    /// Contact phone
    pub phone: String,
    /// Optional email; blank is treated as absent
    pub email: Option<String>,
}

impl NewStudent {
    /// Name and phone, no email.
    #[must_use]
    pub fn new(full_name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            phone: phone.into(),
            email: None,
        }
    }

    /// Adds an email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Registers a student joining today.
pub async fn create_student(db: &DatabaseConnection, form: &NewStudent) -> Result<student::Model> {
    create_student_on(db, form, Local::now().date_naive()).await
}

/// Registers a student with an explicit join date.
///
/// # Errors
/// `Validation` if the name or phone is blank, or the email has no `@`.
pub async fn create_student_on(
    db: &DatabaseConnection,
    form: &NewStudent,
    enrollment_date: NaiveDate,
) -> Result<student::Model> {
    let full_name = form.full_name.trim();
    if full_name.is_empty() {
        return Err(Error::validation("Full name is required"));
    }
    let phone = form.phone.trim();
    if phone.is_empty() {
        return Err(Error::validation("Phone number is required"));
    }
    let email = form
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());
    if let Some(email) = email
        && !email.contains('@')
    {
        return Err(Error::validation(format!("'{email}' is not a valid email")));
    }

    let student = student::ActiveModel {
        full_name: Set(full_name.to_string()),
        phone: Set(phone.to_string()),
        email: Set(email.map(str::to_string)),
        status: Set(StudentStatus::Active),
        enrollment_date: Set(enrollment_date),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!("Registered student {} ({})", student.full_name, student.id);
    Ok(student)
}

/// Retrieves every student, newest registration first.
pub async fn get_all_students(db: &DatabaseConnection) -> Result<Vec<student::Model>> {
    Student::find()
        .order_by_desc(student::Column::CreatedAt)
        .order_by_desc(student::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific student by ID.
///
/// Returns `None` if the student doesn't exist.
pub async fn get_student_by_id(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Option<student::Model>> {
    Student::find_by_id(student_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a student or fails with `StudentNotFound`.
pub async fn require_student(db: &DatabaseConnection, student_id: i64) -> Result<student::Model> {
    get_student_by_id(db, student_id)
        .await?
        .ok_or(Error::StudentNotFound { id: student_id })
}

/// Counts students currently in training.
pub async fn count_active_students(db: &DatabaseConnection) -> Result<u64> {
    Student::find()
        .filter(student::Column::Status.eq(StudentStatus::Active))
        .count(db)
        .await
        .map_err(Into::into)
}

/// Matches students whose name or phone contains `query`, ignoring ASCII case.
///
/// A blank query returns every student.
pub async fn search_students(db: &DatabaseConnection, query: &str) -> Result<Vec<student::Model>> {
    let query = query.trim();
    if query.is_empty() {
        return get_all_students(db).await;
    }

    Student::find()
        .filter(
            Condition::any()
                .add(student::Column::FullName.contains(query))
                .add(student::Column::Phone.contains(query)),
        )
        .order_by_asc(student::Column::FullName)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Changes a student's lifecycle state.
pub async fn update_student_status(
    db: &DatabaseConnection,
    student_id: i64,
    status: StudentStatus,
) -> Result<student::Model> {
    let existing = require_student(db, student_id).await?;
    let mut active_model: student::ActiveModel = existing.into();
    active_model.status = Set(status);
    active_model.update(db).await.map_err(Into::into)
}

/// Permanently deletes a student.
///
/// Their enrollments, attendance and transactions go with them.
pub async fn delete_student(db: &DatabaseConnection, student_id: i64) -> Result<()> {
    let result = Student::delete_by_id(student_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::StudentNotFound { id: student_id });
    }
    info!("Deleted student {} and their records", student_id);
    Ok(())
}
