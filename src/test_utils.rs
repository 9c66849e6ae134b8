//! Shared test utilities for `DriveTrack`.
//!
//! This module provides common helper functions for setting up test databases,
//! inserting rows with sensible defaults, and building in-memory fixtures for the
//! pure calculations.

use crate::{
    core::{
        student::{NewStudent, create_student},
        types::{
            EnrollmentStatus, LicenseType, PaymentMethod, PaymentPlan, PaymentType, SessionTime,
            TransactionStatus,
        },
    },
    entities::{Transaction, enrollment, student, transaction},
    errors::{Error, Result},
};
use chrono::{DateTime, Days, Local, NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Registers a test student with a placeholder phone number.
pub async fn create_test_student(db: &DatabaseConnection, name: &str) -> Result<student::Model> {
    create_student(db, &NewStudent::new(name, "9800000000")).await
}

/// Sets up a test database with one student already registered.
pub async fn setup_with_student() -> Result<(DatabaseConnection, student::Model)> {
    let db = setup_test_db().await?;
    let student = create_test_student(&db, "Test Student").await?;
    Ok((db, student))
}

/// Inserts an active enrollment with a fixed amount, bypassing the pricing table.
///
/// # Defaults
/// * `session_time`: 1 hour
/// * `payment_plan`: 7 days, starting today
pub async fn insert_enrollment(
    db: &DatabaseConnection,
    student_id: i64,
    license_type: LicenseType,
    total_amount: f64,
) -> Result<enrollment::Model> {
    let start_date = Local::now().date_naive();
    enrollment::ActiveModel {
        student_id: Set(student_id),
        license_type: Set(license_type),
        session_time: Set(SessionTime::OneHour),
        payment_plan: Set(PaymentPlan::SevenDays),
        total_amount: Set(total_amount),
        start_date: Set(start_date),
        end_date: Set(start_date + Days::new(7)),
        status: Set(EnrollmentStatus::Active),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Inserts a completed ledger row dated now.
///
/// Discount rows get the `discount` method and a prefixed description; everything
/// else is a cash payment.
pub async fn insert_transaction(
    db: &DatabaseConnection,
    student_id: i64,
    amount: f64,
    payment_type: PaymentType,
) -> Result<transaction::Model> {
    let (payment_method, description) = if payment_type == PaymentType::Discount {
        (PaymentMethod::Discount, Some("Discount: test".to_string()))
    } else {
        (PaymentMethod::Cash, None)
    };

    transaction::ActiveModel {
        student_id: Set(student_id),
        amount: Set(amount),
        payment_method: Set(payment_method),
        payment_type: Set(payment_type),
        status: Set(TransactionStatus::Completed),
        description: Set(description),
        transaction_date: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Back-dates (or forward-dates) a ledger row.
pub async fn set_transaction_date(
    db: &DatabaseConnection,
    transaction_id: i64,
    date: DateTime<Utc>,
) -> Result<()> {
    let existing = Transaction::find_by_id(transaction_id)
        .one(db)
        .await?
        .ok_or(Error::TransactionNotFound { id: transaction_id })?;

    let mut active_model: transaction::ActiveModel = existing.into();
    active_model.transaction_date = Set(date);
    active_model.update(db).await?;
    Ok(())
}

fn fixture_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap_or_default()
}

fn fixture_timestamp() -> DateTime<Utc> {
    fixture_date().and_hms_opt(10, 0, 0).unwrap_or_default().and_utc()
}

/// An in-memory active 7-day enrollment starting 2024-05-01.
#[must_use]
pub fn enrollment_fixture(
    id: i64,
    student_id: i64,
    license_type: LicenseType,
    total_amount: f64,
) -> enrollment::Model {
    enrollment::Model {
        id,
        student_id,
        license_type,
        session_time: SessionTime::OneHour,
        payment_plan: PaymentPlan::SevenDays,
        total_amount,
        start_date: fixture_date(),
        end_date: fixture_date() + Days::new(7),
        status: EnrollmentStatus::Active,
        created_at: fixture_timestamp(),
    }
}

/// An in-memory completed cash tuition payment.
#[must_use]
pub fn payment_fixture(id: i64, student_id: i64, amount: f64) -> transaction::Model {
    transaction::Model {
        id,
        student_id,
        amount,
        payment_method: PaymentMethod::Cash,
        payment_type: PaymentType::Tuition,
        status: TransactionStatus::Completed,
        description: None,
        transaction_date: fixture_timestamp(),
    }
}

/// An in-memory discount row.
#[must_use]
pub fn discount_fixture(id: i64, student_id: i64, amount: f64) -> transaction::Model {
    transaction::Model {
        payment_method: PaymentMethod::Discount,
        payment_type: PaymentType::Discount,
        description: Some("Discount: test".to_string()),
        ..payment_fixture(id, student_id, amount)
    }
}
