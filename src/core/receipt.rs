//! Receipts built from [`PaymentRecorded`] events.
//!
//! The payment workflow knows nothing about receipts. A printer subscribes to
//! [`crate::core::payment::PaymentEvents`] and turns each event into a
//! [`ReceiptData`], reading the student on its own. Totals come from the event,
//! so a receipt printed late still shows the balance as of its payment.

use crate::{
    config::settings::SchoolConfig,
    core::{
        enrollment::get_enrollments_for_student,
        payment::PaymentRecorded,
        student::require_student,
        types::{EnrollmentStatus, PaymentMethod},
    },
    entities::{enrollment, student},
    errors::Result,
};
use chrono::{DateTime, Local, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::fmt;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

/// Everything printed on a payment receipt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReceiptData {
    /// School name for the header
    pub school_name: String,
    /// Currency code printed next to amounts
    pub currency: String,
    /// Ledger id of the payment
    pub payment_id: i64,
    /// When the payment was recorded
    pub recorded_at: DateTime<Utc>,
    /// Student name
    pub student_name: String,
    /// Student phone
    pub phone: String,
    /// Courses the student is enrolled in, e.g. "Car + Motorcycle"
    pub course: String,
    /// How the money was tendered
    pub method: PaymentMethod,
    /// Amount paid
    pub amount: f64,
    /// Discount granted with the payment
    pub discount: f64,
    /// Running total paid after this payment
    pub total_paid: f64,
    /// Balance left after this payment
    pub remaining: f64,
}

fn course_label(enrollments: &[enrollment::Model]) -> String {
    let mut labels: Vec<&'static str> = Vec::new();
    let active = enrollments
        .iter()
        .filter(|e| e.status == EnrollmentStatus::Active);
    for e in active {
        let label = e.license_type.label();
        if !labels.contains(&label) {
            labels.push(label);
        }
    }
    if labels.is_empty() {
        "-".to_string()
    } else {
        labels.join(" + ")
    }
}

impl ReceiptData {
    /// Assembles a receipt from an event and the paying student's records.
    #[must_use]
    pub fn from_payment(
        event: &PaymentRecorded,
        student: &student::Model,
        enrollments: &[enrollment::Model],
        school: &SchoolConfig,
    ) -> Self {
        Self {
            school_name: school.name.clone(),
            currency: school.currency.clone(),
            payment_id: event.payment_id,
            recorded_at: event.recorded_at,
            student_name: student.full_name.clone(),
            phone: student.phone.clone(),
            course: course_label(enrollments),
            method: event.method,
            amount: event.amount,
            discount: event.discount,
            total_paid: event.total_paid,
            remaining: event.remaining,
        }
    }
}

/// Reads the student and their enrollments, then assembles the receipt.
pub async fn build_receipt(
    db: &DatabaseConnection,
    event: &PaymentRecorded,
    school: &SchoolConfig,
) -> Result<ReceiptData> {
    let (student, enrollments) = tokio::try_join!(
        require_student(db, event.student_id),
        get_enrollments_for_student(db, event.student_id),
    )?;
    Ok(ReceiptData::from_payment(event, &student, &enrollments, school))
}

/// Waits for the next payment event and builds its receipt.
///
/// Returns `None` once the channel is closed. Events dropped because the
/// receiver fell behind are logged and skipped.
pub async fn next_receipt(
    db: &DatabaseConnection,
    receiver: &mut broadcast::Receiver<PaymentRecorded>,
    school: &SchoolConfig,
) -> Result<Option<ReceiptData>> {
    loop {
        match receiver.recv().await {
            Ok(event) => return build_receipt(db, &event, school).await.map(Some),
            Err(RecvError::Lagged(skipped)) => {
                warn!("Receipt printer fell behind; skipped {} payment events", skipped);
            }
            Err(RecvError::Closed) => return Ok(None),
        }
    }
}

/// Renders a plain-text receipt.
#[must_use]
pub fn format_receipt(receipt: &ReceiptData) -> String {
    let mut out = String::new();
    if let Err(e) = write_receipt(&mut out, receipt) {
        warn!("Failed to render receipt #{}: {}", receipt.payment_id, e);
    }
    out
}

/// Writes the plain-text receipt into `out`.
pub fn write_receipt(out: &mut impl fmt::Write, receipt: &ReceiptData) -> fmt::Result {
    let currency = &receipt.currency;
    let rule = "-".repeat(36);
    let recorded_at = receipt.recorded_at.with_timezone(&Local);

    writeln!(out, "{}", receipt.school_name)?;
    writeln!(out, "Payment Receipt #{}", receipt.payment_id)?;
    writeln!(out, "{}", recorded_at.format("%Y-%m-%d %H:%M"))?;
    writeln!(out, "{rule}")?;
    writeln!(out, "Student:   {}", receipt.student_name)?;
    writeln!(out, "Phone:     {}", receipt.phone)?;
    writeln!(out, "Course:    {}", receipt.course)?;
    writeln!(out, "Method:    {}", receipt.method)?;
    writeln!(out, "{rule}")?;
    writeln!(out, "Amount:    {currency} {:.2}", receipt.amount)?;
    if receipt.discount > 0.0 {
        writeln!(out, "Discount:  {currency} {:.2}", receipt.discount)?;
    }
    writeln!(out, "Paid:      {currency} {:.2}", receipt.total_paid)?;
    writeln!(out, "Remaining: {currency} {:.2}", receipt.remaining)?;
    Ok(())
}
