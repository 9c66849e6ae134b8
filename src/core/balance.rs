//! Balance calculator - what a student owes, has paid, and has been discounted.
//!
//! The calculation is a pure function of already-fetched enrollments and transactions
//! and is rerun in full after every write; nothing is cached or updated incrementally.

use crate::{
    entities::{Enrollment, Transaction, enrollment, transaction},
    errors::Result,
};
use crate::core::types::{PaymentType, TransactionStatus};
use sea_orm::{QueryOrder, prelude::*};
use serde::Deserialize;
use std::collections::HashMap;

/// Description prefix used by older discount rows that were not tagged by `payment_type`.
pub const LEGACY_DISCOUNT_PREFIX: &str = "Discount:";

/// Which ledger rows count as discounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountRule {
    /// Only rows whose `payment_type` is `discount`
    #[default]
    Tagged,
    /// Tagged rows plus untagged rows whose description starts with `"Discount:"`
    TaggedOrLegacyPrefix,
}

impl DiscountRule {
    /// Classifies one ledger row.
    #[must_use]
    pub fn is_discount(self, transaction: &transaction::Model) -> bool {
        if transaction.payment_type == PaymentType::Discount {
            return true;
        }
        match self {
            Self::Tagged => false,
            Self::TaggedOrLegacyPrefix => transaction
                .description
                .as_deref()
                .is_some_and(|d| d.trim_start().starts_with(LEGACY_DISCOUNT_PREFIX)),
        }
    }
}

/// Derived billing position of one student.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StudentBalance {
    /// Sum of all enrollment prices
    pub total_owed: f64,
    /// Sum of completed payments, discounts excluded
    pub total_paid: f64,
    /// Sum of discounts
    pub total_discount: f64,
}

impl StudentBalance {
    /// Owed minus paid minus discounted; negative when the student has overpaid.
    #[must_use]
    pub fn remaining_signed(&self) -> f64 {
        self.total_owed - self.total_paid - self.total_discount
    }

    /// Remaining balance clamped at zero for display.
    #[must_use]
    pub fn remaining(&self) -> f64 {
        self.remaining_signed().max(0.0)
    }

    /// True once nothing is left to pay.
    #[must_use]
    pub fn is_fully_paid(&self) -> bool {
        self.remaining_signed() <= 0.0
    }

    /// True while the student still owes money.
    #[must_use]
    pub fn has_outstanding(&self) -> bool {
        self.remaining_signed() > 0.0
    }
}

/// Computes a student's balance from their enrollments and ledger rows.
///
/// Payments count only when `completed`; discounts count whatever their status.
#[must_use]
pub fn calculate_balance(
    enrollments: &[enrollment::Model],
    transactions: &[transaction::Model],
    rule: DiscountRule,
) -> StudentBalance {
    let total_owed = enrollments.iter().map(|e| e.total_amount).sum();

    let mut total_paid = 0.0;
    let mut total_discount = 0.0;
    for t in transactions {
        if rule.is_discount(t) {
            total_discount += t.amount;
        } else if t.status == TransactionStatus::Completed {
            total_paid += t.amount;
        }
    }

    StudentBalance {
        total_owed,
        total_paid,
        total_discount,
    }
}

/// Computes balances for every student appearing in either collection.
#[must_use]
pub fn balances_by_student(
    enrollments: &[enrollment::Model],
    transactions: &[transaction::Model],
    rule: DiscountRule,
) -> HashMap<i64, StudentBalance> {
    let mut balances: HashMap<i64, StudentBalance> = HashMap::new();

    for e in enrollments {
        balances.entry(e.student_id).or_default().total_owed += e.total_amount;
    }

    for t in transactions {
        let balance = balances.entry(t.student_id).or_default();
        if rule.is_discount(t) {
            balance.total_discount += t.amount;
        } else if t.status == TransactionStatus::Completed {
            balance.total_paid += t.amount;
        }
    }

    balances
}

/// Fetches a student's enrollments and transactions concurrently.
///
/// Transactions come back newest first.
pub async fn fetch_billing_records(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<(Vec<enrollment::Model>, Vec<transaction::Model>)> {
    let enrollments = Enrollment::find()
        .filter(enrollment::Column::StudentId.eq(student_id))
        .order_by_asc(enrollment::Column::StartDate)
        .all(db);
    let transactions = Transaction::find()
        .filter(transaction::Column::StudentId.eq(student_id))
        .order_by_desc(transaction::Column::TransactionDate)
        .order_by_desc(transaction::Column::Id)
        .all(db);

    let (enrollments, transactions) = tokio::try_join!(enrollments, transactions)?;
    Ok((enrollments, transactions))
}

/// Fetches a student's records and computes a fresh balance.
pub async fn get_student_balance(
    db: &DatabaseConnection,
    student_id: i64,
    rule: DiscountRule,
) -> Result<StudentBalance> {
    let (enrollments, transactions) = fetch_billing_records(db, student_id).await?;
    Ok(calculate_balance(&enrollments, &transactions, rule))
}
