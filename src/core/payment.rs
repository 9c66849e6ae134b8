//! Payment workflow - recording a payment and an optional discount.
//!
//! A payment and its discount are written inside one store transaction, so either
//! both rows land or neither does. The balance is read fresh before the write (to
//! resolve "mark as fully paid" and to detect a stale on-screen balance) and again
//! after it. Receipt printing and other presentation concerns listen for
//! [`PaymentRecorded`] events instead of being called from here.

use crate::{
    core::{
        balance::{self, DiscountRule, LEGACY_DISCOUNT_PREFIX, StudentBalance},
        types::{PaymentMethod, PaymentType, TransactionStatus},
    },
    entities::transaction,
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{Set, TransactionTrait, prelude::*};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

// Displayed and actual balances closer than this are treated as equal.
const BALANCE_EPSILON: f64 = 0.005;

/// Input of the payment form.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    /// Paying student
    pub student_id: i64,
    /// Amount tendered; replaced by the remaining balance less the discount when
    /// `mark_full_paid` is set
    pub amount: f64,
    /// Discount granted alongside the payment; zero for none
    pub discount: f64,
    /// How the money was tendered
    pub method: PaymentMethod,
    /// What the payment is for
    pub payment_type: PaymentType,
    /// Optional note stored as the payment's description
    pub note: Option<String>,
    /// Pay whatever is remaining at the time of the call
    pub mark_full_paid: bool,
    /// Remaining balance the operator was looking at, used to detect stale screens
    pub displayed_remaining: Option<f64>,
}

impl PaymentRequest {
    /// A plain tuition payment with no discount.
    #[must_use]
    pub fn new(student_id: i64, amount: f64, method: PaymentMethod) -> Self {
        Self {
            student_id,
            amount,
            discount: 0.0,
            method,
            payment_type: PaymentType::Tuition,
            note: None,
            mark_full_paid: false,
            displayed_remaining: None,
        }
    }

    /// A payment of whatever is remaining when the request is processed.
    #[must_use]
    pub fn full_payment(student_id: i64, method: PaymentMethod) -> Self {
        let mut request = Self::new(student_id, 0.0, method);
        request.mark_full_paid = true;
        request
    }

    /// Adds a discount row to the request.
    #[must_use]
    pub fn with_discount(mut self, discount: f64) -> Self {
        self.discount = discount;
        self
    }

    /// Sets the payment note.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Sets the payment type.
    #[must_use]
    pub fn with_payment_type(mut self, payment_type: PaymentType) -> Self {
        self.payment_type = payment_type;
        self
    }

    /// Records the balance shown to the operator when the form was filled in.
    #[must_use]
    pub fn with_displayed_remaining(mut self, remaining: f64) -> Self {
        self.displayed_remaining = Some(remaining);
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.discount.is_finite() || self.discount < 0.0 {
            return Err(Error::InvalidAmount {
                amount: self.discount,
            });
        }
        if self.method == PaymentMethod::Discount {
            return Err(Error::validation(
                "Discount is not a payment method; use the discount field",
            ));
        }
        if self.payment_type == PaymentType::Discount {
            return Err(Error::validation(
                "Payments cannot be tagged as discounts; use the discount field",
            ));
        }
        if !self.mark_full_paid && (!self.amount.is_finite() || self.amount <= 0.0) {
            return Err(Error::InvalidAmount {
                amount: self.amount,
            });
        }
        Ok(())
    }
}

/// Event emitted after a payment has been committed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRecorded {
    /// Paying student
    pub student_id: i64,
    /// Ledger id of the payment row
    pub payment_id: i64,
    /// Ledger id of the discount row, if one was written
    pub discount_id: Option<i64>,
    /// Amount actually recorded
    pub amount: f64,
    /// Discount recorded (zero for none)
    pub discount: f64,
    /// How the money was tendered
    pub method: PaymentMethod,
    /// Timestamp stored on the rows
    pub recorded_at: DateTime<Utc>,
    /// Total paid by the student once this payment was committed
    pub total_paid: f64,
    /// Balance left once this payment was committed, never negative
    pub remaining: f64,
}

/// The operator's balance did not match the freshly fetched one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaleBalance {
    /// Remaining balance the operator saw
    pub displayed: f64,
    /// Remaining balance at the time of the write
    pub actual: f64,
}

/// Result of [`record_payment`].
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    /// The payment row
    pub payment: transaction::Model,
    /// The discount row, if any
    pub discount: Option<transaction::Model>,
    /// Balance read just before the write
    pub balance_before: StudentBalance,
    /// Balance read again after the write
    pub balance_after: StudentBalance,
    /// Set when the operator's displayed balance was out of date
    pub stale: Option<StaleBalance>,
    /// Event that was published for this payment
    pub event: PaymentRecorded,
}

/// Broadcast channel for [`PaymentRecorded`] events.
#[derive(Debug, Clone)]
pub struct PaymentEvents {
    sender: broadcast::Sender<PaymentRecorded>,
}

impl Default for PaymentEvents {
    fn default() -> Self {
        Self::new(16)
    }
}

impl PaymentEvents {
    /// Creates a channel that buffers up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to future payment events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PaymentRecorded> {
        self.sender.subscribe()
    }

    /// Publishes an event; returns how many subscribers received it.
    pub fn publish(&self, event: PaymentRecorded) -> usize {
        self.sender.send(event).unwrap_or_else(|_| {
            debug!("No payment event subscribers");
            0
        })
    }
}

fn payment_row(
    request: &PaymentRequest,
    amount: f64,
    recorded_at: DateTime<Utc>,
) -> transaction::ActiveModel {
    transaction::ActiveModel {
        student_id: Set(request.student_id),
        amount: Set(amount),
        payment_method: Set(request.method),
        payment_type: Set(request.payment_type),
        status: Set(TransactionStatus::Completed),
        description: Set(request.note.clone()),
        transaction_date: Set(recorded_at),
        ..Default::default()
    }
}

// Tagged by payment_type and prefixed, so both detection rules recognise it.
fn discount_row(request: &PaymentRequest, recorded_at: DateTime<Utc>) -> transaction::ActiveModel {
    let description = match request.note.as_deref() {
        Some(note) if !note.trim().is_empty() => format!("{LEGACY_DISCOUNT_PREFIX} {}", note.trim()),
        _ => format!("{LEGACY_DISCOUNT_PREFIX} applied with payment"),
    };

    transaction::ActiveModel {
        student_id: Set(request.student_id),
        amount: Set(request.discount),
        payment_method: Set(PaymentMethod::Discount),
        payment_type: Set(PaymentType::Discount),
        status: Set(TransactionStatus::Completed),
        description: Set(Some(description)),
        transaction_date: Set(recorded_at),
        ..Default::default()
    }
}

/// Records a payment, and a discount when one is given.
///
/// # Errors
/// - `InvalidAmount` for a non-positive payment (unless paying in full) or a negative discount
/// - `Validation` when paying in full but nothing is owed, or when the discount
///   exceeds the remaining balance (or covers all of it while paying in full)
/// - `Database` when the store rejects the write; neither row is kept in that case
pub async fn record_payment(
    db: &DatabaseConnection,
    request: &PaymentRequest,
    rule: DiscountRule,
    events: Option<&PaymentEvents>,
) -> Result<PaymentOutcome> {
    request.validate()?;

    let balance_before = balance::get_student_balance(db, request.student_id, rule).await?;

    let stale = request.displayed_remaining.and_then(|displayed| {
        let actual = balance_before.remaining();
        ((displayed - actual).abs() > BALANCE_EPSILON).then_some(StaleBalance { displayed, actual })
    });
    if let Some(stale) = stale {
        warn!(
            "Balance for student {} changed since it was displayed: shown {:.2}, now {:.2}",
            request.student_id, stale.displayed, stale.actual
        );
    }

    let remaining = balance_before.remaining();
    if request.discount > remaining + BALANCE_EPSILON {
        return Err(Error::validation(format!(
            "Discount {:.2} exceeds the remaining balance {:.2}",
            request.discount, remaining
        )));
    }

    let amount = if request.mark_full_paid {
        if remaining <= 0.0 {
            return Err(Error::validation("Balance is already fully paid"));
        }
        if request.discount >= remaining {
            return Err(Error::validation(
                "Discount covers the whole balance; nothing is left to pay",
            ));
        }
        remaining - request.discount
    } else {
        request.amount
    };

    let recorded_at = Utc::now();
    let txn = db.begin().await?;

    let payment = payment_row(request, amount, recorded_at).insert(&txn).await?;
    let discount = if request.discount > 0.0 {
        Some(discount_row(request, recorded_at).insert(&txn).await?)
    } else {
        None
    };

    txn.commit().await?;

    let balance_after = balance::get_student_balance(db, request.student_id, rule).await?;

    let event = PaymentRecorded {
        student_id: request.student_id,
        payment_id: payment.id,
        discount_id: discount.as_ref().map(|d| d.id),
        amount,
        discount: request.discount,
        method: request.method,
        recorded_at,
        total_paid: balance_after.total_paid,
        remaining: balance_after.remaining(),
    };

    info!(
        "Recorded payment of {:.2} (discount {:.2}) for student {}; remaining {:.2}",
        amount,
        request.discount,
        request.student_id,
        balance_after.remaining()
    );

    if let Some(events) = events {
        events.publish(event.clone());
    }

    Ok(PaymentOutcome {
        payment,
        discount,
        balance_before,
        balance_after,
        stale,
        event,
    })
}
