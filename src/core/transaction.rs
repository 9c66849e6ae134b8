//! Ledger queries - reading and deleting transaction rows.
//!
//! Rows are written only by the payment workflow (see [`crate::core::payment`]).
//! There is no update or void: a wrong entry is removed with [`delete_transaction`]
//! and the balance is recomputed from what remains.

use crate::{
    entities::{Transaction, transaction},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, prelude::*};
use tracing::info;

/// Retrieves all transactions for a student, newest first.
pub async fn get_transactions_for_student(
    db: &DatabaseConnection,
    student_id: i64,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::StudentId.eq(student_id))
        .order_by_desc(transaction::Column::TransactionDate)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves every transaction in the ledger, newest first.
pub async fn get_all_transactions(db: &DatabaseConnection) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .order_by_desc(transaction::Column::TransactionDate)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves transactions recorded at or after `since`, newest first.
pub async fn get_transactions_since(
    db: &DatabaseConnection,
    since: DateTime<Utc>,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::TransactionDate.gte(since))
        .order_by_desc(transaction::Column::TransactionDate)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a specific transaction by its unique ID.
///
/// Returns `None` if the transaction doesn't exist.
pub async fn get_transaction_by_id(
    db: &DatabaseConnection,
    transaction_id: i64,
) -> Result<Option<transaction::Model>> {
    Transaction::find_by_id(transaction_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Permanently deletes a transaction (payment or discount).
pub async fn delete_transaction(db: &DatabaseConnection, transaction_id: i64) -> Result<()> {
    let result = Transaction::delete_by_id(transaction_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::TransactionNotFound { id: transaction_id });
    }
    info!("Deleted transaction {}", transaction_id);
    Ok(())
}
