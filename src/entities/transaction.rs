//! Transaction entity - the school's financial ledger.
//!
//! Each row is either a payment or a discount. `amount` is never negative; a
//! discount is tagged through `payment_type` rather than a sign.
use crate::core::types::{PaymentMethod, PaymentType, TransactionStatus};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Paying student
    pub student_id: i64,
    /// Non-negative amount in the school's currency
    pub amount: f64,
    /// How the amount was tendered (`discount` for discount rows)
    pub payment_method: PaymentMethod,
    /// What the entry is for; `discount` tags a discount
    pub payment_type: PaymentType,
    /// Settlement state
    pub status: TransactionStatus,
    /// Optional note entered with the payment
    pub description: Option<String>,
    /// When the entry was recorded; newest first is the display order
    pub transaction_date: DateTimeUtc,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one student
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
