//! Local setting entity - durable key-value documents kept on this device.
//!
//! The pricing table lives here as one JSON document under the `pricing_table` key.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One stored setting
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "local_settings")]
pub struct Model {
    /// Setting name, e.g. `"pricing_table"`
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    /// Serialized document
    pub value: String,
    /// Last write
    pub updated_at: DateTimeUtc,
}

/// Settings are standalone
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
