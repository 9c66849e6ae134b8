//! Pricing table - course × session time × plan → price.
//!
//! The table is a plain value that callers own and pass to the enrollment workflow.
//! It is loaded from the `local_settings` key-value table at startup, written back on
//! every edit, and can be reset to the built-in defaults. A persisted document that
//! cannot be read (wrong shape, missing cells) is ignored in favour of the defaults.

use crate::{
    core::types::{Course, PaymentPlan, SessionTime},
    entities::{LocalSetting, local_setting},
    errors::Result,
};
use chrono::Utc;
use sea_orm::{Set, prelude::*};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Key under which the pricing document is stored.
pub const PRICING_STATE_KEY: &str = "pricing_table";

/// Nested JSON shape of the persisted table: `{course: {session: {plan_days: price}}}`.
pub type PricingDocument = BTreeMap<String, BTreeMap<String, BTreeMap<String, u32>>>;

type Cells = [[[u32; 4]; 2]; 2];

// Indexed [course][session_time][plan] in the order of the `ALL` constants.
const DEFAULT_PRICES: Cells = [
    // motorcycle
    [[300, 1800, 3500, 6000], [500, 3000, 5500, 10000]],
    // car
    [[500, 3000, 5500, 10000], [800, 5000, 9000, 16000]],
];

/// Prices for every valid course selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingTable {
    prices: Cells,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            prices: DEFAULT_PRICES,
        }
    }
}

impl PricingTable {
    /// Price of one cell.
    #[must_use]
    pub const fn get_price(&self, course: Course, session: SessionTime, plan: PaymentPlan) -> u32 {
        self.prices[course.index()][session.index()][plan.index()]
    }

    /// Price lookup from raw form keys.
    ///
    /// # Errors
    /// Returns `InvalidSelection` when any key is outside the fixed enumerations.
    pub fn price_for_keys(&self, course: &str, session: &str, plan: &str) -> Result<u32> {
        Ok(self.get_price(course.parse()?, session.parse()?, plan.parse()?))
    }

    /// Overwrites one cell.
    pub fn set_price(
        &mut self,
        course: Course,
        session: SessionTime,
        plan: PaymentPlan,
        amount: u32,
    ) {
        self.prices[course.index()][session.index()][plan.index()] = amount;
    }

    /// Restores the built-in defaults.
    pub fn reset_to_default(&mut self) {
        self.prices = DEFAULT_PRICES;
    }

    /// True if the table still holds the built-in defaults.
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.prices == DEFAULT_PRICES
    }

    /// Converts the table into its persisted document shape.
    #[must_use]
    pub fn to_document(&self) -> PricingDocument {
        let mut document = PricingDocument::new();
        for course in Course::ALL {
            let sessions = document.entry(course.key().to_string()).or_default();
            for session in SessionTime::ALL {
                let plans = sessions.entry(session.key().to_string()).or_default();
                for plan in PaymentPlan::ALL {
                    plans.insert(plan.to_string(), self.get_price(course, session, plan));
                }
            }
        }
        document
    }

    /// Rebuilds a table from a persisted document.
    ///
    /// Returns `None` if any of the sixteen cells is missing.
    #[must_use]
    pub fn from_document(document: &PricingDocument) -> Option<Self> {
        let mut table = Self::default();
        for course in Course::ALL {
            let sessions = document.get(course.key())?;
            for session in SessionTime::ALL {
                let plans = sessions.get(session.key())?;
                for plan in PaymentPlan::ALL {
                    let price = *plans.get(&plan.to_string())?;
                    table.set_price(course, session, plan, price);
                }
            }
        }
        Some(table)
    }

    /// Serializes the table to its JSON document.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_document())?)
    }
}

/// Coerces raw price input to a non-negative whole amount.
///
/// Fractions are truncated; anything unparseable, negative or not finite becomes zero.
#[must_use]
// Cast safety: value is finite, non-negative and clamped to u32::MAX before truncation.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn coerce_price_input(raw: &str) -> u32 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value.min(f64::from(u32::MAX)) as u32,
        _ => 0,
    }
}

/// Loads the persisted pricing table, falling back to the defaults.
pub async fn load_pricing<C>(db: &C) -> Result<PricingTable>
where
    C: ConnectionTrait,
{
    let state = LocalSetting::find_by_id(PRICING_STATE_KEY).one(db).await?;

    let Some(state) = state else {
        info!("No saved pricing found, using default pricing table");
        return Ok(PricingTable::default());
    };

    match serde_json::from_str::<PricingDocument>(&state.value) {
        Ok(document) => PricingTable::from_document(&document).map_or_else(
            || {
                warn!("Saved pricing table is incomplete, using default pricing table");
                Ok(PricingTable::default())
            },
            Ok,
        ),
        Err(e) => {
            warn!("Saved pricing table is unreadable ({e}), using default pricing table");
            Ok(PricingTable::default())
        }
    }
}

/// Writes the pricing table to the key-value store, replacing any previous document.
pub async fn save_pricing<C>(db: &C, table: &PricingTable) -> Result<()>
where
    C: ConnectionTrait,
{
    let value = table.to_json()?;
    let now = Utc::now();

    let existing = LocalSetting::find_by_id(PRICING_STATE_KEY).one(db).await?;

    if let Some(state) = existing {
        let mut active_model: local_setting::ActiveModel = state.into();
        active_model.value = Set(value);
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        let new_state = local_setting::ActiveModel {
            key: Set(PRICING_STATE_KEY.to_string()),
            value: Set(value),
            updated_at: Set(now),
        };
        new_state.insert(db).await?;
    }

    Ok(())
}

/// Edits one cell and persists the table immediately.
pub async fn update_price<C>(
    db: &C,
    table: &mut PricingTable,
    course: Course,
    session: SessionTime,
    plan: PaymentPlan,
    amount: u32,
) -> Result<()>
where
    C: ConnectionTrait,
{
    table.set_price(course, session, plan, amount);
    save_pricing(db, table).await?;
    info!(
        "Price for {} {} {}-day plan set to {}",
        course.key(),
        session.key(),
        plan.days(),
        amount
    );
    Ok(())
}

/// Restores the default table and persists it.
pub async fn reset_pricing<C>(db: &C, table: &mut PricingTable) -> Result<()>
where
    C: ConnectionTrait,
{
    table.reset_to_default();
    save_pricing(db, table).await?;
    info!("Pricing table reset to defaults");
    Ok(())
}
