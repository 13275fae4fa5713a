//! Value types of the purchase flow.

use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Ticket count of one order, always within `[1, 10]`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u8);

impl Quantity {
    /// Smallest order
    pub const MIN: Self = Self(1);
    /// Largest order
    pub const MAX: Self = Self(10);

    /// Coerce any requested count into `[1, 10]`
    #[must_use]
    pub fn clamped(requested: i64) -> Self {
        let bounded = requested.clamp(i64::from(Self::MIN.0), i64::from(Self::MAX.0));
        // bounded fits in u8 after the clamp
        Self(u8::try_from(bounded).unwrap_or(Self::MAX.0))
    }

    /// The count
    #[must_use]
    pub fn get(self) -> u32 {
        u32::from(self.0)
    }

    /// One more, capped at the maximum
    #[must_use]
    pub fn incremented(self) -> Self {
        Self::clamped(i64::from(self.0) + 1)
    }

    /// One less, floored at the minimum
    #[must_use]
    pub fn decremented(self) -> Self {
        Self::clamped(i64::from(self.0) - 1)
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::MIN
    }
}

impl TryFrom<u32> for Quantity {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if (Self::MIN.get()..=Self::MAX.get()).contains(&value) {
            Ok(Self::clamped(i64::from(value)))
        } else {
            Err(format!("quantity {value} is outside 1..=10"))
        }
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.get()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Phase of the purchase state machine
///
/// ```text
/// Selecting --submit--> Processing --ok--> Confirmed
///                           \--error/timeout--> Failed --retry--> Processing
///                                                  \--return--> Selecting
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PurchaseStage {
    /// Choosing tier and quantity
    #[default]
    Selecting,
    /// Payment in flight
    Processing,
    /// Payment confirmed, receipt available
    Confirmed,
    /// Payment declined or timed out
    Failed,
}

impl PurchaseStage {
    /// Whether tier and quantity may still change
    #[must_use]
    pub const fn is_editable(self) -> bool {
        matches!(self, Self::Selecting)
    }
}

/// Confirmation receipt of a completed purchase
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Order id, stable across retries of the same submission
    pub order_id: Uuid,
    /// Event id
    pub event_id: String,
    /// Event title
    pub event_title: String,
    /// Tier id
    pub tier_id: String,
    /// Tier name
    pub tier_name: String,
    /// Ticket count
    pub quantity: Quantity,
    /// Price of one ticket
    pub unit_price: Money,
    /// Amount charged
    pub total: Money,
    /// Processor transaction id
    pub transaction_id: String,
    /// When the payment was confirmed
    pub confirmed_at: DateTime<Utc>,
}

/// Everything a view needs to render the flow, with pricing already derived
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PurchaseView {
    /// Current stage
    pub stage: PurchaseStage,
    /// Selected tier id
    pub tier_id: String,
    /// Selected tier name
    pub tier_name: String,
    /// Selected quantity
    pub quantity: Quantity,
    /// Price of one ticket at the selected tier
    pub unit_price: Money,
    /// `base × multiplier × quantity`
    pub total: Money,
    /// Present once `Confirmed`
    pub receipt: Option<Receipt>,
    /// Present while `Failed`
    pub last_error: Option<String>,
}
