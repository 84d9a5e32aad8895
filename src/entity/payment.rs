//! Driver payroll payments.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Collection, OrderKey, Record};

/// A payroll payment to a driver for a pay period. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: Uuid,
    pub driver_id: Uuid,
    /// Human-readable pay period label, e.g. `"2026-07"`.
    pub period: String,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Record for Payment {
    const COLLECTION: Collection = Collection::Payments;

    fn id(&self) -> Uuid {
        self.id
    }

    fn order_key(&self) -> OrderKey<'_> {
        OrderKey::Timestamp(self.timestamp)
    }
}
