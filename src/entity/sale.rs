//! Point-of-sale transactions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Collection, OrderKey, Record};

/// How a sale was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Qris,
}

/// A recorded transaction. Append-only; never mutated after creation.
///
/// `total` is frozen at recording time from the product price then in
/// effect, and the driver/product/location names are snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub driver_name: String,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: u32,
    pub total: Decimal,
    /// Name of the location the sale happened at.
    pub location: String,
    pub payment_method: PaymentMethod,
    pub timestamp: DateTime<Utc>,
}

impl Record for Sale {
    const COLLECTION: Collection = Collection::Sales;

    fn id(&self) -> Uuid {
        self.id
    }

    fn order_key(&self) -> OrderKey<'_> {
        OrderKey::Timestamp(self.timestamp)
    }
}

/// Input for recording a sale.
///
/// The command layer resolves the driver, product and current assignment
/// from the replica, computes the frozen total and stamps the time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSale {
    pub driver_id: Uuid,
    pub product_id: Uuid,
    pub quantity: u32,
    pub payment_method: PaymentMethod,
}

/// One line of a cart checkout: product and quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: u32,
}
