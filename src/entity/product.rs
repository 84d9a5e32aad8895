//! Catalog products.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Collection, EntityStatus, OrderKey, Record};

/// A product sold at the point of sale.
///
/// `price` and `commission` are per unit. Sales freeze the price in effect
/// at recording time; editing a product never rewrites past sales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub commission: Decimal,
    pub image_url: String,
    pub status: EntityStatus,
}

impl Record for Product {
    const COLLECTION: Collection = Collection::Products;

    fn id(&self) -> Uuid {
        self.id
    }

    fn order_key(&self) -> OrderKey<'_> {
        OrderKey::Name(&self.name)
    }
}

/// Input for creating a product; the command layer assigns the identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub commission: Decimal,
    pub image_url: String,
    pub status: EntityStatus,
}

impl NewProduct {
    /// Materialize the full entity under a fresh identifier.
    pub fn into_product(self, id: Uuid) -> Product {
        Product {
            id,
            name: self.name,
            price: self.price,
            commission: self.commission,
            image_url: self.image_url,
            status: self.status,
        }
    }
}
