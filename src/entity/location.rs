//! Sell locations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Collection, OrderKey, Record};

/// What kind of assignment a location participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LocationCategory {
    /// Eligible for the rotation scheduler's pool.
    DailyRotation,
    /// Permanently staffed; not rotated.
    Fixed,
    /// Ad-hoc event site.
    Event,
}

/// A place a driver can be assigned to sell at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub category: LocationCategory,
}

impl Location {
    /// Whether the rotation scheduler draws from this location.
    pub fn is_rotation_pool(&self) -> bool {
        self.category == LocationCategory::DailyRotation
    }
}

impl Record for Location {
    const COLLECTION: Collection = Collection::Locations;

    fn id(&self) -> Uuid {
        self.id
    }

    fn order_key(&self) -> OrderKey<'_> {
        OrderKey::Name(&self.name)
    }
}

/// Input for creating a location.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLocation {
    pub name: String,
    pub category: LocationCategory,
}

impl NewLocation {
    pub fn into_location(self, id: Uuid) -> Location {
        Location {
            id,
            name: self.name,
            category: self.category,
        }
    }
}
