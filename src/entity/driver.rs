//! Drivers (mobile workers) and their creation inputs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Collection, EntityStatus, OrderKey, Record};

/// How a driver receives a daily location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverType {
    /// Rotation-scheduled; daily location comes from the schedule.
    Dedicated,
    /// Standing assignment; the `location` field on the driver is the
    /// assignment and is set directly.
    Mitra,
}

/// A mobile worker. `user_id` links 1:1 to an external identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub driver_type: DriverType,
    pub contact: String,
    pub status: EntityStatus,
    /// Standing location assignment; meaningful only for Mitra drivers.
    #[serde(default)]
    pub location: Option<Uuid>,
}

impl Driver {
    /// Whether the rotation scheduler considers this driver eligible.
    pub fn is_schedulable(&self) -> bool {
        self.status == EntityStatus::Active && self.driver_type == DriverType::Dedicated
    }
}

impl Record for Driver {
    const COLLECTION: Collection = Collection::Drivers;

    fn id(&self) -> Uuid {
        self.id
    }

    fn order_key(&self) -> OrderKey<'_> {
        OrderKey::Name(&self.name)
    }
}

/// Profile input for driver creation; identifier and identity link are
/// assigned by the command layer's two-phase create.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDriver {
    pub name: String,
    pub driver_type: DriverType,
    pub contact: String,
    pub status: EntityStatus,
    pub location: Option<Uuid>,
}

impl NewDriver {
    /// Materialize the full entity once the identity exists.
    pub fn into_driver(self, id: Uuid, user_id: Uuid) -> Driver {
        Driver {
            id,
            user_id,
            name: self.name,
            driver_type: self.driver_type,
            contact: self.contact,
            status: self.status,
            location: self.location,
        }
    }
}

/// Credentials for the identity created in phase one of driver creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverCredentials {
    pub email: String,
    pub password: String,
}
