//! Domain entities and the glue that ties them to replicated collections.
//!
//! Every replicated entity implements [`Record`], which names the collection
//! it lives in and exposes the key its collection's order invariant sorts on.
//! The generic replica machinery in [`crate::replica`] is written entirely
//! against this trait.

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

mod driver;
mod location;
mod payment;
mod product;
mod sale;
mod schedule_entry;
mod settings;

pub use driver::{Driver, DriverCredentials, DriverType, NewDriver};
pub use location::{Location, LocationCategory, NewLocation};
pub use payment::Payment;
pub use product::{NewProduct, Product};
pub use sale::{CartLine, NewSale, PaymentMethod, Sale};
pub use schedule_entry::{ScheduleDraft, ScheduleEntry};
pub use settings::{default_settings, settings_row_id, CompanySettings, SettingsPatch};

/// Logical collections of the remote store.
///
/// The six list collections are mirrored by the replica; `Settings` is the
/// singleton row and is addressed through the same remote boundary but never
/// held as a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Products,
    Drivers,
    Sales,
    Locations,
    Schedule,
    Payments,
    Settings,
}

impl Collection {
    /// Remote collection name, as used on the wire and in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Drivers => "drivers",
            Collection::Sales => "sales",
            Collection::Locations => "locations",
            Collection::Schedule => "schedule",
            Collection::Payments => "payments",
            Collection::Settings => "settings",
        }
    }

    /// The order invariant the collection is kept in, both by the bootstrap
    /// fetch and by replica maintenance.
    pub fn order(self) -> CollectionOrder {
        match self {
            Collection::Products | Collection::Drivers | Collection::Locations => {
                CollectionOrder::NameAscending
            }
            Collection::Sales | Collection::Payments => CollectionOrder::TimestampDescending,
            Collection::Schedule => CollectionOrder::DateAscending,
            // The singleton has no list order; callers never sort it.
            Collection::Settings => CollectionOrder::NameAscending,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three orderings a replicated collection can be kept in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionOrder {
    /// Sorted by entity name, ascending. Re-sorted after inserts.
    NameAscending,
    /// Newest first. New entities are prepended; never re-sorted.
    TimestampDescending,
    /// Sorted by assignment date, ascending. Re-sorted after inserts.
    DateAscending,
}

/// Sort key of an entity within its collection's order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKey<'a> {
    Name(&'a str),
    Timestamp(DateTime<Utc>),
    Date(NaiveDate),
}

impl OrderKey<'_> {
    /// Ascending comparison between keys of the same collection.
    pub fn cmp_ascending(&self, other: &Self) -> Ordering {
        match (self, other) {
            (OrderKey::Name(a), OrderKey::Name(b)) => a.cmp(b),
            (OrderKey::Timestamp(a), OrderKey::Timestamp(b)) => a.cmp(b),
            (OrderKey::Date(a), OrderKey::Date(b)) => a.cmp(b),
            // Keys within one collection are always the same variant.
            _ => Ordering::Equal,
        }
    }
}

/// Shared active/inactive lifecycle flag for products and drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    Active,
    Inactive,
}

/// A replicated entity.
///
/// Ties the concrete type to its [`Collection`] and exposes the identifier
/// and order key the replica needs. Identifiers are unique within a
/// collection and immutable once created.
pub trait Record: Clone + fmt::Debug + Serialize + DeserializeOwned {
    /// Collection this entity replicates into.
    const COLLECTION: Collection;

    /// Entity identifier.
    fn id(&self) -> Uuid;

    /// Key the collection's order invariant sorts on.
    fn order_key(&self) -> OrderKey<'_>;
}
