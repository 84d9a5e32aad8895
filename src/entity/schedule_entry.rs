//! Rotation schedule entries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Collection, OrderKey, Record};

/// One driver's assignment for one calendar day.
///
/// Driver and location names are snapshots taken at generation time so the
/// schedule stays readable even after renames. Entries exist for Dedicated
/// drivers only; regeneration replaces a driver's entries wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub driver_name: String,
    pub date: NaiveDate,
    pub location_id: Uuid,
    pub location_name: String,
}

impl Record for ScheduleEntry {
    const COLLECTION: Collection = Collection::Schedule;

    fn id(&self) -> Uuid {
        self.id
    }

    fn order_key(&self) -> OrderKey<'_> {
        OrderKey::Date(self.date)
    }
}

/// A planned assignment not yet written to the remote store.
///
/// Drafts carry no identifier; the store assigns one on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDraft {
    pub driver_id: Uuid,
    pub driver_name: String,
    pub date: NaiveDate,
    pub location_id: Uuid,
    pub location_name: String,
}
