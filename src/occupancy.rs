//! Location-occupancy resolution for a single day.
//!
//! Answers "which locations are already claimed by someone else?" for a
//! target date, excluding the driver being reassigned. Used to build the
//! candidate list for manual single-day reassignment and to enforce the
//! no-double-booking rule at the command boundary. Bulk generation does
//! not consult this: its per-driver offsets are conflict-free by
//! construction.

use chrono::NaiveDate;
use std::collections::HashSet;
use uuid::Uuid;

use crate::entity::{DriverType, Location};
use crate::replica::ReplicaStore;

/// Locations claimed by drivers other than `excluding_driver` on `date`:
/// every other Mitra driver's standing assignment, plus every other
/// driver's schedule entry for that exact date.
pub fn occupied_locations(
    store: &ReplicaStore,
    date: NaiveDate,
    excluding_driver: Uuid,
) -> HashSet<Uuid> {
    let mut occupied = HashSet::new();
    for driver in store.drivers() {
        if driver.id == excluding_driver || driver.driver_type != DriverType::Mitra {
            continue;
        }
        if let Some(location_id) = driver.location {
            occupied.insert(location_id);
        }
    }
    for entry in store.schedule() {
        if entry.driver_id != excluding_driver && entry.date == date {
            occupied.insert(entry.location_id);
        }
    }
    occupied
}

/// All locations not occupied on `date`, name ascending.
pub fn available_locations<'a>(
    store: &'a ReplicaStore,
    date: NaiveDate,
    excluding_driver: Uuid,
) -> Vec<&'a Location> {
    let occupied = occupied_locations(store, date, excluding_driver);
    let mut available: Vec<&Location> = store
        .locations()
        .iter()
        .filter(|location| !occupied.contains(&location.id))
        .collect();
    available.sort_by(|a, b| a.name.cmp(&b.name));
    available
}
