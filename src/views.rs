//! Read-side derivations over the replica.
//!
//! The driver-facing queries that only read replicated state: the
//! current assignment, the upcoming schedule window, and per-day sales
//! totals. Pure functions; the presentation layer formats the results.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::entity::{Driver, DriverType, Location, Product, ScheduleEntry};
use crate::replica::ReplicaStore;

/// Where a driver is assigned on a given day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub location_id: Uuid,
    pub location_name: String,
}

/// A driver's assignment for `date`: the schedule entry for Dedicated
/// drivers, the standing location for Mitra drivers, or `None` when
/// unassigned.
pub fn current_assignment(
    store: &ReplicaStore,
    driver: &Driver,
    date: NaiveDate,
) -> Option<Assignment> {
    match driver.driver_type {
        DriverType::Dedicated => store
            .schedule()
            .iter()
            .find(|entry| entry.driver_id == driver.id && entry.date == date)
            .map(|entry| Assignment {
                location_id: entry.location_id,
                location_name: entry.location_name.clone(),
            }),
        DriverType::Mitra => driver
            .location
            .and_then(|id| store.get::<Location>(id))
            .map(|location| Assignment {
                location_id: location.id,
                location_name: location.name.clone(),
            }),
    }
}

/// The driver's schedule entries in `[from, from + days)`, date
/// ascending.
pub fn upcoming_schedule<'a>(
    store: &'a ReplicaStore,
    driver_id: Uuid,
    from: NaiveDate,
    days: u32,
) -> Vec<&'a ScheduleEntry> {
    let end = from + Duration::days(i64::from(days));
    store
        .schedule()
        .iter()
        .filter(|entry| entry.driver_id == driver_id && entry.date >= from && entry.date < end)
        .collect()
}

/// One driver's sales totals for one day.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SalesSummary {
    pub revenue: Decimal,
    pub items_sold: u64,
    /// Estimated from current product commissions; sales whose product no
    /// longer resolves contribute zero.
    pub estimated_commission: Decimal,
}

/// Totals of the driver's sales recorded on `day` (UTC calendar day).
pub fn sales_summary(store: &ReplicaStore, driver_id: Uuid, day: NaiveDate) -> SalesSummary {
    let mut summary = SalesSummary::default();
    for sale in store.sales() {
        if sale.driver_id != driver_id || sale.timestamp.date_naive() != day {
            continue;
        }
        summary.revenue += sale.total;
        summary.items_sold += u64::from(sale.quantity);
        if let Some(product) = store.get::<Product>(sale.product_id) {
            summary.estimated_commission += product.commission * Decimal::from(sale.quantity);
        }
    }
    summary
}
