//! Rotation schedule planning.
//!
//! Pure calendar arithmetic over the replica's current drivers and
//! locations; no I/O. The command layer owns the commit protocol
//! (delete, insert, reload) in [`crate::command`].

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashSet;
use std::fmt;

use crate::entity::{Driver, Location, ScheduleDraft};

/// Number of scheduled (non-excluded) days one generation run covers.
/// The calendar span grows past this when exclusions are dense.
pub const SCHEDULED_DAYS: usize = 30;

/// Tuning for one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationOptions {
    /// Scheduled days a driver stays on one location before rotating.
    pub rotation_interval: u32,
    /// Weekdays skipped entirely (weekly days off).
    pub excluded_days: Vec<Weekday>,
}

impl RotationOptions {
    pub fn new(rotation_interval: u32) -> Self {
        Self {
            rotation_interval,
            excluded_days: Vec::new(),
        }
    }

    pub fn exclude(mut self, day: Weekday) -> Self {
        self.excluded_days.push(day);
        self
    }
}

/// Why a generation run could not produce a plan. Reported, never a
/// crash; the caller surfaces it as a user-facing condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    /// No active Dedicated drivers to assign.
    NoEligibleDrivers,
    /// No DailyRotation locations to draw from.
    NoEligibleLocations,
    /// `rotation_interval` must be positive.
    InvalidRotationInterval,
    /// Every weekday is excluded; no day can ever be scheduled.
    AllDaysExcluded,
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::NoEligibleDrivers => {
                write!(f, "no active dedicated drivers available for scheduling")
            }
            ScheduleError::NoEligibleLocations => {
                write!(f, "no rotation locations available for scheduling")
            }
            ScheduleError::InvalidRotationInterval => {
                write!(f, "rotation interval must be at least 1 day")
            }
            ScheduleError::AllDaysExcluded => {
                write!(f, "every weekday is excluded; nothing can be scheduled")
            }
        }
    }
}

impl std::error::Error for ScheduleError {}

/// Plan a rotation covering [`SCHEDULED_DAYS`] scheduled days from
/// `start_date`.
///
/// Eligibility: active Dedicated drivers, DailyRotation locations. Each
/// driver starts at a fixed offset equal to its index in the driver list
/// (the replica's stable name order), then advances one location every
/// `rotation_interval` scheduled days, wrapping around the pool:
/// location index = `(offset + d / interval) % pool_len` for scheduled
/// day `d`. Excluded weekdays consume calendar days but not scheduled
/// days.
///
/// Deterministic: identical inputs produce an identical draft list.
/// Collisions between drivers are impossible while the driver count does
/// not exceed the pool size; beyond that the pool wraps and double
/// assignment is accepted.
///
/// # Errors
///
/// Returns a [`ScheduleError`] when no eligible driver or location
/// exists, the interval is zero, or all seven weekdays are excluded.
pub fn plan_rotation(
    drivers: &[Driver],
    locations: &[Location],
    options: &RotationOptions,
    start_date: NaiveDate,
) -> Result<Vec<ScheduleDraft>, ScheduleError> {
    if options.rotation_interval == 0 {
        return Err(ScheduleError::InvalidRotationInterval);
    }
    let excluded: HashSet<Weekday> = options.excluded_days.iter().copied().collect();
    if excluded.len() >= 7 {
        return Err(ScheduleError::AllDaysExcluded);
    }

    let eligible: Vec<&Driver> = drivers.iter().filter(|d| d.is_schedulable()).collect();
    if eligible.is_empty() {
        return Err(ScheduleError::NoEligibleDrivers);
    }
    let pool: Vec<&Location> = locations.iter().filter(|l| l.is_rotation_pool()).collect();
    if pool.is_empty() {
        return Err(ScheduleError::NoEligibleLocations);
    }

    let interval = options.rotation_interval as usize;
    let mut drafts = Vec::with_capacity(SCHEDULED_DAYS * eligible.len());
    let mut scheduled = 0usize;
    for date in start_date.iter_days() {
        if scheduled == SCHEDULED_DAYS {
            break;
        }
        if excluded.contains(&date.weekday()) {
            continue;
        }
        let rotation_step = scheduled / interval;
        for (offset, driver) in eligible.iter().enumerate() {
            let location = pool[(offset + rotation_step) % pool.len()];
            drafts.push(ScheduleDraft {
                driver_id: driver.id,
                driver_name: driver.name.clone(),
                date,
                location_id: location.id,
                location_name: location.name.clone(),
            });
        }
        scheduled += 1;
    }
    Ok(drafts)
}
