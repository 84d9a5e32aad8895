//! Schedule generation commit protocol, reassignment and occupancy
//! enforcement.

use armada::entity::{Collection, ScheduleEntry};
use armada::test_helpers::FailPoint;
use armada::{occupancy, CommandError, Reassignment, RotationOptions, ScheduleError, SCHEDULED_DAYS};
use chrono::{NaiveDate, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use super::support;

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 3).unwrap()
}

/// Admin with `drivers` Dedicated drivers and `locations` rotation
/// locations.
fn admin_with_fleet(
    remote: &std::sync::Arc<armada::test_helpers::InMemoryRemote>,
    drivers: usize,
    locations: usize,
) -> armada::FleetClient<armada::test_helpers::InMemoryRemote> {
    let mut admin = support::connected_client(remote);
    for i in 0..locations {
        admin
            .add_location(support::new_rotation_location(&format!("L{}", i + 1)))
            .unwrap();
    }
    for i in 0..drivers {
        admin
            .add_driver(
                support::new_dedicated(&format!("Driver {}", i + 1)),
                support::credentials(&format!("driver{}@example.com", i + 1)),
            )
            .unwrap();
    }
    admin
}

#[test]
fn test_generate_commits_and_reloads_authoritative_copy() {
    let remote = support::remote();
    let mut admin = admin_with_fleet(&remote, 2, 4);

    let generated = admin
        .generate_schedule_from(&RotationOptions::new(3), monday())
        .expect("generate");

    assert_eq!(generated, 2 * SCHEDULED_DAYS);
    assert_eq!(admin.store().schedule().len(), 2 * SCHEDULED_DAYS);
    // Drafts carry no id; the reload brought back store-assigned ones.
    assert!(admin
        .store()
        .schedule()
        .iter()
        .all(|entry| entry.id != Uuid::nil()));
    // Replica holds the collection date ascending.
    let dates: Vec<_> = admin.store().schedule().iter().map(|e| e.date).collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);
}

#[test]
fn test_regeneration_replaces_prior_entries() {
    let remote = support::remote();
    let mut admin = admin_with_fleet(&remote, 2, 4);

    admin
        .generate_schedule_from(&RotationOptions::new(3), monday())
        .unwrap();
    admin
        .generate_schedule_from(&RotationOptions::new(2), monday())
        .unwrap();

    // Wholesale replacement: no stale duplicates for any (driver, date).
    assert_eq!(admin.store().schedule().len(), 2 * SCHEDULED_DAYS);
    let mut seen = HashSet::new();
    for entry in admin.store().schedule() {
        assert!(seen.insert((entry.driver_id, entry.date)));
    }
}

#[test]
fn test_generate_reports_no_eligible_drivers() {
    let remote = support::remote();
    let mut admin = admin_with_fleet(&remote, 0, 2);

    let err = admin
        .generate_schedule_from(&RotationOptions::new(1), monday())
        .unwrap_err();
    assert!(matches!(
        err,
        CommandError::Schedule(ScheduleError::NoEligibleDrivers)
    ));
    assert!(admin.store().schedule().is_empty());
}

#[test]
fn test_partial_commit_window_on_insert_failure() {
    let remote = support::remote();
    let mut admin = admin_with_fleet(&remote, 1, 2);
    admin
        .generate_schedule_from(&RotationOptions::new(1), monday())
        .unwrap();
    assert_eq!(remote.rows(Collection::Schedule).len(), SCHEDULED_DAYS);

    // Delete succeeds, insert fails: the documented non-atomic window.
    remote.fail_next(FailPoint::InsertMany);
    let err = admin
        .generate_schedule_from(&RotationOptions::new(1), monday())
        .unwrap_err();
    assert!(matches!(err, CommandError::Remote(_)));

    // The remote was left with the old rows deleted and nothing
    // reinserted; re-running the generation repairs it.
    assert!(remote.rows(Collection::Schedule).is_empty());
    admin
        .generate_schedule_from(&RotationOptions::new(1), monday())
        .expect("regenerate repairs the window");
    assert_eq!(remote.rows(Collection::Schedule).len(), SCHEDULED_DAYS);
}

#[test]
fn test_reassign_dedicated_updates_todays_entry() {
    let remote = support::remote();
    let mut admin = admin_with_fleet(&remote, 1, 2);
    let today = Utc::now().date_naive();
    admin
        .generate_schedule_from(&RotationOptions::new(1), today)
        .unwrap();

    let driver_id = admin.store().drivers().as_slice()[0].id;
    let assigned_today = admin
        .store()
        .schedule()
        .iter()
        .find(|e| e.driver_id == driver_id && e.date == today)
        .map(|e| e.location_id)
        .expect("entry for today");
    let target = admin
        .store()
        .locations()
        .iter()
        .find(|l| l.id != assigned_today)
        .cloned()
        .expect("free location");

    let outcome = admin
        .reassign_driver_for_day(driver_id, target.id, today)
        .expect("reassign");
    assert_eq!(outcome, Reassignment::Updated);

    let entry: Vec<&ScheduleEntry> = admin
        .store()
        .schedule()
        .iter()
        .filter(|e| e.driver_id == driver_id && e.date == today)
        .collect();
    assert_eq!(entry.len(), 1);
    assert_eq!(entry[0].location_id, target.id);
    assert_eq!(entry[0].location_name, target.name);
}

#[test]
fn test_reassign_mitra_overwrites_standing_location() {
    let remote = support::remote();
    let mut admin = support::connected_client(&remote);
    let l1 = admin
        .add_location(support::new_rotation_location("L1"))
        .unwrap();
    let l2 = admin
        .add_location(support::new_rotation_location("L2"))
        .unwrap();
    let driver = admin
        .add_driver(
            support::new_mitra("Budi", Some(l1.id)),
            support::credentials("budi@example.com"),
        )
        .unwrap();

    let outcome = admin
        .reassign_driver_today(driver.id, l2.id)
        .expect("reassign");
    assert_eq!(outcome, Reassignment::Updated);
    assert_eq!(
        admin
            .store()
            .get::<armada::entity::Driver>(driver.id)
            .unwrap()
            .location,
        Some(l2.id)
    );
}

#[test]
fn test_reassign_nothing_scheduled_for_dedicated_without_entry() {
    let remote = support::remote();
    let mut admin = support::connected_client(&remote);
    let location = admin
        .add_location(support::new_rotation_location("L1"))
        .unwrap();
    let driver = admin
        .add_driver(
            support::new_dedicated("Sari"),
            support::credentials("sari@example.com"),
        )
        .unwrap();

    let outcome = admin
        .reassign_driver_today(driver.id, location.id)
        .expect("reassign");
    assert_eq!(outcome, Reassignment::NothingScheduled);
}

#[test]
fn test_reassign_to_occupied_location_rejected() {
    let remote = support::remote();
    let mut admin = support::connected_client(&remote);
    let l1 = admin
        .add_location(support::new_rotation_location("L1"))
        .unwrap();
    let l2 = admin
        .add_location(support::new_rotation_location("L2"))
        .unwrap();
    let budi = admin
        .add_driver(
            support::new_mitra("Budi", Some(l1.id)),
            support::credentials("budi@example.com"),
        )
        .unwrap();
    let _sari = admin
        .add_driver(
            support::new_mitra("Sari", Some(l2.id)),
            support::credentials("sari@example.com"),
        )
        .unwrap();

    let err = admin.reassign_driver_today(budi.id, l2.id).unwrap_err();
    assert!(matches!(err, CommandError::LocationOccupied(id) if id == l2.id));
    // Neither side changed.
    assert_eq!(
        admin
            .store()
            .get::<armada::entity::Driver>(budi.id)
            .unwrap()
            .location,
        Some(l1.id)
    );
}

#[test]
fn test_occupancy_excludes_both_mitra_assignments() {
    let remote = support::remote();
    let mut admin = support::connected_client(&remote);
    let l1 = admin
        .add_location(support::new_rotation_location("L1"))
        .unwrap();
    let l2 = admin
        .add_location(support::new_rotation_location("L2"))
        .unwrap();
    let l3 = admin
        .add_location(support::new_rotation_location("L3"))
        .unwrap();
    let budi = admin
        .add_driver(
            support::new_mitra("Budi", Some(l1.id)),
            support::credentials("budi@example.com"),
        )
        .unwrap();
    let _sari = admin
        .add_driver(
            support::new_mitra("Sari", Some(l2.id)),
            support::credentials("sari@example.com"),
        )
        .unwrap();

    // For anyone other than the two assignees, both L1 and L2 are taken.
    let available = occupancy::available_locations(
        admin.store(),
        Utc::now().date_naive(),
        Uuid::new_v4(),
    );
    let ids: Vec<Uuid> = available.iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![l3.id]);

    // In Budi's own reassignment context his L1 is not counted against
    // him, but Sari's L2 still is.
    let available =
        occupancy::available_locations(admin.store(), Utc::now().date_naive(), budi.id);
    let ids: Vec<Uuid> = available.iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![l1.id, l3.id]);
}

#[test]
fn test_plan_determinism_over_random_inputs() {
    use armada::entity::{Driver, DriverType, EntityStatus, Location, LocationCategory};
    use chrono::{Duration, Weekday};
    use rand::Rng;

    let mut rng = rand::thread_rng();
    for _ in 0..20 {
        let drivers: Vec<Driver> = (0..rng.gen_range(1..=5))
            .map(|i| Driver {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                name: format!("Driver {}", i),
                driver_type: DriverType::Dedicated,
                contact: String::new(),
                status: EntityStatus::Active,
                location: None,
            })
            .collect();
        let locations: Vec<Location> = (0..rng.gen_range(1..=6))
            .map(|i| Location {
                id: Uuid::new_v4(),
                name: format!("L{}", i),
                category: LocationCategory::DailyRotation,
            })
            .collect();
        let mut options = RotationOptions::new(rng.gen_range(1..=7));
        if rng.gen_bool(0.5) {
            options = options.exclude(Weekday::Sun);
        }
        let start = monday() + Duration::days(rng.gen_range(0..365));

        let first = armada::plan_rotation(&drivers, &locations, &options, start).unwrap();
        let second = armada::plan_rotation(&drivers, &locations, &options, start).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), drivers.len() * SCHEDULED_DAYS);
        for driver in &drivers {
            assert_eq!(
                first.iter().filter(|e| e.driver_id == driver.id).count(),
                SCHEDULED_DAYS
            );
        }
    }
}

#[test]
fn test_clear_schedule_wipes_remote_and_replica() {
    let remote = support::remote();
    let mut admin = admin_with_fleet(&remote, 1, 2);
    admin
        .generate_schedule_from(&RotationOptions::new(1), monday())
        .unwrap();

    admin.clear_schedule().expect("clear");

    assert!(admin.store().schedule().is_empty());
    assert!(remote.rows(Collection::Schedule).is_empty());
}
