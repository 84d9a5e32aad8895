//! Multi-client integration tests.
//!
//! Each client is an independent process in production; here every
//! client runs in its own `may` coroutine against one shared
//! [`InMemoryRemote`], coordinating only through remote writes and feed
//! drains, the same shape as the real deployment (one admin console,
//! many driver clients).

use std::sync::Arc;

use armada::entity::{
    DriverCredentials, DriverType, EntityStatus, LocationCategory, NewDriver, NewLocation,
    NewProduct, NewSale, PaymentMethod,
};
use armada::test_helpers::InMemoryRemote;
use armada::{views, ClientConfig, CommandError, FleetClient, Reassignment, RotationOptions};
use chrono::Utc;
use rust_decimal::Decimal;

fn client(remote: &Arc<InMemoryRemote>) -> FleetClient<InMemoryRemote> {
    FleetClient::new(Arc::clone(remote), ClientConfig::default())
}

fn add_location(admin: &mut FleetClient<InMemoryRemote>, name: &str) -> armada::entity::Location {
    admin
        .add_location(NewLocation {
            name: name.to_string(),
            category: LocationCategory::DailyRotation,
        })
        .expect("add location")
}

fn add_driver(
    admin: &mut FleetClient<InMemoryRemote>,
    name: &str,
    driver_type: DriverType,
    location: Option<uuid::Uuid>,
) -> armada::entity::Driver {
    admin
        .add_driver(
            NewDriver {
                name: name.to_string(),
                driver_type,
                contact: String::new(),
                status: EntityStatus::Active,
                location,
            },
            DriverCredentials {
                email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
                password: "hunter2hunter2".to_string(),
            },
        )
        .expect("add driver")
}

#[test]
fn test_concurrent_driver_clients_record_sales() {
    may::config().set_stack_size(0x40000);

    let remote = Arc::new(InMemoryRemote::new());
    let mut admin = client(&remote);
    admin.bootstrap().expect("bootstrap");
    admin.attach_feed().expect("feed");

    let product = admin
        .add_product(NewProduct {
            name: "Es Teh".to_string(),
            price: Decimal::new(5000, 0),
            commission: Decimal::new(500, 0),
            image_url: String::new(),
            status: EntityStatus::Active,
        })
        .expect("add product");

    const DRIVERS: usize = 4;
    const SALES_EACH: u32 = 5;
    let mut driver_ids = Vec::new();
    for i in 0..DRIVERS {
        let location = add_location(&mut admin, &format!("L{}", i + 1));
        let driver = add_driver(
            &mut admin,
            &format!("Driver {}", i + 1),
            DriverType::Mitra,
            Some(location.id),
        );
        driver_ids.push(driver.id);
    }

    let mut handles = Vec::new();
    for driver_id in driver_ids {
        let remote = Arc::clone(&remote);
        let product_id = product.id;
        handles.push(may::go!(move || {
            let mut driver_client = client(&remote);
            driver_client.bootstrap().expect("driver bootstrap");
            for _ in 0..SALES_EACH {
                driver_client
                    .record_sale(NewSale {
                        driver_id,
                        product_id,
                        quantity: 1,
                        payment_method: PaymentMethod::Cash,
                    })
                    .expect("record sale");
            }
        }));
    }
    for handle in handles {
        handle.join().expect("driver client coroutine");
    }

    // Every sale lands in the admin replica through the feed.
    admin.drain_feed();
    assert_eq!(
        admin.store().sales().len(),
        DRIVERS * SALES_EACH as usize
    );
    let revenue: Decimal = admin.store().sales().iter().map(|s| s.total).sum();
    assert_eq!(
        revenue,
        Decimal::new(5000, 0) * Decimal::from(DRIVERS as u32 * SALES_EACH)
    );
}

#[test]
fn test_reassignment_respects_replicated_occupancy() {
    let remote = Arc::new(InMemoryRemote::new());
    let mut admin = client(&remote);
    admin.bootstrap().expect("bootstrap");

    let l1 = add_location(&mut admin, "L1");
    let l2 = add_location(&mut admin, "L2");
    let free = add_location(&mut admin, "L3");
    let budi = add_driver(&mut admin, "Budi", DriverType::Mitra, Some(l1.id));
    let sari = add_driver(&mut admin, "Sari", DriverType::Mitra, Some(l2.id));

    let mut budi_client = client(&remote);
    budi_client.bootstrap().expect("bootstrap");
    budi_client.attach_feed().expect("feed");
    let mut sari_client = client(&remote);
    sari_client.bootstrap().expect("bootstrap");
    sari_client.attach_feed().expect("feed");

    // Budi claims the free location first.
    assert_eq!(
        budi_client
            .reassign_driver_today(budi.id, free.id)
            .expect("reassign"),
        Reassignment::Updated
    );

    // Once Sari's replica has caught up, the same target is rejected.
    sari_client.drain_feed();
    let err = sari_client
        .reassign_driver_today(sari.id, free.id)
        .unwrap_err();
    assert!(matches!(err, CommandError::LocationOccupied(id) if id == free.id));
}

#[test]
fn test_admin_schedule_reaches_driver_dashboard_views() {
    let remote = Arc::new(InMemoryRemote::new());
    let mut admin = client(&remote);
    admin.bootstrap().expect("bootstrap");

    add_location(&mut admin, "Alun-Alun");
    add_location(&mut admin, "Stasiun");
    let driver = add_driver(&mut admin, "Sari", DriverType::Dedicated, None);
    admin
        .generate_schedule(&RotationOptions::new(1))
        .expect("generate");

    // A driver client that bootstraps afterwards sees the committed
    // schedule and can answer its dashboard queries from the replica.
    let mut driver_client = client(&remote);
    driver_client.bootstrap().expect("bootstrap");

    let today = Utc::now().date_naive();
    let held_driver = driver_client
        .store()
        .get::<armada::entity::Driver>(driver.id)
        .cloned()
        .expect("driver replicated");
    let assignment = views::current_assignment(driver_client.store(), &held_driver, today)
        .expect("assigned today");
    assert!(["Alun-Alun", "Stasiun"].contains(&assignment.location_name.as_str()));

    let week = views::upcoming_schedule(driver_client.store(), driver.id, today, 7);
    assert_eq!(week.len(), 7);
    // Interval 1 over two locations alternates day by day.
    for pair in week.windows(2) {
        assert_ne!(pair[0].location_id, pair[1].location_id);
    }
}
