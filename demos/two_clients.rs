//! Two clients sharing one remote: an admin console provisions the
//! fleet and generates the rotation, a driver client observes it
//! through its change feed and records sales.
//!
//! Run with: `cargo run --example two_clients`

use std::sync::Arc;

use armada::entity::{
    CartLine, DriverCredentials, DriverType, EntityStatus, LocationCategory, NewDriver,
    NewLocation, NewProduct, PaymentMethod,
};
use armada::test_helpers::InMemoryRemote;
use armada::{views, ClientConfig, FleetClient, RotationOptions};
use chrono::Utc;
use rust_decimal::Decimal;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    may::config().set_stack_size(0x40000);

    let remote = Arc::new(InMemoryRemote::new());

    // Admin console: bootstrap, provision the fleet, generate a rotation.
    let mut admin = FleetClient::new(Arc::clone(&remote), ClientConfig::default());
    admin.bootstrap()?;
    admin.attach_feed()?;

    let product = admin.add_product(NewProduct {
        name: "Es Teh".to_string(),
        price: Decimal::new(5000, 0),
        commission: Decimal::new(500, 0),
        image_url: String::new(),
        status: EntityStatus::Active,
    })?;
    for name in ["Alun-Alun", "Pasar", "Stasiun"] {
        admin.add_location(NewLocation {
            name: name.to_string(),
            category: LocationCategory::DailyRotation,
        })?;
    }
    let driver = admin.add_driver(
        NewDriver {
            name: "Sari".to_string(),
            driver_type: DriverType::Dedicated,
            contact: "0812-0000-0000".to_string(),
            status: EntityStatus::Active,
            location: None,
        },
        DriverCredentials {
            email: "sari@example.com".to_string(),
            password: "hunter2hunter2".to_string(),
        },
    )?;
    let generated = admin.generate_schedule(&RotationOptions::new(3))?;
    println!("admin: generated {} schedule entries", generated);

    // Driver client in its own coroutine, coordinating only through the
    // shared remote.
    let driver_remote = Arc::clone(&remote);
    let driver_id = driver.id;
    let product_id = product.id;
    let handle = may::go!(move || {
        let mut client = FleetClient::new(driver_remote, ClientConfig::default());
        client.bootstrap().expect("driver bootstrap");

        let today = Utc::now().date_naive();
        let me = client
            .store()
            .get::<armada::entity::Driver>(driver_id)
            .cloned()
            .expect("driver replicated");
        let assignment =
            views::current_assignment(client.store(), &me, today).expect("assigned today");
        println!("driver: today's location is {}", assignment.location_name);

        client
            .record_cart(
                driver_id,
                &[CartLine {
                    product_id,
                    quantity: 2,
                }],
                PaymentMethod::Qris,
            )
            .expect("record cart");

        let summary = views::sales_summary(client.store(), driver_id, today);
        println!(
            "driver: {} items sold, revenue {}, commission {}",
            summary.items_sold, summary.revenue, summary.estimated_commission
        );
    });
    handle.join().expect("driver client coroutine");

    // The sale flows back to the admin through the change feed.
    let applied = admin.drain_feed();
    println!("admin: applied {} feed events", applied);
    println!("admin: {} sales in replica", admin.store().sales().len());

    Ok(())
}
