//! Shared fixtures for the integration tests.

use std::sync::Arc;

use armada::entity::{
    DriverCredentials, DriverType, EntityStatus, LocationCategory, NewDriver, NewLocation,
    NewProduct,
};
use armada::test_helpers::InMemoryRemote;
use armada::{ClientConfig, FleetClient};
use rust_decimal::Decimal;
use uuid::Uuid;

pub fn remote() -> Arc<InMemoryRemote> {
    Arc::new(InMemoryRemote::new())
}

pub fn client(remote: &Arc<InMemoryRemote>) -> FleetClient<InMemoryRemote> {
    FleetClient::new(Arc::clone(remote), ClientConfig::default())
}

/// A client that has bootstrapped and attached its change feed.
pub fn connected_client(remote: &Arc<InMemoryRemote>) -> FleetClient<InMemoryRemote> {
    let mut client = client(remote);
    client.bootstrap().expect("bootstrap");
    client.attach_feed().expect("attach feed");
    client
}

pub fn new_product(name: &str, price: i64) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        price: Decimal::new(price, 0),
        commission: Decimal::new(price / 10, 0),
        image_url: String::new(),
        status: EntityStatus::Active,
    }
}

pub fn new_dedicated(name: &str) -> NewDriver {
    NewDriver {
        name: name.to_string(),
        driver_type: DriverType::Dedicated,
        contact: "0812-0000-0000".to_string(),
        status: EntityStatus::Active,
        location: None,
    }
}

pub fn new_mitra(name: &str, location: Option<Uuid>) -> NewDriver {
    NewDriver {
        name: name.to_string(),
        driver_type: DriverType::Mitra,
        contact: "0812-0000-0000".to_string(),
        status: EntityStatus::Active,
        location,
    }
}

pub fn new_rotation_location(name: &str) -> NewLocation {
    NewLocation {
        name: name.to_string(),
        category: LocationCategory::DailyRotation,
    }
}

pub fn credentials(email: &str) -> DriverCredentials {
    DriverCredentials {
        email: email.to_string(),
        password: "hunter2hunter2".to_string(),
    }
}
