//! Bootstrap: settings read-or-create, ordered loads, all-or-nothing.

use armada::entity::{settings_row_id, Collection, Sale};
use armada::test_helpers::FailPoint;
use armada::RemoteStore;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use uuid::Uuid;

use super::support;

#[test]
fn test_bootstrap_creates_settings_when_absent() {
    let remote = support::remote();
    let mut client = support::client(&remote);

    client.bootstrap().expect("bootstrap");

    let settings = client.store().settings().expect("settings loaded");
    assert_eq!(settings.id, settings_row_id());
    // The created row is now visible to every other client.
    assert!(remote.fetch_settings().unwrap().is_some());
}

#[test]
fn test_bootstrap_keeps_existing_settings_row() {
    let remote = support::remote();
    let mut first = support::client(&remote);
    first.bootstrap().expect("bootstrap");
    first
        .update_settings(armada::entity::SettingsPatch {
            currency: Some("USD".to_string()),
            ..Default::default()
        })
        .expect("update settings");

    let mut second = support::client(&remote);
    second.bootstrap().expect("bootstrap");
    assert_eq!(second.store().settings().unwrap().currency, "USD");
}

#[test]
fn test_bootstrap_loads_collections_in_canonical_order() {
    let remote = support::remote();
    let mut admin = support::client(&remote);
    admin.bootstrap().expect("bootstrap");
    for name in ["Sate", "Bakso", "Es Teh"] {
        admin.add_product(support::new_product(name, 5000)).unwrap();
    }

    let mut fresh = support::client(&remote);
    fresh.bootstrap().expect("bootstrap");
    let names: Vec<&str> = fresh
        .store()
        .products()
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(names, vec!["Bakso", "Es Teh", "Sate"]);
}

#[test]
fn test_bootstrap_fetch_failure_leaves_previous_replica_intact() {
    let remote = support::remote();
    let mut client = support::client(&remote);
    client.bootstrap().expect("bootstrap");
    client
        .add_product(support::new_product("Es Teh", 5000))
        .unwrap();
    assert_eq!(client.store().products().len(), 1);

    remote.fail_next(FailPoint::FetchAll(Collection::Locations));
    let err = client.bootstrap().unwrap_err();
    assert!(err.to_string().contains("remote operation failed"));

    // The aborted bootstrap must not have partially replaced anything.
    assert_eq!(client.store().products().len(), 1);
    assert_eq!(client.store().products().as_slice()[0].name, "Es Teh");
}

#[test]
fn test_bootstrap_windows_sales_to_trailing_period() {
    let remote = support::remote();
    let driver_id = Uuid::new_v4();
    let recent = Sale {
        id: Uuid::new_v4(),
        driver_id,
        driver_name: "Budi".to_string(),
        product_id: Uuid::new_v4(),
        product_name: "Es Teh".to_string(),
        quantity: 1,
        total: Decimal::new(5000, 0),
        location: "Alun-Alun".to_string(),
        payment_method: armada::entity::PaymentMethod::Cash,
        timestamp: Utc::now() - Duration::days(10),
    };
    let mut ancient = recent.clone();
    ancient.id = Uuid::new_v4();
    ancient.timestamp = Utc::now() - Duration::days(800);
    remote.seed(vec![recent.clone(), ancient]);

    let mut client = support::client(&remote);
    client.bootstrap().expect("bootstrap");

    assert_eq!(client.store().sales().len(), 1);
    assert_eq!(client.store().sales().as_slice()[0].id, recent.id);
}

#[test]
fn test_bootstrap_malformed_row_surfaces_decode_failure() {
    let remote = support::remote();
    // On the bootstrap path a row the entity type cannot decode is a
    // reported failure, not a silent skip.
    remote.seed_rows(
        Collection::Products,
        vec![json!({ "id": Uuid::new_v4().to_string(), "name": 42 })],
    );

    let mut client = support::client(&remote);
    let err = client.bootstrap().unwrap_err();
    assert!(err.to_string().contains("row decode error"));
    assert!(client.store().products().is_empty());
}
