//! Cross-client replication through the change feed.

use armada::entity::Collection;
use rust_decimal::Decimal;

use super::support;

#[test]
fn test_write_observed_by_other_client_after_drain() {
    let remote = support::remote();
    let mut admin = support::connected_client(&remote);
    let mut driver_client = support::connected_client(&remote);

    let product = admin
        .add_product(support::new_product("Es Teh", 5000))
        .unwrap();

    assert!(driver_client.store().products().is_empty());
    let applied = driver_client.drain_feed();
    assert_eq!(applied, 1);
    assert_eq!(
        driver_client.store().get::<armada::entity::Product>(product.id),
        Some(&product)
    );
}

#[test]
fn test_own_echo_does_not_duplicate_optimistic_patch() {
    let remote = support::remote();
    let mut admin = support::connected_client(&remote);

    admin
        .add_product(support::new_product("Es Teh", 5000))
        .unwrap();
    assert_eq!(admin.store().products().len(), 1);

    // The admin's own insert comes back through its feed subscription;
    // applying the echo replaces the optimistic row instead of
    // duplicating it.
    let applied = admin.drain_feed();
    assert_eq!(applied, 1);
    assert_eq!(admin.store().products().len(), 1);
}

#[test]
fn test_last_write_wins_across_clients() {
    let remote = support::remote();
    let mut admin = support::connected_client(&remote);
    let mut observer = support::connected_client(&remote);

    let mut product = admin
        .add_product(support::new_product("Es Teh", 5000))
        .unwrap();
    product.price = Decimal::new(6000, 0);
    admin.update_product(product.clone()).unwrap();
    product.price = Decimal::new(7000, 0);
    admin.update_product(product.clone()).unwrap();

    // The observer applies insert + two updates in arrival order; the
    // later update wins.
    let applied = observer.drain_feed();
    assert_eq!(applied, 3);
    assert_eq!(
        observer
            .store()
            .get::<armada::entity::Product>(product.id)
            .unwrap()
            .price,
        Decimal::new(7000, 0)
    );
}

#[test]
fn test_delete_propagates_to_other_clients() {
    let remote = support::remote();
    let mut admin = support::connected_client(&remote);
    let mut observer = support::connected_client(&remote);

    let location = admin
        .add_location(support::new_rotation_location("Alun-Alun"))
        .unwrap();
    observer.drain_feed();
    assert_eq!(observer.store().locations().len(), 1);

    admin.delete_location(location.id).unwrap();
    observer.drain_feed();
    assert!(observer.store().locations().is_empty());
}

#[test]
fn test_stale_update_for_deleted_row_is_noop() {
    let remote = support::remote();
    let mut admin = support::connected_client(&remote);
    let mut observer = support::connected_client(&remote);

    let mut product = admin
        .add_product(support::new_product("Es Teh", 5000))
        .unwrap();
    product.price = Decimal::new(6000, 0);
    admin.update_product(product.clone()).unwrap();
    admin.delete_product(product.id).unwrap();

    // The observer sees insert, update, delete; whatever interleaving
    // the feed produced, the end state is empty and nothing panics.
    observer.drain_feed();
    assert!(observer.store().products().is_empty());
}

#[test]
fn test_detach_feed_releases_subscriptions() {
    let remote = support::remote();
    let mut client = support::connected_client(&remote);
    assert_eq!(remote.subscriber_count(Collection::Products), 1);

    client.detach_feed();
    assert_eq!(remote.subscriber_count(Collection::Products), 0);
    assert_eq!(remote.subscriber_count(Collection::Drivers), 0);
    assert_eq!(remote.subscriber_count(Collection::Sales), 0);
    assert_eq!(remote.subscriber_count(Collection::Locations), 0);

    // With no feed attached a drain applies nothing.
    assert_eq!(client.drain_feed(), 0);
}
