//! Change-feed client: keeps the replica current with remote mutations.
//!
//! Subscribes to the remotely-mutated collections and drains queued
//! events into a [`ReplicaStore`] on demand. Delivery is externally
//! driven; the drain never blocks on an empty channel. Events are
//! unordered across collections and at-least-once within one, so the
//! replica's idempotent apply rules do the reconciliation work.
//!
//! Subscription set: products, drivers and locations replicate all three
//! event kinds; sales are append-only, so only inserts are applied.
//! Schedule and payments are kept current by read-after-write reloads
//! and optimistic patches instead of feed traffic.

use std::sync::Arc;

use crate::entity::Collection;
use crate::remote::{ChangeFeedSource, ChangeKind, FeedSubscription, RemoteError};
use crate::replica::ReplicaStore;

/// Collections the feed client subscribes to.
const FEED_COLLECTIONS: [Collection; 4] = [
    Collection::Products,
    Collection::Drivers,
    Collection::Sales,
    Collection::Locations,
];

/// Holds one live subscription per replicated feed collection and applies
/// queued events to the replica. Unsubscribes from everything on drop.
pub struct ChangeFeedClient<R: ChangeFeedSource> {
    source: Arc<R>,
    subscriptions: Vec<FeedSubscription>,
}

impl<R: ChangeFeedSource> ChangeFeedClient<R> {
    /// Open subscriptions for every feed collection.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`RemoteError`] if any subscribe call
    /// fails; subscriptions already opened are released before returning.
    pub fn subscribe_all(source: Arc<R>) -> Result<Self, RemoteError> {
        let mut subscriptions = Vec::with_capacity(FEED_COLLECTIONS.len());
        for collection in FEED_COLLECTIONS {
            match source.subscribe(collection) {
                Ok(subscription) => subscriptions.push(subscription),
                Err(err) => {
                    for opened in &subscriptions {
                        source.unsubscribe(opened.id);
                    }
                    return Err(err);
                }
            }
        }
        log::debug!("change feed: subscribed to {} collections", subscriptions.len());
        Ok(Self {
            source,
            subscriptions,
        })
    }

    /// Apply every currently queued event to the store, in arrival order
    /// per collection. Returns the number of events applied. Never
    /// blocks.
    pub fn drain(&self, store: &mut ReplicaStore) -> usize {
        let mut applied = 0;
        for subscription in &self.subscriptions {
            while let Ok(event) = subscription.events.try_recv() {
                // Sales are append-only; late update/delete echoes for
                // them are not part of the replication contract.
                if event.collection == Collection::Sales && event.kind != ChangeKind::Insert {
                    continue;
                }
                log::debug!("change feed: {:?} on {}", event.kind, event.collection);
                store.apply_event(event);
                applied += 1;
            }
        }
        applied
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }
}

impl<R: ChangeFeedSource> Drop for ChangeFeedClient<R> {
    fn drop(&mut self) {
        for subscription in &self.subscriptions {
            self.source.unsubscribe(subscription.id);
        }
        log::debug!("change feed: unsubscribed from all collections");
    }
}
