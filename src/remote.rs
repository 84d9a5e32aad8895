//! Boundary contracts to the authoritative remote store.
//!
//! Everything beyond these traits is an opaque collaborator: the remote
//! data store, the identity provider and the change-feed transport. Rows
//! cross the boundary as JSON values in the remote schema; typed
//! encoding/decoding happens on the client side of the line.
//!
//! No boundary call retries, and none is cancellable: a failure surfaces
//! synchronously as [`RemoteError`] and the caller decides whether to
//! re-issue.

use chrono::{DateTime, NaiveDate, Utc};
use crossbeam_channel::Receiver;
use serde_json::Value as JsonValue;
use std::fmt;
use uuid::Uuid;

use crate::entity::Collection;

/// Boundary failure. Always propagated to the caller unchanged.
#[derive(Debug)]
pub enum RemoteError {
    /// Transport-level failure; the call may not have reached the store.
    Unavailable(String),
    /// The store refused the operation (constraint violation, bad row, …).
    Rejected(String),
    /// The store was expected to return a row and did not.
    MissingRow(String),
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::Unavailable(s) => write!(f, "remote unavailable: {}", s),
            RemoteError::Rejected(s) => write!(f, "remote rejected operation: {}", s),
            RemoteError::MissingRow(s) => write!(f, "remote returned no row: {}", s),
        }
    }
}

impl std::error::Error for RemoteError {}

/// Kind of a remote mutation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// One remote mutation notification.
///
/// Delete events may carry a partial row (often just the identifier);
/// insert and update events carry the full canonical row.
#[derive(Debug, Clone)]
pub struct FeedEvent {
    pub kind: ChangeKind,
    pub collection: Collection,
    pub row: JsonValue,
}

/// Handle for one live change-feed subscription.
pub type SubscriptionId = u64;

/// A per-collection change-feed delivery channel.
///
/// Events are pushed by the feed source; the receiver is drained, never
/// blocked on. The subscription must be released with
/// [`ChangeFeedSource::unsubscribe`] on teardown.
pub struct FeedSubscription {
    pub id: SubscriptionId,
    pub collection: Collection,
    pub events: Receiver<FeedEvent>,
}

/// Read/write access to the authoritative store.
///
/// All calls block the current coroutine until the store answers. Bulk
/// reads return collections in their canonical order (per
/// [`Collection::order`]). No multi-row call is atomic.
pub trait RemoteStore {
    /// Fetch a full collection in its canonical order.
    fn fetch_all(&self, collection: Collection) -> Result<Vec<JsonValue>, RemoteError>;

    /// Fetch sales with `timestamp >= cutoff`, newest first. The
    /// bootstrap uses this instead of [`RemoteStore::fetch_all`] so old
    /// history stays remote.
    fn fetch_sales_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<JsonValue>, RemoteError>;

    /// Insert one row; returns the canonical stored row.
    fn insert(&self, collection: Collection, row: JsonValue) -> Result<JsonValue, RemoteError>;

    /// Insert a batch of rows. Not atomic: a failure may leave a prefix
    /// of the batch stored.
    fn insert_many(&self, collection: Collection, rows: Vec<JsonValue>) -> Result<(), RemoteError>;

    /// Patch the row with the given identifier; returns the canonical
    /// stored row after the update.
    fn update(
        &self,
        collection: Collection,
        id: Uuid,
        patch: JsonValue,
    ) -> Result<JsonValue, RemoteError>;

    /// Delete the row with the given identifier.
    fn delete(&self, collection: Collection, id: Uuid) -> Result<(), RemoteError>;

    /// Patch the unique schedule row matching (driver, date). Returns the
    /// canonical updated row, or `None` when no such row exists.
    fn update_schedule_for_day(
        &self,
        driver_id: Uuid,
        date: NaiveDate,
        patch: JsonValue,
    ) -> Result<Option<JsonValue>, RemoteError>;

    /// Delete every schedule row belonging to the given drivers.
    fn delete_schedule_for_drivers(&self, driver_ids: &[Uuid]) -> Result<(), RemoteError>;

    /// Delete every schedule row.
    fn clear_schedule(&self) -> Result<(), RemoteError>;

    /// Fetch the settings singleton, or `None` when no row exists yet.
    fn fetch_settings(&self) -> Result<Option<JsonValue>, RemoteError>;
}

/// Identity provisioning, used once per driver creation before the
/// profile row is written.
pub trait IdentityProvider {
    /// Create an external identity and return its identifier.
    fn create_identity(
        &self,
        email: &str,
        password: &str,
        attributes: JsonValue,
    ) -> Result<Uuid, RemoteError>;
}

/// Change-feed subscription management.
pub trait ChangeFeedSource {
    /// Open a delivery channel for one collection's mutation events.
    fn subscribe(&self, collection: Collection) -> Result<FeedSubscription, RemoteError>;

    /// Release a subscription. Must be called on teardown so the source
    /// stops holding a delivery channel for this client.
    fn unsubscribe(&self, id: SubscriptionId);
}
