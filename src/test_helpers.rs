//! In-process remote store for tests and demos.
//!
//! [`InMemoryRemote`] implements every boundary trait over mutex-held
//! JSON collections and broadcasts each mutation to live change-feed
//! subscribers, so several clients sharing one instance observe each
//! other's writes exactly the way they would through a real backend.
//! One-shot failure injection covers the failure-path tests (bootstrap
//! abort, orphaned identity, the schedule regeneration window).
//!
//! Not a production backend: canonical ordering is recomputed per fetch
//! and everything lives behind a single mutex.

use chrono::{DateTime, NaiveDate, Utc};
use crossbeam_channel::{unbounded, Sender};
use serde_json::{json, Value as JsonValue};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use crate::entity::{Collection, CollectionOrder, Record};
use crate::remote::{
    ChangeFeedSource, ChangeKind, FeedEvent, FeedSubscription, IdentityProvider, RemoteError,
    RemoteStore, SubscriptionId,
};

/// Operations a test can make fail exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    FetchAll(Collection),
    FetchSales,
    FetchSettings,
    Insert(Collection),
    InsertMany,
    Update(Collection),
    Delete(Collection),
    CreateIdentity,
    Subscribe(Collection),
}

struct Subscriber {
    id: SubscriptionId,
    collection: Collection,
    sender: Sender<FeedEvent>,
}

#[derive(Default)]
struct State {
    collections: HashMap<Collection, Vec<JsonValue>>,
    settings: Option<JsonValue>,
    identities: Vec<(Uuid, String)>,
    subscribers: Vec<Subscriber>,
    fail_next: HashSet<FailPoint>,
}

/// Shared in-process stand-in for the remote store, identity provider
/// and change-feed transport.
#[derive(Default)]
pub struct InMemoryRemote {
    state: Mutex<State>,
    next_subscription: AtomicU64,
}

impl InMemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next matching operation fail with a transport error.
    pub fn fail_next(&self, point: FailPoint) {
        self.lock().fail_next.insert(point);
    }

    /// Pre-populate a collection without broadcasting feed events.
    pub fn seed<T: Record>(&self, items: Vec<T>) {
        let mut state = self.lock();
        let rows = state.collections.entry(T::COLLECTION).or_default();
        for item in items {
            rows.push(serde_json::to_value(&item).expect("seed row serializes"));
        }
    }

    /// Pre-populate a collection with raw rows, bypassing validation and
    /// broadcast. For malformed-row tests.
    pub fn seed_rows(&self, collection: Collection, rows: Vec<JsonValue>) {
        self.lock()
            .collections
            .entry(collection)
            .or_default()
            .extend(rows);
    }

    /// Raw rows currently held for a collection, in insertion order.
    pub fn rows(&self, collection: Collection) -> Vec<JsonValue> {
        self.lock()
            .collections
            .get(&collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of live feed subscriptions for a collection.
    pub fn subscriber_count(&self, collection: Collection) -> usize {
        self.lock()
            .subscribers
            .iter()
            .filter(|s| s.collection == collection)
            .count()
    }

    /// Identities created so far, oldest first.
    pub fn identities(&self) -> Vec<Uuid> {
        self.lock().identities.iter().map(|(id, _)| *id).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("in-memory remote lock poisoned")
    }

    fn take_failure(state: &mut State, point: FailPoint) -> Result<(), RemoteError> {
        if state.fail_next.remove(&point) {
            Err(RemoteError::Unavailable(format!(
                "injected failure at {:?}",
                point
            )))
        } else {
            Ok(())
        }
    }

    fn broadcast(state: &State, kind: ChangeKind, collection: Collection, row: JsonValue) {
        for subscriber in &state.subscribers {
            if subscriber.collection == collection {
                let _ = subscriber.sender.send(FeedEvent {
                    kind,
                    collection,
                    row: row.clone(),
                });
            }
        }
    }

    fn insert_row(
        state: &mut State,
        collection: Collection,
        mut row: JsonValue,
    ) -> Result<JsonValue, RemoteError> {
        if collection == Collection::Settings {
            state.settings = Some(row.clone());
            return Ok(row);
        }
        let id = match json_id(&row) {
            Some(id) => id,
            None => {
                // Rows without an id get a store-assigned one, the way
                // the real store defaults missing identifier columns.
                let id = Uuid::new_v4();
                if let Some(object) = row.as_object_mut() {
                    object.insert("id".to_string(), json!(id.to_string()));
                }
                id
            }
        };
        let rows = state.collections.entry(collection).or_default();
        if rows.iter().any(|r| json_id(r) == Some(id)) {
            return Err(RemoteError::Rejected(format!(
                "duplicate key in {}: {}",
                collection, id
            )));
        }
        rows.push(row.clone());
        Self::broadcast(state, ChangeKind::Insert, collection, row.clone());
        Ok(row)
    }
}

impl RemoteStore for InMemoryRemote {
    fn fetch_all(&self, collection: Collection) -> Result<Vec<JsonValue>, RemoteError> {
        let mut state = self.lock();
        Self::take_failure(&mut state, FailPoint::FetchAll(collection))?;
        let mut rows = state
            .collections
            .get(&collection)
            .cloned()
            .unwrap_or_default();
        sort_canonical(&mut rows, collection.order());
        Ok(rows)
    }

    fn fetch_sales_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<JsonValue>, RemoteError> {
        let mut state = self.lock();
        Self::take_failure(&mut state, FailPoint::FetchSales)?;
        let mut rows: Vec<JsonValue> = state
            .collections
            .get(&Collection::Sales)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|row| match json_timestamp(row) {
                Some(ts) => ts >= cutoff,
                None => false,
            })
            .collect();
        sort_canonical(&mut rows, CollectionOrder::TimestampDescending);
        Ok(rows)
    }

    fn insert(&self, collection: Collection, row: JsonValue) -> Result<JsonValue, RemoteError> {
        let mut state = self.lock();
        Self::take_failure(&mut state, FailPoint::Insert(collection))?;
        Self::insert_row(&mut state, collection, row)
    }

    fn insert_many(
        &self,
        collection: Collection,
        rows: Vec<JsonValue>,
    ) -> Result<(), RemoteError> {
        let mut state = self.lock();
        Self::take_failure(&mut state, FailPoint::InsertMany)?;
        for row in rows {
            Self::insert_row(&mut state, collection, row)?;
        }
        Ok(())
    }

    fn update(
        &self,
        collection: Collection,
        id: Uuid,
        patch: JsonValue,
    ) -> Result<JsonValue, RemoteError> {
        let mut state = self.lock();
        Self::take_failure(&mut state, FailPoint::Update(collection))?;
        if collection == Collection::Settings {
            let current = state.settings.as_mut().ok_or_else(|| {
                RemoteError::MissingRow(format!("settings row {} does not exist", id))
            })?;
            merge_patch(current, &patch);
            let canonical = current.clone();
            return Ok(canonical);
        }
        let rows = state.collections.entry(collection).or_default();
        let row = rows
            .iter_mut()
            .find(|r| json_id(r) == Some(id))
            .ok_or_else(|| {
                RemoteError::MissingRow(format!("no {} row with id {}", collection, id))
            })?;
        merge_patch(row, &patch);
        let canonical = row.clone();
        Self::broadcast(&state, ChangeKind::Update, collection, canonical.clone());
        Ok(canonical)
    }

    fn delete(&self, collection: Collection, id: Uuid) -> Result<(), RemoteError> {
        let mut state = self.lock();
        Self::take_failure(&mut state, FailPoint::Delete(collection))?;
        let rows = state.collections.entry(collection).or_default();
        let before = rows.len();
        rows.retain(|r| json_id(r) != Some(id));
        if rows.len() != before {
            Self::broadcast(
                &state,
                ChangeKind::Delete,
                collection,
                json!({ "id": id.to_string() }),
            );
        }
        Ok(())
    }

    fn update_schedule_for_day(
        &self,
        driver_id: Uuid,
        date: NaiveDate,
        patch: JsonValue,
    ) -> Result<Option<JsonValue>, RemoteError> {
        let mut state = self.lock();
        Self::take_failure(&mut state, FailPoint::Update(Collection::Schedule))?;
        let rows = state.collections.entry(Collection::Schedule).or_default();
        let target = rows.iter_mut().find(|row| {
            json_uuid_field(row, "driverId") == Some(driver_id)
                && json_date_field(row, "date") == Some(date)
        });
        match target {
            Some(row) => {
                merge_patch(row, &patch);
                let canonical = row.clone();
                Self::broadcast(
                    &state,
                    ChangeKind::Update,
                    Collection::Schedule,
                    canonical.clone(),
                );
                Ok(Some(canonical))
            }
            None => Ok(None),
        }
    }

    fn delete_schedule_for_drivers(&self, driver_ids: &[Uuid]) -> Result<(), RemoteError> {
        let mut state = self.lock();
        Self::take_failure(&mut state, FailPoint::Delete(Collection::Schedule))?;
        let rows = state.collections.entry(Collection::Schedule).or_default();
        rows.retain(|row| match json_uuid_field(row, "driverId") {
            Some(id) => !driver_ids.contains(&id),
            None => true,
        });
        Ok(())
    }

    fn clear_schedule(&self) -> Result<(), RemoteError> {
        let mut state = self.lock();
        Self::take_failure(&mut state, FailPoint::Delete(Collection::Schedule))?;
        state
            .collections
            .entry(Collection::Schedule)
            .or_default()
            .clear();
        Ok(())
    }

    fn fetch_settings(&self) -> Result<Option<JsonValue>, RemoteError> {
        let mut state = self.lock();
        Self::take_failure(&mut state, FailPoint::FetchSettings)?;
        Ok(state.settings.clone())
    }
}

impl IdentityProvider for InMemoryRemote {
    fn create_identity(
        &self,
        email: &str,
        _password: &str,
        _attributes: JsonValue,
    ) -> Result<Uuid, RemoteError> {
        let mut state = self.lock();
        Self::take_failure(&mut state, FailPoint::CreateIdentity)?;
        if state.identities.iter().any(|(_, existing)| existing == email) {
            return Err(RemoteError::Rejected(format!(
                "identity email already registered: {}",
                email
            )));
        }
        let id = Uuid::new_v4();
        state.identities.push((id, email.to_string()));
        Ok(id)
    }
}

impl ChangeFeedSource for InMemoryRemote {
    fn subscribe(&self, collection: Collection) -> Result<FeedSubscription, RemoteError> {
        let mut state = self.lock();
        Self::take_failure(&mut state, FailPoint::Subscribe(collection))?;
        let id = self.next_subscription.fetch_add(1, Ordering::SeqCst);
        let (sender, events) = unbounded();
        state.subscribers.push(Subscriber {
            id,
            collection,
            sender,
        });
        Ok(FeedSubscription {
            id,
            collection,
            events,
        })
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.lock().subscribers.retain(|s| s.id != id);
    }
}

fn json_id(row: &JsonValue) -> Option<Uuid> {
    json_uuid_field(row, "id")
}

fn json_uuid_field(row: &JsonValue, field: &str) -> Option<Uuid> {
    row.get(field)
        .and_then(JsonValue::as_str)
        .and_then(|raw| Uuid::parse_str(raw).ok())
}

fn json_date_field(row: &JsonValue, field: &str) -> Option<NaiveDate> {
    row.get(field)
        .and_then(JsonValue::as_str)
        .and_then(|raw| raw.parse().ok())
}

fn json_timestamp(row: &JsonValue) -> Option<DateTime<Utc>> {
    row.get("timestamp")
        .and_then(JsonValue::as_str)
        .and_then(|raw| raw.parse().ok())
}

/// Top-level object merge: every key of `patch` overwrites the row.
fn merge_patch(row: &mut JsonValue, patch: &JsonValue) {
    if let (Some(object), Some(changes)) = (row.as_object_mut(), patch.as_object()) {
        for (key, value) in changes {
            object.insert(key.clone(), value.clone());
        }
    }
}

fn sort_canonical(rows: &mut [JsonValue], order: CollectionOrder) {
    match order {
        CollectionOrder::NameAscending => {
            rows.sort_by(|a, b| string_field(a, "name").cmp(&string_field(b, "name")));
        }
        CollectionOrder::TimestampDescending => {
            // Parsed compare: RFC 3339 strings with differing subsecond
            // precision do not order correctly lexicographically.
            rows.sort_by(|a, b| json_timestamp(b).cmp(&json_timestamp(a)));
        }
        CollectionOrder::DateAscending => {
            rows.sort_by(|a, b| string_field(a, "date").cmp(&string_field(b, "date")));
        }
    }
}

fn string_field(row: &JsonValue, field: &str) -> String {
    row.get(field)
        .and_then(JsonValue::as_str)
        .unwrap_or_default()
        .to_string()
}
