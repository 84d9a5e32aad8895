//! In-memory mirror of the remote store.
//!
//! The replica is the single source of truth for all reads by higher
//! layers. It is mutated from exactly three places: the bootstrap bulk
//! load, the command layer's optimistic write echoes, and change-feed
//! events. Remote events arrive unordered and at-least-once, so every
//! mutation here is written to be safe against stale or unknown
//! identifiers: update and delete on an absent id are no-ops, and an
//! insert for an id already present replaces instead of duplicating.

use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::entity::{
    Collection, CollectionOrder, CompanySettings, Driver, Location, Payment, Product, Record, Sale,
    ScheduleEntry,
};
use crate::remote::{ChangeKind, FeedEvent};

/// One replicated collection, kept in its collection's defined order.
#[derive(Debug, Clone)]
pub struct ReplicaCollection<T: Record> {
    items: Vec<T>,
}

impl<T: Record> Default for ReplicaCollection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Record> ReplicaCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the collection's contents wholesale, trusting the order the
    /// bootstrap fetch provided.
    pub fn bulk_load(&mut self, items: Vec<T>) {
        self.items = items;
    }

    /// Apply a typed insert or update. Delete events carry only an
    /// identifier and go through [`ReplicaCollection::remove`].
    pub fn apply(&mut self, kind: ChangeKind, item: T) {
        match kind {
            ChangeKind::Insert => self.insert(item),
            ChangeKind::Update => self.update(item),
            ChangeKind::Delete => self.remove(item.id()),
        }
    }

    /// Insert at the collection's order-preserving position.
    ///
    /// An entity with the same identifier is replaced first: an insert
    /// event racing a local optimistic echo must not duplicate the row.
    pub fn insert(&mut self, item: T) {
        self.items.retain(|existing| existing.id() != item.id());
        match T::COLLECTION.order() {
            CollectionOrder::NameAscending | CollectionOrder::DateAscending => {
                self.items.push(item);
                // Stable sort: same-key entities keep their arrival order.
                self.items
                    .sort_by(|a, b| a.order_key().cmp_ascending(&b.order_key()));
            }
            CollectionOrder::TimestampDescending => {
                self.items.insert(0, item);
            }
        }
    }

    /// Replace the entity with a matching identifier in place; order is
    /// unchanged. Unknown identifiers are a no-op, not an error.
    pub fn update(&mut self, item: T) {
        if let Some(existing) = self.items.iter_mut().find(|e| e.id() == item.id()) {
            *existing = item;
        }
    }

    /// Remove the entity with the given identifier. Idempotent.
    pub fn remove(&mut self, id: Uuid) {
        self.items.retain(|existing| existing.id() != id);
    }

    pub fn get(&self, id: Uuid) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop every entity. Used by full collection resets such as schedule
    /// clears.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<'a, T: Record> IntoIterator for &'a ReplicaCollection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Typed access to the replica collection mirroring `T`'s collection.
///
/// Lets store-generic code (`ReplicaStore::bulk_load`, `apply`, `get`)
/// dispatch on the entity type instead of taking seven near-identical
/// methods.
pub trait Mirror<T: Record> {
    fn collection(&self) -> &ReplicaCollection<T>;
    fn collection_mut(&mut self) -> &mut ReplicaCollection<T>;
}

macro_rules! impl_mirror {
    ($entity:ty, $field:ident) => {
        impl Mirror<$entity> for ReplicaStore {
            fn collection(&self) -> &ReplicaCollection<$entity> {
                &self.$field
            }

            fn collection_mut(&mut self) -> &mut ReplicaCollection<$entity> {
                &mut self.$field
            }
        }
    };
}

/// The per-process mirror of the remote store.
///
/// Owned by the client that mutates it and passed by reference to the
/// scheduler, conflict resolver and view layer. All mutation happens on
/// the owner's single logical thread; there is no interior locking.
#[derive(Debug, Clone, Default)]
pub struct ReplicaStore {
    products: ReplicaCollection<Product>,
    drivers: ReplicaCollection<Driver>,
    sales: ReplicaCollection<Sale>,
    locations: ReplicaCollection<Location>,
    schedule: ReplicaCollection<ScheduleEntry>,
    payments: ReplicaCollection<Payment>,
    settings: Option<CompanySettings>,
}

impl ReplicaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace one collection's contents wholesale.
    pub fn bulk_load<T>(&mut self, items: Vec<T>)
    where
        T: Record,
        Self: Mirror<T>,
    {
        <Self as Mirror<T>>::collection_mut(self).bulk_load(items);
    }

    /// Apply a typed mutation to the collection mirroring `T`.
    pub fn apply<T>(&mut self, kind: ChangeKind, item: T)
    where
        T: Record,
        Self: Mirror<T>,
    {
        <Self as Mirror<T>>::collection_mut(self).apply(kind, item);
    }

    /// Remove by identifier from the collection mirroring `T`. Idempotent.
    pub fn remove<T>(&mut self, id: Uuid)
    where
        T: Record,
        Self: Mirror<T>,
    {
        <Self as Mirror<T>>::collection_mut(self).remove(id);
    }

    pub fn get<T>(&self, id: Uuid) -> Option<&T>
    where
        T: Record,
        Self: Mirror<T>,
    {
        <Self as Mirror<T>>::collection(self).get(id)
    }

    /// Apply a raw change-feed event.
    ///
    /// Insert/update rows decode into the collection's entity type; a row
    /// that fails to decode is logged and dropped rather than poisoning
    /// the replica. Delete events only need the identifier, which is all
    /// some feeds deliver for removed rows.
    pub fn apply_event(&mut self, event: FeedEvent) {
        match event.collection {
            Collection::Products => self.apply_json::<Product>(event),
            Collection::Drivers => self.apply_json::<Driver>(event),
            Collection::Sales => self.apply_json::<Sale>(event),
            Collection::Locations => self.apply_json::<Location>(event),
            Collection::Schedule => self.apply_json::<ScheduleEntry>(event),
            Collection::Payments => self.apply_json::<Payment>(event),
            Collection::Settings => {
                match serde_json::from_value::<CompanySettings>(event.row.clone()) {
                    Ok(settings) => self.settings = Some(settings),
                    Err(err) => log::warn!("dropping malformed settings event: {}", err),
                }
            }
        }
    }

    fn apply_json<T>(&mut self, event: FeedEvent)
    where
        T: Record,
        Self: Mirror<T>,
    {
        if event.kind == ChangeKind::Delete {
            match row_id(&event.row) {
                Some(id) => <Self as Mirror<T>>::collection_mut(self).remove(id),
                None => log::warn!(
                    "dropping {} delete event without an id",
                    event.collection.as_str()
                ),
            }
            return;
        }
        match serde_json::from_value::<T>(event.row) {
            Ok(item) => <Self as Mirror<T>>::collection_mut(self).apply(event.kind, item),
            Err(err) => log::warn!(
                "dropping malformed {} {:?} event: {}",
                event.collection.as_str(),
                event.kind,
                err
            ),
        }
    }

    pub fn products(&self) -> &ReplicaCollection<Product> {
        &self.products
    }

    pub fn drivers(&self) -> &ReplicaCollection<Driver> {
        &self.drivers
    }

    pub fn sales(&self) -> &ReplicaCollection<Sale> {
        &self.sales
    }

    pub fn locations(&self) -> &ReplicaCollection<Location> {
        &self.locations
    }

    pub fn schedule(&self) -> &ReplicaCollection<ScheduleEntry> {
        &self.schedule
    }

    pub fn payments(&self) -> &ReplicaCollection<Payment> {
        &self.payments
    }

    pub fn settings(&self) -> Option<&CompanySettings> {
        self.settings.as_ref()
    }

    pub fn set_settings(&mut self, settings: CompanySettings) {
        self.settings = Some(settings);
    }

    /// Drop the schedule collection locally (after a remote wipe).
    pub fn clear_schedule(&mut self) {
        self.schedule.clear();
    }
}

impl_mirror!(Product, products);
impl_mirror!(Driver, drivers);
impl_mirror!(Sale, sales);
impl_mirror!(Location, locations);
impl_mirror!(ScheduleEntry, schedule);
impl_mirror!(Payment, payments);

/// Extract the `id` field of a raw row, if present and well-formed.
pub(crate) fn row_id(row: &JsonValue) -> Option<Uuid> {
    row.get("id")
        .and_then(JsonValue::as_str)
        .and_then(|raw| Uuid::parse_str(raw).ok())
}
