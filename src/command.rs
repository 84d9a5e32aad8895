//! Write intents against the remote store, with optimistic local patches.
//!
//! [`FleetClient`] owns the replica and the remote handle. Every write
//! issues the remote call first and, on success, patches the replica with
//! the canonical row the store returned, so the local mirror never drifts
//! ahead of what the store accepted. On failure the error propagates
//! unchanged and the replica is left untouched. The one documented
//! exception is the schedule regeneration window (see
//! [`FleetClient::generate_schedule_from`]).

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value as JsonValue};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::entity::{
    default_settings, CartLine, Collection, CompanySettings, Driver, DriverCredentials,
    DriverType, Location, NewDriver, NewLocation, NewProduct, NewSale, Payment, PaymentMethod,
    Product, Record, Sale, ScheduleEntry, SettingsPatch,
};
use crate::feed::ChangeFeedClient;
use crate::occupancy;
use crate::remote::{ChangeFeedSource, ChangeKind, IdentityProvider, RemoteError, RemoteStore};
use crate::replica::ReplicaStore;
use crate::schedule::{plan_rotation, RotationOptions, ScheduleError};
use crate::views;

/// Command-layer failure.
#[derive(Debug)]
pub enum CommandError {
    /// A boundary call failed; propagated unchanged.
    Remote(RemoteError),
    /// A remote row did not decode into its entity type.
    Decode(String),
    /// Driver creation phase two failed after the identity was created.
    /// The orphaned identity is not rolled back; an operator must
    /// reconcile it out-of-band.
    OrphanedIdentity {
        identity_id: Uuid,
        cause: RemoteError,
    },
    /// Schedule generation had nothing valid to work with.
    Schedule(ScheduleError),
    /// The target location is already claimed for that day.
    LocationOccupied(Uuid),
    UnknownDriver(Uuid),
    UnknownLocation(Uuid),
    UnknownProduct(Uuid),
    /// The driver has no location assignment for the day of the sale.
    DriverUnassigned(Uuid),
    /// Sale quantity must be positive.
    ZeroQuantity,
    /// Settings were never loaded; nothing to patch.
    SettingsNotLoaded,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Remote(e) => write!(f, "remote operation failed: {}", e),
            CommandError::Decode(s) => write!(f, "row decode error: {}", s),
            CommandError::OrphanedIdentity { identity_id, cause } => write!(
                f,
                "driver profile creation failed, identity {} is orphaned and needs manual cleanup: {}",
                identity_id, cause
            ),
            CommandError::Schedule(e) => write!(f, "schedule generation failed: {}", e),
            CommandError::LocationOccupied(id) => {
                write!(f, "location {} is already claimed for that day", id)
            }
            CommandError::UnknownDriver(id) => write!(f, "driver {} is not in the replica", id),
            CommandError::UnknownLocation(id) => {
                write!(f, "location {} is not in the replica", id)
            }
            CommandError::UnknownProduct(id) => {
                write!(f, "product {} is not in the replica", id)
            }
            CommandError::DriverUnassigned(id) => {
                write!(f, "driver {} has no location assignment for that day", id)
            }
            CommandError::ZeroQuantity => write!(f, "sale quantity must be positive"),
            CommandError::SettingsNotLoaded => write!(f, "company settings are not loaded"),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<RemoteError> for CommandError {
    fn from(err: RemoteError) -> Self {
        CommandError::Remote(err)
    }
}

impl From<ScheduleError> for CommandError {
    fn from(err: ScheduleError) -> Self {
        CommandError::Schedule(err)
    }
}

/// Outcome of a single-day reassignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reassignment {
    /// The assignment was updated.
    Updated,
    /// A Dedicated driver had no schedule entry for the day; nothing to
    /// update. Not an error.
    NothingScheduled,
}

/// The client-side owner of the replica and all write intents.
///
/// Single-threaded by construction: mutation goes through `&mut self`,
/// and boundary calls block the current coroutine. Concurrency across
/// clients is coordinated only through the remote store and its change
/// feed.
pub struct FleetClient<R>
where
    R: RemoteStore + IdentityProvider + ChangeFeedSource,
{
    remote: Arc<R>,
    config: ClientConfig,
    store: ReplicaStore,
    feed: Option<ChangeFeedClient<R>>,
}

impl<R> FleetClient<R>
where
    R: RemoteStore + IdentityProvider + ChangeFeedSource,
{
    pub fn new(remote: Arc<R>, config: ClientConfig) -> Self {
        Self {
            remote,
            config,
            store: ReplicaStore::new(),
            feed: None,
        }
    }

    /// Read access to the replica, the single source of truth for this
    /// process.
    pub fn store(&self) -> &ReplicaStore {
        &self.store
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }

    /// Load the full working set from the remote store.
    ///
    /// Settings are read-or-created under their well-known id first, then
    /// every collection is fetched in its canonical order (sales windowed
    /// to the configured trailing period). Any fetch failure aborts the
    /// whole bootstrap and leaves the previous replica contents intact.
    ///
    /// # Errors
    ///
    /// Returns the first boundary or decode failure encountered.
    pub fn bootstrap(&mut self) -> Result<(), CommandError> {
        log::info!("bootstrap: loading settings and collections");
        let settings = match self.remote.fetch_settings()? {
            Some(row) => decode::<CompanySettings>(row)?,
            None => {
                let defaults = default_settings();
                log::info!("bootstrap: no settings row, creating defaults");
                decode(self.remote.insert(Collection::Settings, encode(&defaults)?)?)?
            }
        };

        // Stage everything before touching the replica so a failed fetch
        // leaves the previous state intact.
        let products: Vec<Product> = self.fetch_collection()?;
        let drivers: Vec<Driver> = self.fetch_collection()?;
        let cutoff = Utc::now() - Duration::days(i64::from(self.config.sales_window_days));
        let sales: Vec<Sale> = decode_rows(self.remote.fetch_sales_since(cutoff)?)?;
        let locations: Vec<Location> = self.fetch_collection()?;
        let schedule: Vec<ScheduleEntry> = self.fetch_collection()?;
        let payments: Vec<Payment> = self.fetch_collection()?;

        self.store.set_settings(settings);
        self.store.bulk_load(products);
        self.store.bulk_load(drivers);
        self.store.bulk_load(sales);
        self.store.bulk_load(locations);
        self.store.bulk_load(schedule);
        self.store.bulk_load(payments);
        log::info!(
            "bootstrap: loaded {} products, {} drivers, {} sales, {} locations, {} schedule entries, {} payments",
            self.store.products().len(),
            self.store.drivers().len(),
            self.store.sales().len(),
            self.store.locations().len(),
            self.store.schedule().len(),
            self.store.payments().len(),
        );
        Ok(())
    }

    fn fetch_collection<T>(&self) -> Result<Vec<T>, CommandError>
    where
        T: Record,
    {
        decode_rows(self.remote.fetch_all(T::COLLECTION)?)
    }

    /// Subscribe the change feed and route its events into the replica.
    pub fn attach_feed(&mut self) -> Result<(), CommandError> {
        let feed = ChangeFeedClient::subscribe_all(Arc::clone(&self.remote))?;
        self.feed = Some(feed);
        Ok(())
    }

    /// Apply every queued feed event. Returns the number applied; zero
    /// when no feed is attached.
    pub fn drain_feed(&mut self) -> usize {
        match &self.feed {
            Some(feed) => feed.drain(&mut self.store),
            None => 0,
        }
    }

    /// Drop the feed subscriptions (unsubscribing each channel).
    pub fn detach_feed(&mut self) {
        self.feed = None;
    }

    pub fn add_product(&mut self, new: NewProduct) -> Result<Product, CommandError> {
        let product = new.into_product(Uuid::new_v4());
        let canonical: Product =
            decode(self.remote.insert(Collection::Products, encode(&product)?)?)?;
        self.store.apply(ChangeKind::Insert, canonical.clone());
        Ok(canonical)
    }

    pub fn update_product(&mut self, product: Product) -> Result<Product, CommandError> {
        let patch = strip_fields(encode(&product)?, &["id"]);
        let canonical: Product =
            decode(self.remote.update(Collection::Products, product.id, patch)?)?;
        self.store.apply(ChangeKind::Update, canonical.clone());
        Ok(canonical)
    }

    pub fn delete_product(&mut self, id: Uuid) -> Result<(), CommandError> {
        self.remote.delete(Collection::Products, id)?;
        self.store.remove::<Product>(id);
        Ok(())
    }

    /// Create a driver: identity first, then the profile row referencing
    /// it.
    ///
    /// This is a two-step saga with no rollback. If the profile insert
    /// fails after the identity was created, the identity is orphaned and
    /// the error carries its id for out-of-band cleanup.
    pub fn add_driver(
        &mut self,
        new: NewDriver,
        credentials: DriverCredentials,
    ) -> Result<Driver, CommandError> {
        let attributes = json!({ "name": new.name, "role": "driver" });
        let identity_id =
            self.remote
                .create_identity(&credentials.email, &credentials.password, attributes)?;

        let driver = new.into_driver(Uuid::new_v4(), identity_id);
        let row = match self.remote.insert(Collection::Drivers, encode(&driver)?) {
            Ok(row) => row,
            Err(cause) => {
                log::error!(
                    "driver profile insert failed after identity creation; manual cleanup required for identity {}",
                    identity_id
                );
                return Err(CommandError::OrphanedIdentity { identity_id, cause });
            }
        };
        let canonical: Driver = decode(row)?;
        self.store.apply(ChangeKind::Insert, canonical.clone());
        Ok(canonical)
    }

    pub fn update_driver(&mut self, driver: Driver) -> Result<Driver, CommandError> {
        // The identifier and identity link are immutable; patch the rest.
        let patch = strip_fields(encode(&driver)?, &["id", "userId"]);
        let canonical: Driver =
            decode(self.remote.update(Collection::Drivers, driver.id, patch)?)?;
        self.store.apply(ChangeKind::Update, canonical.clone());
        Ok(canonical)
    }

    pub fn add_location(&mut self, new: NewLocation) -> Result<Location, CommandError> {
        let location = new.into_location(Uuid::new_v4());
        let canonical: Location =
            decode(self.remote.insert(Collection::Locations, encode(&location)?)?)?;
        self.store.apply(ChangeKind::Insert, canonical.clone());
        Ok(canonical)
    }

    pub fn update_location(&mut self, location: Location) -> Result<Location, CommandError> {
        let patch = strip_fields(encode(&location)?, &["id"]);
        let canonical: Location =
            decode(self.remote.update(Collection::Locations, location.id, patch)?)?;
        self.store.apply(ChangeKind::Update, canonical.clone());
        Ok(canonical)
    }

    pub fn delete_location(&mut self, id: Uuid) -> Result<(), CommandError> {
        self.remote.delete(Collection::Locations, id)?;
        self.store.remove::<Location>(id);
        Ok(())
    }

    /// Record one sale.
    ///
    /// The total is frozen here, once, from the replica's product price
    /// at call time; the driver, product and location names are
    /// snapshotted the same way. Later product edits never rewrite the
    /// recorded sale.
    pub fn record_sale(&mut self, new: NewSale) -> Result<Sale, CommandError> {
        if new.quantity == 0 {
            return Err(CommandError::ZeroQuantity);
        }
        let driver = self
            .store
            .get::<Driver>(new.driver_id)
            .cloned()
            .ok_or(CommandError::UnknownDriver(new.driver_id))?;
        let product = self
            .store
            .get::<Product>(new.product_id)
            .cloned()
            .ok_or(CommandError::UnknownProduct(new.product_id))?;
        let assignment = views::current_assignment(&self.store, &driver, self.today())
            .ok_or(CommandError::DriverUnassigned(driver.id))?;

        let sale = Sale {
            id: Uuid::new_v4(),
            driver_id: driver.id,
            driver_name: driver.name,
            product_id: product.id,
            product_name: product.name,
            quantity: new.quantity,
            total: product.price * Decimal::from(new.quantity),
            location: assignment.location_name,
            payment_method: new.payment_method,
            timestamp: Utc::now(),
        };
        let canonical: Sale = decode(self.remote.insert(Collection::Sales, encode(&sale)?)?)?;
        self.store.apply(ChangeKind::Insert, canonical.clone());
        Ok(canonical)
    }

    /// Record one sale per cart line.
    ///
    /// Lines are independent inserts; a failure stops the checkout but
    /// leaves already-recorded lines in place (sales are append-only).
    pub fn record_cart(
        &mut self,
        driver_id: Uuid,
        lines: &[CartLine],
        payment_method: PaymentMethod,
    ) -> Result<Vec<Sale>, CommandError> {
        let mut recorded = Vec::with_capacity(lines.len());
        for line in lines {
            recorded.push(self.record_sale(NewSale {
                driver_id,
                product_id: line.product_id,
                quantity: line.quantity,
                payment_method,
            })?);
        }
        Ok(recorded)
    }

    /// Regenerate the rotation schedule starting today.
    pub fn generate_schedule(&mut self, options: &RotationOptions) -> Result<usize, CommandError> {
        self.generate_schedule_from(options, self.today())
    }

    /// Regenerate the rotation schedule from an explicit start date.
    ///
    /// Commit protocol: delete all existing entries for the affected
    /// driver set, insert the new drafts, then reload the authoritative
    /// schedule into the replica (read-after-write, so server-assigned
    /// ids and defaults land locally). These are three independent
    /// boundary calls with no transaction around them: a failure after
    /// the delete leaves a partial schedule remotely. That window is
    /// accepted and not rolled back; re-running the generation repairs
    /// it.
    ///
    /// # Errors
    ///
    /// [`CommandError::Schedule`] when no eligible drivers/locations
    /// exist or the options are degenerate; any boundary failure
    /// otherwise.
    pub fn generate_schedule_from(
        &mut self,
        options: &RotationOptions,
        start_date: NaiveDate,
    ) -> Result<usize, CommandError> {
        let drafts = plan_rotation(
            self.store.drivers().as_slice(),
            self.store.locations().as_slice(),
            options,
            start_date,
        )?;

        let mut driver_ids: Vec<Uuid> = Vec::new();
        for draft in &drafts {
            if !driver_ids.contains(&draft.driver_id) {
                driver_ids.push(draft.driver_id);
            }
        }
        log::info!(
            "schedule: regenerating {} entries for {} drivers from {}",
            drafts.len(),
            driver_ids.len(),
            start_date
        );

        self.remote.delete_schedule_for_drivers(&driver_ids)?;
        let rows = drafts
            .iter()
            .map(encode)
            .collect::<Result<Vec<JsonValue>, CommandError>>()?;
        self.remote.insert_many(Collection::Schedule, rows)?;

        let schedule: Vec<ScheduleEntry> = self.fetch_collection()?;
        self.store.bulk_load(schedule);
        log::info!("schedule: reloaded {} entries", self.store.schedule().len());
        Ok(drafts.len())
    }

    /// Reassign a driver's location for today.
    pub fn reassign_driver_today(
        &mut self,
        driver_id: Uuid,
        location_id: Uuid,
    ) -> Result<Reassignment, CommandError> {
        self.reassign_driver_for_day(driver_id, location_id, self.today())
    }

    /// Reassign a driver's location for one day.
    ///
    /// Occupancy is enforced here: a target claimed by any other driver
    /// for `date` is rejected before any remote write. For a Mitra
    /// driver the standing `location` field is overwritten; for a
    /// Dedicated driver the unique (driver, date) schedule entry is
    /// updated in place, and a missing entry reports
    /// [`Reassignment::NothingScheduled`].
    pub fn reassign_driver_for_day(
        &mut self,
        driver_id: Uuid,
        location_id: Uuid,
        date: NaiveDate,
    ) -> Result<Reassignment, CommandError> {
        let driver = self
            .store
            .get::<Driver>(driver_id)
            .cloned()
            .ok_or(CommandError::UnknownDriver(driver_id))?;
        let location = self
            .store
            .get::<Location>(location_id)
            .cloned()
            .ok_or(CommandError::UnknownLocation(location_id))?;

        let occupied = occupancy::occupied_locations(&self.store, date, driver_id);
        if occupied.contains(&location.id) {
            return Err(CommandError::LocationOccupied(location.id));
        }

        match driver.driver_type {
            DriverType::Mitra => {
                let patch = json!({ "location": location.id });
                let canonical: Driver =
                    decode(self.remote.update(Collection::Drivers, driver.id, patch)?)?;
                self.store.apply(ChangeKind::Update, canonical);
                Ok(Reassignment::Updated)
            }
            DriverType::Dedicated => {
                let patch = json!({
                    "locationId": location.id,
                    "locationName": location.name,
                });
                match self.remote.update_schedule_for_day(driver.id, date, patch)? {
                    Some(row) => {
                        let canonical: ScheduleEntry = decode(row)?;
                        self.store.apply(ChangeKind::Update, canonical);
                        Ok(Reassignment::Updated)
                    }
                    None => Ok(Reassignment::NothingScheduled),
                }
            }
        }
    }

    /// Wipe the schedule remotely, then locally.
    pub fn clear_schedule(&mut self) -> Result<(), CommandError> {
        self.remote.clear_schedule()?;
        self.store.clear_schedule();
        Ok(())
    }

    pub fn add_payment(
        &mut self,
        driver_id: Uuid,
        period: &str,
        amount: Decimal,
    ) -> Result<Payment, CommandError> {
        let payment = Payment {
            id: Uuid::new_v4(),
            driver_id,
            period: period.to_string(),
            amount,
            timestamp: Utc::now(),
        };
        let canonical: Payment =
            decode(self.remote.insert(Collection::Payments, encode(&payment)?)?)?;
        self.store.apply(ChangeKind::Insert, canonical.clone());
        Ok(canonical)
    }

    /// Patch the settings singleton.
    ///
    /// # Errors
    ///
    /// [`CommandError::SettingsNotLoaded`] before a successful bootstrap.
    pub fn update_settings(
        &mut self,
        patch: SettingsPatch,
    ) -> Result<CompanySettings, CommandError> {
        let current_id = self
            .store
            .settings()
            .map(|s| s.id)
            .ok_or(CommandError::SettingsNotLoaded)?;
        let canonical: CompanySettings = decode(self.remote.update(
            Collection::Settings,
            current_id,
            encode(&patch)?,
        )?)?;
        self.store.set_settings(canonical.clone());
        Ok(canonical)
    }
}

fn encode<T: Serialize>(value: &T) -> Result<JsonValue, CommandError> {
    serde_json::to_value(value).map_err(|e| CommandError::Decode(e.to_string()))
}

fn decode<T: DeserializeOwned>(row: JsonValue) -> Result<T, CommandError> {
    serde_json::from_value(row).map_err(|e| CommandError::Decode(e.to_string()))
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<JsonValue>) -> Result<Vec<T>, CommandError> {
    rows.into_iter().map(decode).collect()
}

/// Remove boundary-managed fields from a patch row.
fn strip_fields(mut row: JsonValue, fields: &[&str]) -> JsonValue {
    if let Some(object) = row.as_object_mut() {
        for field in fields {
            object.remove(*field);
        }
    }
    row
}
