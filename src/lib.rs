//! # Armada
//!
//! Coroutine-native replicated data layer and rotation scheduler for
//! field sales fleets, on the `may` runtime.
//!
//! A [`FleetClient`] mirrors an authoritative remote store into an owned
//! [`ReplicaStore`], keeps it current through change-feed reconciliation
//! and optimistic write echoes, and derives daily location assignments
//! with a deterministic rotation scheduler.
//!
//! See [README on GitHub](https://github.com/microscaler/armada) for full architecture.

pub mod command;
pub mod config;
pub mod entity;
pub mod feed;
pub mod occupancy;
pub mod remote;
pub mod replica;
pub mod schedule;
pub mod test_helpers;
pub mod views;

pub use command::{CommandError, FleetClient, Reassignment};
pub use config::ClientConfig;
pub use feed::ChangeFeedClient;
pub use remote::{ChangeFeedSource, ChangeKind, FeedEvent, IdentityProvider, RemoteError, RemoteStore};
pub use replica::ReplicaStore;
pub use schedule::{plan_rotation, RotationOptions, ScheduleError, SCHEDULED_DAYS};
