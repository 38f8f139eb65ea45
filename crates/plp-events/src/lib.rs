//! Notification fabric for the Peer Lending Pool (PLP).
//!
//! Every successful pool operation emits exactly one typed [`PoolEvent`];
//! failed or rolled-back operations emit nothing. This crate provides:
//! - [`PoolEvent`] records with content-addressed IDs and BLAKE3 integrity hashes
//! - [`MonotonicClock`] for strictly increasing event stamps
//! - [`EventBus`] with filtered broadcast subscriptions and an in-memory
//!   journal for audit and replay

pub mod bus;
pub mod clock;
pub mod event;

pub use bus::{BusConfig, EventBus, EventFilter, EventStream};
pub use clock::MonotonicClock;
pub use event::{EventId, EventKind, EventPayload, PoolEvent};
