//! Komandante - event sourcing core
//!
//! Aggregates rebuilt from their event history, an event store contract with
//! optimistic concurrency, and an in-process event bus that delivers saved
//! events to subscribers filtered by kind or category.

pub mod aggregate;
pub mod bus;
pub mod config;
pub mod event;
pub mod handler;
pub mod storage;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_utils;

pub use aggregate::{Aggregate, AggregateBase, AggregateFactory};
pub use bus::{EventBus, EventBusExt, EventHandler, LocalEventBus};
pub use config::Config;
pub use event::{new_aggregate_id, AggregateId, Event, EventClass, EventTag};
pub use handler::AggregateHandler;
pub use storage::{EventStore, InMemoryEventStore, StoreError};
