//! Aggregate handler.
//!
//! Combines an event store, an event bus and an aggregate factory to load
//! aggregates from their history and to persist and publish new events.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::aggregate::{Aggregate, AggregateFactory};
use crate::bus::EventBus;
use crate::event::{AggregateId, Event};
use crate::storage::{EventStore, Result, StoreError};

/// Event type handled by a factory's aggregates.
pub type EventOf<F> = <<F as AggregateFactory>::Aggregate as Aggregate>::Event;

/// Loads and saves aggregates of one variant.
///
/// Holds no aggregates between calls. Store errors pass through unchanged;
/// nothing is retried.
pub struct AggregateHandler<F: AggregateFactory> {
    event_store: Arc<dyn EventStore<EventOf<F>>>,
    event_bus: Arc<dyn EventBus<EventOf<F>>>,
    factory: F,
}

impl<F: AggregateFactory> AggregateHandler<F> {
    pub fn new(
        event_store: Arc<dyn EventStore<EventOf<F>>>,
        event_bus: Arc<dyn EventBus<EventOf<F>>>,
        factory: F,
    ) -> Self {
        Self {
            event_store,
            event_bus,
            factory,
        }
    }

    /// Rebuild an aggregate from its stored history.
    ///
    /// An aggregate without history is returned fresh at version 0.
    #[tracing::instrument(name = "handler.load", skip_all, fields(aggregate_id = %id))]
    pub async fn load(&self, id: AggregateId) -> Result<F::Aggregate> {
        let events = self.event_store.load(id).await?;

        let mut aggregate = self.factory.create(id);
        aggregate.replay(&events);

        debug!(version = aggregate.version(), "Aggregate loaded");
        Ok(aggregate)
    }

    /// Persist the pending events of `aggregate`, then publish them.
    ///
    /// The aggregate's version is the expected version for the store's
    /// concurrency check. Every pending event must belong to the aggregate.
    /// On store failure nothing is published and the aggregate is left as it
    /// was, pending events included. Publish failures are logged and do not
    /// fail the save. On success the pending events are cleared and the
    /// version advanced past them.
    #[tracing::instrument(name = "handler.save", skip_all, fields(aggregate_id = %aggregate.id()))]
    pub async fn save(&self, aggregate: &mut F::Aggregate) -> Result<()> {
        let aggregate_id = aggregate.id();
        if let Some(stray) = aggregate
            .events()
            .iter()
            .find(|e| e.aggregate_id() != aggregate_id)
        {
            let found = stray.aggregate_id();
            warn!(%found, "Pending event belongs to another aggregate");
            return Err(StoreError::MixedAggregates {
                expected: aggregate_id,
                found,
            });
        }

        let expected_version = aggregate.version();
        let pending = aggregate.events().to_vec();

        let persisted = self
            .event_store
            .save(pending, expected_version)
            .await
            .inspect_err(|e| warn!(expected_version, error = %e, "Save rejected"))?;

        for event in &persisted {
            if let Err(e) = self.event_bus.publish(event.clone()).await {
                warn!(
                    event_type = event.event_type(),
                    error = %e,
                    "Publish failed after save"
                );
            }
        }

        aggregate.take_events();
        aggregate.set_version(expected_version + persisted.len() as u64);

        debug!(
            version = aggregate.version(),
            event_count = persisted.len(),
            "Aggregate saved"
        );
        Ok(())
    }
}
