//! In-memory event store.
//!
//! Keeps one ordered stream per aggregate. The version of an aggregate is the
//! length of its stream.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{EventStore, Result, StoreError};
use crate::event::{AggregateId, Event};


/// Event store that keeps every stream in process memory.
pub struct InMemoryEventStore<E> {
    streams: RwLock<HashMap<AggregateId, Vec<E>>>,
    fail_on_load: RwLock<bool>,
    fail_on_save: RwLock<bool>,
}

impl<E: Event> InMemoryEventStore<E> {
    pub fn new() -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
            fail_on_load: RwLock::new(false),
            fail_on_save: RwLock::new(false),
        }
    }

    pub async fn set_fail_on_load(&self, fail: bool) {
        *self.fail_on_load.write().await = fail;
    }

    pub async fn set_fail_on_save(&self, fail: bool) {
        *self.fail_on_save.write().await = fail;
    }

    /// Number of events stored for `id`.
    pub async fn current_version(&self, id: AggregateId) -> u64 {
        self.streams
            .read()
            .await
            .get(&id)
            .map(|stream| stream.len() as u64)
            .unwrap_or(0)
    }

    /// Number of aggregates with a stored stream.
    pub async fn stream_count(&self) -> usize {
        self.streams.read().await.len()
    }

    /// Append events for `id` without any checks.
    pub async fn seed(&self, id: AggregateId, events: Vec<E>) {
        self.streams.write().await.entry(id).or_default().extend(events);
    }
}

impl<E: Event> Default for InMemoryEventStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Event> EventStore<E> for InMemoryEventStore<E> {
    async fn load(&self, id: AggregateId) -> Result<Vec<E>> {
        if *self.fail_on_load.read().await {
            return Err(StoreError::Storage("Mock load failure".to_string()));
        }
        let streams = self.streams.read().await;
        Ok(streams.get(&id).cloned().unwrap_or_default())
    }

    async fn save(&self, events: Vec<E>, expected_version: u64) -> Result<Vec<E>> {
        if *self.fail_on_save.read().await {
            return Err(StoreError::Storage("Mock save failure".to_string()));
        }

        let aggregate_id = match events.first() {
            Some(first) => first.aggregate_id(),
            None => return Err(StoreError::EventListEmpty),
        };
        if let Some(stray) = events.iter().find(|e| e.aggregate_id() != aggregate_id) {
            return Err(StoreError::MixedAggregates {
                expected: aggregate_id,
                found: stray.aggregate_id(),
            });
        }

        // Version check and append happen under one write lock.
        let mut streams = self.streams.write().await;
        let actual = streams
            .get(&aggregate_id)
            .map(|stream| stream.len() as u64)
            .unwrap_or(0);
        if actual != expected_version {
            return Err(StoreError::Concurrency {
                aggregate_id,
                expected: expected_version,
                actual,
            });
        }
        let stream = streams.entry(aggregate_id).or_default();
        stream.extend(events.iter().cloned());

        debug!(
            aggregate_id = %aggregate_id,
            new_version = stream.len(),
            event_count = events.len(),
            "Appended events"
        );

        Ok(events)
    }
}
