//! Event storage.
//!
//! This module contains:
//! - `EventStore` trait: Per-aggregate event history with optimistic concurrency
//! - `StoreError`: Failures surfaced unchanged through the aggregate handler
//! - Implementations: in-memory

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{StorageConfig, StorageType};
use crate::event::{AggregateId, Event};

pub mod memory;

pub use memory::InMemoryEventStore;

// ============================================================================
// Traits
// ============================================================================

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Save was called without events. Always a caller bug.
    #[error("Event list is empty")]
    EventListEmpty,

    /// The stored version moved since the aggregate was loaded.
    #[error("Concurrency conflict on {aggregate_id}: expected version {expected}, current is {actual}")]
    Concurrency {
        aggregate_id: AggregateId,
        expected: u64,
        actual: u64,
    },

    /// A single save spanned more than one aggregate.
    #[error("Event batch mixes aggregates: expected {expected}, found {found}")]
    MixedAggregates {
        expected: AggregateId,
        found: AggregateId,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Interface for event persistence.
///
/// Implementations:
/// - `InMemoryEventStore`: Process-local storage for tests and demos
#[async_trait]
pub trait EventStore<E: Event>: Send + Sync {
    /// Retrieve the full history of an aggregate, oldest first.
    ///
    /// An unknown identifier yields an empty history.
    async fn load(&self, id: AggregateId) -> Result<Vec<E>>;

    /// Append events after `expected_version`.
    ///
    /// Fails with [`StoreError::EventListEmpty`] for an empty batch and with
    /// [`StoreError::Concurrency`] when the stored version differs from
    /// `expected_version`. Returns the persisted events on success.
    async fn save(&self, events: Vec<E>, expected_version: u64) -> Result<Vec<E>>;
}

// ============================================================================
// Factory
// ============================================================================

/// Initialize the event store selected by configuration.
pub fn init_event_store<E: Event>(config: &StorageConfig) -> Arc<dyn EventStore<E>> {
    match config.storage_type {
        StorageType::Memory => {
            info!(storage_type = "memory", "Event store initialized");
            Arc::new(InMemoryEventStore::new())
        }
    }
}
