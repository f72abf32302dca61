//! In-process event bus.
//!
//! Dispatches synchronously on the publisher's task, in registration order,
//! with every subscriber isolated from the others and from the publisher.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{EventBus, Result, Subscription};
use crate::event::Event;


/// In-process event bus.
///
/// Holds an append-only list of subscriptions. A subscription whose filter is
/// a category tag receives every kind declared under that category.
pub struct LocalEventBus<E> {
    subscriptions: RwLock<Vec<Arc<Subscription<E>>>>,
}

impl<E: Event> LocalEventBus<E> {
    pub fn new() -> Self {
        Self {
            subscriptions: RwLock::new(Vec::new()),
        }
    }

    pub async fn subscription_count(&self) -> usize {
        self.subscriptions.read().await.len()
    }
}

impl<E: Event> Default for LocalEventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Event> EventBus<E> for LocalEventBus<E> {
    #[tracing::instrument(
        name = "bus.publish",
        skip_all,
        fields(event_type = event.event_type(), aggregate_id = %event.aggregate_id())
    )]
    async fn publish(&self, event: E) -> Result<E> {
        // Callbacks run without the registry lock held.
        let subscriptions: Vec<_> = self.subscriptions.read().await.clone();

        let mut delivered = 0usize;
        for subscription in subscriptions.iter().filter(|s| s.accepts(&event)) {
            delivered += 1;
            if let Err(fault) = subscription.deliver(&event) {
                subscription.report(fault);
            }
        }

        debug!(
            subscribers = subscriptions.len(),
            delivered, "Event dispatched"
        );

        Ok(event)
    }

    async fn register(&self, subscription: Subscription<E>) -> Result<()> {
        info!(
            handler = %subscription.label(),
            filter = subscription.filter().unwrap_or("*"),
            "Registered subscription"
        );
        self.subscriptions.write().await.push(Arc::new(subscription));
        Ok(())
    }
}
