//! Mock event bus implementation for testing.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{BusError, EventBus, Result, Subscription};
use crate::event::Event;

/// Mock event bus for testing.
///
/// Records every published event and accepts no subscriptions.
pub struct MockEventBus<E> {
    published: RwLock<Vec<E>>,
    fail_on_publish: RwLock<bool>,
}

impl<E: Event> MockEventBus<E> {
    pub fn new() -> Self {
        Self {
            published: RwLock::new(Vec::new()),
            fail_on_publish: RwLock::new(false),
        }
    }

    pub async fn set_fail_on_publish(&self, fail: bool) {
        *self.fail_on_publish.write().await = fail;
    }

    pub async fn published_count(&self) -> usize {
        self.published.read().await.len()
    }

    pub async fn take_published(&self) -> Vec<E> {
        std::mem::take(&mut *self.published.write().await)
    }
}

impl<E: Event> Default for MockEventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Event> EventBus<E> for MockEventBus<E> {
    async fn publish(&self, event: E) -> Result<E> {
        if *self.fail_on_publish.read().await {
            return Err(BusError::Publish("Mock publish failure".to_string()));
        }
        self.published.write().await.push(event.clone());
        Ok(event)
    }

    async fn register(&self, _subscription: Subscription<E>) -> Result<()> {
        Err(BusError::SubscribeNotSupported)
    }
}
