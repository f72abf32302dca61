//! Event bus for in-process delivery.
//!
//! This module contains:
//! - `EventBus` trait: Publishing and subscription registration
//! - `EventBusExt` trait: `subscribe`, `subscribe_of` and `add_handler` sugar
//! - `EventHandler` trait: Named handlers for one event class
//! - `Subscription`: Filter, callback and error callback of one subscriber
//! - Implementations: Local (in-process), Mock

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::config::{MessagingConfig, MessagingType};
use crate::event::{Event, EventClass, EventTag};

pub mod local;
pub mod mock;

pub use local::LocalEventBus;
pub use mock::MockEventBus;

// ============================================================================
// Traits
// ============================================================================

/// Result type for bus operations.
pub type Result<T> = std::result::Result<T, BusError>;

/// Fault raised by a subscriber.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Outcome of a subscriber callback.
pub type HandlerResult = std::result::Result<(), BoxError>;

/// Label identifying a registered handler in logs and errors.
pub type EventHandlerType = String;

/// Callback receiving the faults of one subscription.
pub type ErrorCallback = Box<dyn Fn(&BusError) + Send + Sync>;

type Callback<E> = Box<dyn Fn(&E) -> HandlerResult + Send + Sync>;

/// Errors that can occur during bus operations.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Handler '{label}' failed: {source}")]
    HandlerFailed {
        label: EventHandlerType,
        #[source]
        source: BoxError,
    },

    #[error("Handler '{label}' panicked: {message}")]
    HandlerPanicked {
        label: EventHandlerType,
        message: String,
    },

    #[error("Publish failed: {0}")]
    Publish(String),

    #[error("Subscribe not supported for this bus type")]
    SubscribeNotSupported,
}

/// A named handler for one class of events.
pub trait EventHandler<T>: Send + Sync {
    /// Label used in logs and in the errors this handler raises.
    fn handler_type(&self) -> &str;

    fn handle(&self, event: T) -> HandlerResult;
}

/// Interface for event delivery to subscribers.
///
/// Implementations:
/// - `LocalEventBus`: Synchronous in-process dispatch
/// - `MockEventBus`: Records published events for testing
#[async_trait]
pub trait EventBus<E: Event>: Send + Sync {
    /// Deliver an event to every matching subscription.
    ///
    /// Returns the event once delivery was attempted. Subscriber faults are
    /// never reported here.
    async fn publish(&self, event: E) -> Result<E>;

    /// Add a subscription. Subscriptions live as long as the bus.
    async fn register(&self, subscription: Subscription<E>) -> Result<()>;
}

/// Subscription shorthands available on every [`EventBus`].
#[async_trait]
pub trait EventBusExt<E: Event>: EventBus<E> {
    /// Receive every published event.
    async fn subscribe<F>(&self, on_event: F, on_error: Option<ErrorCallback>) -> Result<()>
    where
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static;

    /// Receive events of kind or category `T`, narrowed to `T`.
    async fn subscribe_of<T, F>(&self, on_event: F, on_error: Option<ErrorCallback>) -> Result<()>
    where
        T: EventClass<E>,
        F: Fn(T) -> HandlerResult + Send + Sync + 'static;

    /// Register a named handler for events of kind or category `T`.
    async fn add_handler<T, H>(&self, handler: H, on_error: Option<ErrorCallback>) -> Result<()>
    where
        T: EventClass<E>,
        H: EventHandler<T> + 'static;
}

#[async_trait]
impl<E: Event, B: EventBus<E> + ?Sized> EventBusExt<E> for B {
    async fn subscribe<F>(&self, on_event: F, on_error: Option<ErrorCallback>) -> Result<()>
    where
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        let subscription = Subscription::all(on_event).with_error_callback(on_error);
        self.register(subscription).await
    }

    async fn subscribe_of<T, F>(&self, on_event: F, on_error: Option<ErrorCallback>) -> Result<()>
    where
        T: EventClass<E>,
        F: Fn(T) -> HandlerResult + Send + Sync + 'static,
    {
        let subscription = Subscription::of::<T, F>(on_event).with_error_callback(on_error);
        self.register(subscription).await
    }

    async fn add_handler<T, H>(&self, handler: H, on_error: Option<ErrorCallback>) -> Result<()>
    where
        T: EventClass<E>,
        H: EventHandler<T> + 'static,
    {
        let subscription = Subscription::handler::<T, H>(handler).with_error_callback(on_error);
        self.register(subscription).await
    }
}

// ============================================================================
// Subscription
// ============================================================================

/// One registered subscriber: an optional tag filter, a callback, an optional
/// error callback and a label.
pub struct Subscription<E> {
    filter: Option<EventTag>,
    label: EventHandlerType,
    callback: Callback<E>,
    on_error: Option<ErrorCallback>,
}

impl<E: Event> Subscription<E> {
    /// Accepts every event.
    pub fn all<F>(on_event: F) -> Self
    where
        F: Fn(&E) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            filter: None,
            label: "subscriber:*".to_string(),
            callback: Box::new(on_event),
            on_error: None,
        }
    }

    /// Accepts events of kind or category `T`.
    ///
    /// An accepted event that `T::narrow` rejects is reported as a handler
    /// fault.
    pub fn of<T, F>(on_event: F) -> Self
    where
        T: EventClass<E>,
        F: Fn(T) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            filter: Some(T::TAG),
            label: format!("subscriber:{}", T::TAG),
            callback: Box::new(move |event: &E| match T::narrow(event) {
                Some(typed) => on_event(typed),
                None if event.is_a(T::TAG) => {
                    warn!(
                        tag = T::TAG,
                        event_type = event.event_type(),
                        "Event matches tag but does not narrow"
                    );
                    Err(format!(
                        "{} is tagged {} but does not narrow to it",
                        event.event_type(),
                        T::TAG
                    )
                    .into())
                }
                None => Ok(()),
            }),
            on_error: None,
        }
    }

    /// Same filter as [`Subscription::of`], labelled with the handler's type.
    pub fn handler<T, H>(handler: H) -> Self
    where
        T: EventClass<E>,
        H: EventHandler<T> + 'static,
    {
        let label = handler.handler_type().to_string();
        Self::of::<T, _>(move |event: T| handler.handle(event)).with_label(label)
    }

    pub fn with_label(mut self, label: impl Into<EventHandlerType>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_error_callback(mut self, on_error: Option<ErrorCallback>) -> Self {
        self.on_error = on_error;
        self
    }

    pub fn filter(&self) -> Option<EventTag> {
        self.filter
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// True when the filter admits `event`.
    pub fn accepts(&self, event: &E) -> bool {
        self.filter.map_or(true, |tag| event.is_a(tag))
    }

    /// Invoke the callback, converting both `Err` returns and panics into a
    /// [`BusError`].
    pub(crate) fn deliver(&self, event: &E) -> Result<()> {
        match panic::catch_unwind(AssertUnwindSafe(|| (self.callback)(event))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(BusError::HandlerFailed {
                label: self.label.clone(),
                source,
            }),
            Err(payload) => Err(BusError::HandlerPanicked {
                label: self.label.clone(),
                message: panic_message(payload.as_ref()),
            }),
        }
    }

    /// Hand a fault to this subscription's error callback, or drop it.
    pub(crate) fn report(&self, fault: BusError) {
        let Some(on_error) = &self.on_error else {
            warn!(handler = %self.label, error = %fault, "Subscriber fault dropped");
            return;
        };
        if panic::catch_unwind(AssertUnwindSafe(|| on_error(&fault))).is_err() {
            error!(handler = %self.label, error = %fault, "Error callback panicked");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Initialize the event bus selected by configuration.
pub fn init_event_bus<E: Event>(config: &MessagingConfig) -> Arc<dyn EventBus<E>> {
    match config.messaging_type {
        MessagingType::Local => {
            info!(messaging_type = "local", "Event bus initialized");
            Arc::new(LocalEventBus::new())
        }
    }
}
