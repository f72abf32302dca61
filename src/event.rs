//! Identifier and event model.
//!
//! Events are plain values grouped into a tagged enum per application. Each
//! concrete kind reports its own tag plus the category tags it is declared
//! under, which is what the bus matches subscriptions against.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of a single aggregate instance.
///
/// Backed by a random 128-bit value. Serializes as a hyphenated string and
/// exposes its fixed 16-byte form through [`AggregateId::as_bytes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateId(Uuid);

impl AggregateId {
    /// Draw a fresh identifier from the process-wide random source.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AggregateId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for AggregateId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for AggregateId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for AggregateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Shorthand for [`AggregateId::new`].
pub fn new_aggregate_id() -> AggregateId {
    AggregateId::new()
}

/// Name of a concrete event kind or of an event category.
pub type EventTag = &'static str;

/// A domain event.
///
/// Implemented by the application's event enum. The tag table formed by
/// [`event_type`](Event::event_type) and [`categories`](Event::categories)
/// must be static: the same variant always reports the same tags.
pub trait Event: Clone + fmt::Debug + Send + Sync + 'static {
    /// Aggregate this event belongs to.
    fn aggregate_id(&self) -> AggregateId;

    /// Tag of the concrete kind (e.g. `"DepositPerformed"`).
    fn event_type(&self) -> EventTag;

    /// Category tags this kind is declared under (e.g. `&["AccountEvent"]`).
    fn categories(&self) -> &'static [EventTag] {
        &[]
    }

    /// True if the event is of kind `tag` or declared under category `tag`.
    fn is_a(&self, tag: EventTag) -> bool {
        self.event_type() == tag || self.categories().contains(&tag)
    }
}

/// A typed view over a subset of the events of `E`.
///
/// `TAG` is either a concrete kind or a category. `narrow` converts any event
/// for which [`Event::is_a`] holds for `TAG` into the typed view, and returns
/// `None` for every other event.
pub trait EventClass<E: Event>: Sized + Send + 'static {
    const TAG: EventTag;

    fn narrow(event: &E) -> Option<Self>;
}
