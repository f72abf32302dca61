//! Aggregates and the factories that create them.

use crate::event::{AggregateId, Event};

/// Bookkeeping shared by every aggregate variant.
///
/// Holds the identifier, the committed version and the events recorded since
/// the last save.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateBase<E> {
    id: AggregateId,
    version: u64,
    events: Vec<E>,
}

impl<E> AggregateBase<E> {
    /// Version 0, no pending events.
    pub fn new(id: AggregateId) -> Self {
        Self {
            id,
            version: 0,
            events: Vec::new(),
        }
    }
}

/// A domain entity whose state is derived from its event history.
///
/// Variants embed an [`AggregateBase`] and implement [`apply`](Aggregate::apply);
/// everything else is provided.
///
/// # Contract
///
/// `apply` must be a pure function of the current state and the event: no I/O,
/// no randomness. Replaying the same ordered events on a fresh aggregate of the
/// same variant always yields the same state.
pub trait Aggregate: Send + Sync + 'static {
    type Event: Event;

    fn base(&self) -> &AggregateBase<Self::Event>;

    fn base_mut(&mut self) -> &mut AggregateBase<Self::Event>;

    /// Mutate state according to a single event.
    fn apply(&mut self, event: &Self::Event);

    fn id(&self) -> AggregateId {
        self.base().id
    }

    /// Number of events persisted for this aggregate as far as this instance knows.
    fn version(&self) -> u64 {
        self.base().version
    }

    fn set_version(&mut self, version: u64) {
        self.base_mut().version = version;
    }

    /// Events recorded since the last save, oldest first.
    fn events(&self) -> &[Self::Event] {
        &self.base().events
    }

    /// Apply a newly produced event and queue it for the next save.
    fn record(&mut self, event: Self::Event) {
        self.apply(&event);
        self.base_mut().events.push(event);
    }

    /// Drain the pending events.
    fn take_events(&mut self) -> Vec<Self::Event> {
        std::mem::take(&mut self.base_mut().events)
    }

    /// Fold already persisted events into the state, in order.
    ///
    /// Advances `version` by the number of events folded. Pending events are
    /// left untouched.
    fn replay(&mut self, events: &[Self::Event]) {
        for event in events {
            self.apply(event);
        }
        let version = self.version() + events.len() as u64;
        self.set_version(version);
    }
}

/// Creates empty aggregates of one variant.
pub trait AggregateFactory: Send + Sync {
    type Aggregate: Aggregate;

    /// A version-0, event-free aggregate addressed by `id`.
    fn create(&self, id: AggregateId) -> Self::Aggregate;
}
