//! Host events and the caller-owned event bus.
//!
//! The host owns an [`EventBus`] and posts events to it serially. Components
//! register plain closures for the event kinds they care about and remove
//! them again with the returned [`SubscriptionId`].
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use specimen_tracker::events::{EventBus, EventKind, GameTick, HostEvent};
//!
//! let mut bus = EventBus::new();
//! let ticks = Rc::new(Cell::new(0));
//!
//! let counter = Rc::clone(&ticks);
//! let id = bus.subscribe(EventKind::GameTick, move |_| counter.set(counter.get() + 1));
//!
//! bus.post(&HostEvent::GameTick(GameTick));
//! assert_eq!(ticks.get(), 1);
//!
//! assert!(bus.unsubscribe(id));
//! bus.post(&HostEvent::GameTick(GameTick));
//! assert_eq!(ticks.get(), 1);
//! ```

use std::fmt;

use tracing::trace;

use crate::types::{ContainerId, ItemStack};

/// The contents of an item container changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemContainerChanged {
    /// Which container changed.
    pub container_id: ContainerId,

    /// Full current contents of the container.
    pub items: Vec<ItemStack>,
}

/// Periodic heartbeat. Carries no payload; time is read at handling time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameTick;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    ItemContainerChanged(ItemContainerChanged),
    GameTick(GameTick),
}

impl HostEvent {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            HostEvent::ItemContainerChanged(_) => EventKind::ItemContainerChanged,
            HostEvent::GameTick(_) => EventKind::GameTick,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ItemContainerChanged,
    GameTick,
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&HostEvent)>;

struct Subscriber {
    id: SubscriptionId,
    kind: EventKind,
    handler: Handler,
}

/// Serial dispatcher from host events to subscribed handlers.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for events of `kind`.
    pub fn subscribe<F>(&mut self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: FnMut(&HostEvent) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;

        self.subscribers.push(Subscriber {
            id,
            kind,
            handler: Box::new(handler),
        });

        trace!(id = id.0, kind = ?kind, "Handler subscribed");
        id
    }

    /// Removes a handler. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|subscriber| subscriber.id != id);

        let removed = self.subscribers.len() != before;
        if removed {
            trace!(id = id.0, "Handler unsubscribed");
        }
        removed
    }

    /// Delivers `event` to every handler of its kind, in subscription order.
    ///
    /// Returns the number of handlers invoked.
    pub fn post(&mut self, event: &HostEvent) -> usize {
        let kind = event.kind();
        let mut delivered = 0;

        for subscriber in self.subscribers.iter_mut().filter(|s| s.kind == kind) {
            (subscriber.handler)(event);
            delivered += 1;
        }

        delivered
    }

    #[must_use]
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers.iter().filter(|s| s.kind == kind).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("next_id", &self.next_id)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
