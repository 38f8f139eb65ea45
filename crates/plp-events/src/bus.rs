use std::sync::RwLock;

use tokio::sync::broadcast;
use tracing::debug;

use plp_types::{AccountId, Timestamp};

use crate::clock::MonotonicClock;
use crate::event::{EventKind, EventPayload, PoolEvent};

/// Filter for subscribing to a subset of pool events.
#[derive(Clone, Debug, Default)]
pub struct EventFilter {
    /// If set, only events of these kinds are delivered.
    pub kinds: Option<Vec<EventKind>>,
    /// If set, only events naming one of these accounts are delivered.
    pub accounts: Option<Vec<AccountId>>,
    /// If set, only events with timestamps after this point are delivered.
    pub since: Option<Timestamp>,
}

impl EventFilter {
    /// Returns `true` if the given event matches this filter.
    pub fn matches(&self, event: &PoolEvent) -> bool {
        if let Some(ref kinds) = self.kinds {
            if !kinds.contains(&event.kind()) {
                return false;
            }
        }
        if let Some(ref accounts) = self.accounts {
            match event.payload.account() {
                Some(account) if accounts.contains(account) => {}
                _ => return false,
            }
        }
        if let Some(ref since) = self.since {
            if !event.timestamp.is_after(since) {
                return false;
            }
        }
        true
    }
}

/// A broadcast channel receiver for pool events.
pub type EventStream = broadcast::Receiver<PoolEvent>;

/// Internal subscriber: a filter paired with a broadcast sender.
struct Subscriber {
    filter: EventFilter,
    sender: broadcast::Sender<PoolEvent>,
}

/// Fan-out router that delivers events to matching subscribers.
struct EventRouter {
    subscribers: RwLock<Vec<Subscriber>>,
}

impl EventRouter {
    fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Register a new subscriber with the given filter.
    /// Returns a broadcast receiver for the matching events.
    fn subscribe(&self, filter: EventFilter, capacity: usize) -> EventStream {
        let (tx, rx) = broadcast::channel(capacity);
        let sub = Subscriber { filter, sender: tx };
        self.subscribers
            .write()
            .expect("router lock poisoned")
            .push(sub);
        rx
    }

    /// Route an event to all matching subscribers.
    /// Subscribers whose channels are closed are pruned.
    fn route(&self, event: &PoolEvent) {
        let mut subs = self.subscribers.write().expect("router lock poisoned");
        subs.retain(|sub| {
            if sub.filter.matches(event) {
                // If send fails (no receivers), the subscriber is stale.
                sub.sender.send(event.clone()).is_ok()
            } else {
                // Keep non-matching subscribers; they may match future events.
                // Only prune if the channel itself is closed.
                sub.sender.receiver_count() > 0
            }
        });
    }

    /// Number of active subscribers.
    fn subscriber_count(&self) -> usize {
        self.subscribers.read().expect("router lock poisoned").len()
    }
}

/// Configuration for the [`EventBus`].
#[derive(Clone, Debug)]
pub struct BusConfig {
    /// Capacity of per-subscriber broadcast channels.
    pub channel_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

/// Central notification bus for the pool.
///
/// Combines a [`MonotonicClock`] for strictly increasing event stamps, an
/// in-memory journal for audit and replay, and an [`EventRouter`] for
/// fan-out delivery to subscribers. Durable persistence of pool state is
/// the execution environment's responsibility; the journal keeps only the
/// in-process history.
pub struct EventBus {
    clock: MonotonicClock,
    journal: RwLock<Vec<PoolEvent>>,
    router: EventRouter,
    config: BusConfig,
}

impl EventBus {
    /// Create a new bus with the given configuration.
    pub fn new(config: BusConfig) -> Self {
        Self {
            clock: MonotonicClock::new(),
            journal: RwLock::new(Vec::new()),
            router: EventRouter::new(),
            config,
        }
    }

    /// Emit a single event through the bus.
    ///
    /// The event is stamped with the next clock tick, appended to the
    /// journal, and routed to matching subscribers.
    pub fn emit(&self, payload: EventPayload) -> PoolEvent {
        // Stamp and journal under one lock so history stays time-ordered.
        let event = {
            let mut journal = self.journal.write().expect("journal lock poisoned");
            let event = PoolEvent::new(self.clock.now(), payload);
            journal.push(event.clone());
            event
        };

        self.router.route(&event);

        debug!(id = %event.id, kind = %event.kind(), "event emitted");
        event
    }

    /// Subscribe to events matching the given filter.
    pub fn subscribe(&self, filter: EventFilter) -> EventStream {
        self.router.subscribe(filter, self.config.channel_capacity)
    }

    /// Snapshot of every event emitted so far, in emission order.
    pub fn history(&self) -> Vec<PoolEvent> {
        self.journal.read().expect("journal lock poisoned").clone()
    }

    /// Number of events emitted so far.
    pub fn event_count(&self) -> usize {
        self.journal.read().expect("journal lock poisoned").len()
    }

    /// Current number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.router.subscriber_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}
