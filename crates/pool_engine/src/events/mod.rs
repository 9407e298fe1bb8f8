//! Event system following Game Engine Architecture Ch 16.8
//! Key principles:
//! - Registration system (only notify interested subscribers)
//! - Queuing support (immediate + deferred delivery)
//! - Subscriptions are owned handles; dropping one unsubscribes
//!
//! [`Broadcaster`] is the single-value channel (the governor's spawnable
//! flag). [`EventBus`] routes instance lifecycle events by type.

use crate::pool::InstanceHandle;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};

type Inbox<T> = Rc<RefCell<VecDeque<T>>>;

/// Publish side of a broadcast channel
pub struct Broadcaster<T> {
    subscribers: Vec<Weak<RefCell<VecDeque<T>>>>,
}

impl<T: Clone> Broadcaster<T> {
    /// Create a channel with no subscribers
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Open a new subscription; it receives values published from now on
    pub fn subscribe(&mut self) -> Subscription<T> {
        let inbox: Inbox<T> = Rc::new(RefCell::new(VecDeque::new()));
        self.subscribers.push(Rc::downgrade(&inbox));
        Subscription { inbox }
    }

    /// Deliver a value to every live subscriber, returning how many got it
    pub fn publish(&mut self, value: T) -> usize {
        self.subscribers.retain(|weak| weak.strong_count() > 0);
        for inbox in self.subscribers.iter().filter_map(Weak::upgrade) {
            inbox.borrow_mut().push_back(value.clone());
        }
        self.subscribers.len()
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

impl<T: Clone> Default for Broadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Receive side of a broadcast channel
#[derive(Debug)]
pub struct Subscription<T> {
    inbox: Inbox<T>,
}

impl<T> Subscription<T> {
    /// Take the oldest pending value
    pub fn try_recv(&self) -> Option<T> {
        self.inbox.borrow_mut().pop_front()
    }

    /// Take every pending value in publish order
    pub fn drain(&self) -> Vec<T> {
        self.inbox.borrow_mut().drain(..).collect()
    }

    /// Take the most recent value, discarding older ones
    pub fn latest(&self) -> Option<T> {
        let mut inbox = self.inbox.borrow_mut();
        let last = inbox.pop_back();
        inbox.clear();
        last
    }

    /// Number of pending values
    pub fn len(&self) -> usize {
        self.inbox.borrow().len()
    }

    /// True when nothing is pending
    pub fn is_empty(&self) -> bool {
        self.inbox.borrow().is_empty()
    }
}

/// Event type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Instance hit something it reacts to
    Collided,
    /// Instance left the visible world
    LeftView,
    /// Instance health reached zero
    Died,
}

/// Lifecycle event; the instance handle is the only payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    /// Type of event
    pub event_type: EventType,
    /// Instance the event is about
    pub handle: InstanceHandle,
    /// Timestamp when event was created (seconds)
    pub timestamp: f64,
}

impl Event {
    /// Create a new event
    pub fn new(event_type: EventType, handle: InstanceHandle, timestamp: f64) -> Self {
        Self {
            event_type,
            handle,
            timestamp,
        }
    }
}

/// Event bus with per-type registration and queuing
pub struct EventBus {
    immediate_queue: Vec<Event>,
    deferred_queue: Vec<(f64, Event)>,
    channels: HashMap<EventType, Broadcaster<Event>>,
    current_time: f64,
}

impl EventBus {
    /// Create a new empty event bus
    pub fn new() -> Self {
        Self {
            immediate_queue: Vec::new(),
            deferred_queue: Vec::new(),
            channels: HashMap::new(),
            current_time: 0.0,
        }
    }

    /// Update current time (seconds since start)
    pub fn update_time(&mut self, time: f64) {
        self.current_time = time;
    }

    /// Current time as last set
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Subscribe to one event type
    pub fn subscribe(&mut self, event_type: EventType) -> Subscription<Event> {
        self.channels.entry(event_type).or_default().subscribe()
    }

    /// Queue an event for this frame's dispatch
    pub fn send(&mut self, event: Event) {
        self.immediate_queue.push(event);
    }

    /// Queue an event stamped with the current time
    pub fn emit(&mut self, event_type: EventType, handle: InstanceHandle) {
        self.send(Event::new(event_type, handle, self.current_time));
    }

    /// Post event for deferred delivery at specified time
    pub fn post(&mut self, delivery_time: f64, event: Event) {
        self.deferred_queue.push((delivery_time, event));
    }

    /// Dispatch all pending events, returning how many were delivered
    /// Processes immediate queue first, then due deferred events in post order
    pub fn dispatch(&mut self) -> usize {
        let immediate = std::mem::take(&mut self.immediate_queue);
        let now = self.current_time;
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.deferred_queue)
            .into_iter()
            .partition(|(delivery_time, _)| *delivery_time <= now);
        self.deferred_queue = pending;

        let mut delivered = 0;
        for event in immediate.into_iter().chain(due.into_iter().map(|(_, event)| event)) {
            if let Some(channel) = self.channels.get_mut(&event.event_type) {
                delivered += channel.publish(event);
            }
        }
        delivered
    }

    /// Number of events not yet dispatched
    pub fn pending(&self) -> usize {
        self.immediate_queue.len() + self.deferred_queue.len()
    }

    /// Clear all queued events (useful for state transitions)
    pub fn clear(&mut self) {
        self.immediate_queue.clear();
        self.deferred_queue.clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
