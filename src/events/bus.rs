//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking event publishing from multiple sources (notifiers, strand workers).
//!
//! ## Architecture
//! ```text
//! Publishers (many):                   Receivers (any):
//!   Notifier A ──┐
//!   Notifier B ──┼──────► Bus ───────► LogWriter listener ────► tracing
//!   Strand     ──┘  (broadcast chan)   user receivers
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks and is callable from any thread,
//!   inside or outside a tokio runtime.
//! - **Bounded capacity**: a single ring buffer stores recent events for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no active receivers at send time.
//!
//! Publishers check [`Bus::is_observed`] before building an event, so an
//! unobserved bus costs one atomic load per operation.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
///
/// Thin wrapper over [`tokio::sync::broadcast`] that provides `publish`/`subscribe` API.
/// Multiple publishers can publish concurrently; receivers get clones of each event.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately (send clones internally).
/// - **Fire-and-forget**: no delivery or durability guarantees.
/// - **Cloneable**: cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity.
    ///
    /// ### Notes
    /// - Capacity is **shared** across all receivers.
    /// - The minimum capacity is 1 (clamped).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<Event>(capacity);
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no receivers, the event is dropped.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Publishes the event produced by `make` only when someone is listening.
    #[inline]
    pub fn publish_with(&self, make: impl FnOnce() -> Event) {
        if self.is_observed() {
            self.publish(make());
        }
    }

    /// Creates a new receiver that will observe subsequent events.
    ///
    /// - Each call creates an **independent** receiver.
    /// - A receiver only gets events **sent after** it subscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Returns true if at least one receiver is attached.
    #[inline]
    pub fn is_observed(&self) -> bool {
        self.tx.receiver_count() > 0
    }
}

impl Default for Bus {
    fn default() -> Self {
        Bus::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[test]
    fn unobserved_bus_skips_event_construction() {
        let bus = Bus::new(4);
        let mut built = false;
        bus.publish_with(|| {
            built = true;
            Event::new(EventKind::Started)
        });
        assert!(!built);
    }

    #[test]
    fn receiver_sees_events_published_after_subscribe() {
        let bus = Bus::new(4);
        bus.publish(Event::new(EventKind::Started));

        let mut rx = bus.subscribe();
        assert!(bus.is_observed());
        bus.publish_with(|| Event::new(EventKind::Stopped));

        let ev = rx.try_recv().expect("event");
        assert_eq!(ev.kind, EventKind::Stopped);
        assert!(rx.try_recv().is_err());
    }
}
