//! # Runtime events emitted by notifiers and dispatchers.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Lifecycle events**: the running/stopped flag of a notifier
//! - **Registry events**: subscriptions added, renewed, rejected or removed
//! - **Delivery events**: relayed passes and panicking dispatcher jobs
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! notifier name, the subscription key and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use notifier::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::Rejected)
//!     .with_source("peers")
//!     .with_key("\"10.0.0.1:8333\"")
//!     .with_reason("capacity")
//!     .with_ttl(Duration::from_secs(30));
//!
//! assert_eq!(ev.kind, EventKind::Rejected);
//! assert_eq!(ev.source.as_deref(), Some("peers"));
//! assert_eq!(ev.reason.as_deref(), Some("capacity"));
//! assert_eq!(ev.ttl_ms, Some(30_000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Lifecycle events ===
    /// Notifier transitioned from stopped to running.
    ///
    /// Sets:
    /// - `source`: notifier name
    Started,

    /// Notifier transitioned from running to stopped.
    ///
    /// Sets:
    /// - `source`: notifier name
    Stopped,

    // === Registry events ===
    /// New subscription inserted.
    ///
    /// Sets:
    /// - `source`, `key`
    /// - `ttl_ms`: requested duration (ms)
    Subscribed,

    /// Existing key subscribed again; only its expiry was refreshed.
    ///
    /// Sets:
    /// - `source`, `key`
    /// - `ttl_ms`: requested duration (ms)
    Renewed,

    /// Subscription refused; the handler was called with the stopped arguments.
    ///
    /// Sets:
    /// - `source`, `key`
    /// - `reason`: `"stopped"` or `"capacity"`
    Rejected,

    /// Subscription removed by `unsubscribe`.
    ///
    /// Sets:
    /// - `source`, `key`
    Unsubscribed,

    /// Subscription evicted by a purge pass after its expiry passed.
    ///
    /// Sets:
    /// - `source`, `key`
    Expired,

    /// Handler returned `false` during an invocation pass.
    ///
    /// Sets:
    /// - `source`, `key`
    Dropped,

    /// Handler asked to stay subscribed but the notifier was stopped mid-pass.
    ///
    /// Sets:
    /// - `source`, `key`
    Discarded,

    /// Detached entry could not be reattached because the key was subscribed
    /// again while the pass was running; the live entry was kept.
    ///
    /// Sets:
    /// - `source`, `key`
    Superseded,

    // === Delivery events ===
    /// Invocation pass queued on the notifier strand.
    ///
    /// Sets:
    /// - `source`: notifier name
    Relayed,

    /// Dispatcher job panicked; the strand worker kept running.
    ///
    /// Sets:
    /// - `reason`: panic message
    JobPanicked,
}

impl EventKind {
    /// Returns a short stable label (kebab-case) for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::Started => "started",
            EventKind::Stopped => "stopped",
            EventKind::Subscribed => "subscribed",
            EventKind::Renewed => "renewed",
            EventKind::Rejected => "rejected",
            EventKind::Unsubscribed => "unsubscribed",
            EventKind::Expired => "expired",
            EventKind::Dropped => "dropped",
            EventKind::Discarded => "discarded",
            EventKind::Superseded => "superseded",
            EventKind::Relayed => "relayed",
            EventKind::JobPanicked => "job-panicked",
        }
    }
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the notifier that produced the event.
    pub source: Option<Arc<str>>,
    /// Rendered subscription key, when the notifier has a key renderer.
    pub key: Option<Arc<str>>,
    /// Human-readable reason (rejection cause, panic info, etc.).
    pub reason: Option<Arc<str>>,
    /// Requested subscription duration in milliseconds (compact).
    pub ttl_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            source: None,
            key: None,
            reason: None,
            ttl_ms: None,
        }
    }

    /// Attaches the producing notifier name.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches a rendered subscription key.
    #[inline]
    pub fn with_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a subscription duration (stored as milliseconds).
    #[inline]
    pub fn with_ttl(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.ttl_ms = Some(ms);
        self
    }

    /// Creates a job panic event.
    #[inline]
    pub fn job_panicked(info: String) -> Self {
        Event::new(EventKind::JobPanicked).with_reason(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::new(EventKind::Started);
        let b = Event::new(EventKind::Stopped);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn ttl_saturates_at_u32() {
        let ev = Event::new(EventKind::Subscribed).with_ttl(Duration::MAX);
        assert_eq!(ev.ttl_ms, Some(u32::MAX));
    }

    #[test]
    fn job_panicked_carries_reason() {
        let ev = Event::job_panicked("boom".to_string());
        assert_eq!(ev.kind, EventKind::JobPanicked);
        assert_eq!(ev.reason.as_deref(), Some("boom"));
        assert!(ev.source.is_none());
    }
}
