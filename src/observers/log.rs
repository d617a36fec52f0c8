//! # LogWriter: bus → `tracing` bridge
//!
//! Listens on a [`Bus`] and turns every [`Event`] into a `tracing` record.
//! Routine registry traffic is logged at `debug`; job panics and receiver lag
//! at `warn`. Install any `tracing` subscriber to see the output.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! DEBUG notifier: subscription event kind="subscribed" source="blocks" key="0x00ab" ttl_ms=30000
//! DEBUG notifier: subscription rejected source="peers" key="10.0.0.1:8333" reason="capacity"
//! DEBUG notifier: lifecycle kind="stopped" source="blocks"
//! WARN  notifier: dispatcher job panicked reason="index out of bounds"
//! ```

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::events::{Bus, Event, EventKind};

/// Event writer.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Spawns a listener on the current tokio runtime that logs every event
    /// published on `bus` until `token` is cancelled or the bus closes.
    pub fn spawn(self, bus: &Bus, token: CancellationToken) -> JoinHandle<()> {
        let mut rx = bus.subscribe();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    msg = rx.recv() => match msg {
                        Ok(ev) => self.write(&ev),
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(target: "notifier", skipped, "log writer lagged; events dropped");
                        }
                    }
                }
            }
        })
    }

    /// Writes a single event.
    pub fn write(&self, e: &Event) {
        let source = e.source.as_deref().unwrap_or("-");
        let key = e.key.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::Started | EventKind::Stopped => {
                debug!(target: "notifier", kind = e.kind.as_label(), source, "lifecycle");
            }
            EventKind::Rejected => {
                debug!(
                    target: "notifier",
                    source,
                    key,
                    reason = e.reason.as_deref().unwrap_or("unknown"),
                    "subscription rejected"
                );
            }
            EventKind::Subscribed | EventKind::Renewed => {
                debug!(
                    target: "notifier",
                    kind = e.kind.as_label(),
                    source,
                    key,
                    ttl_ms = e.ttl_ms,
                    "subscription event"
                );
            }
            EventKind::Unsubscribed
            | EventKind::Expired
            | EventKind::Dropped
            | EventKind::Discarded
            | EventKind::Superseded => {
                debug!(target: "notifier", kind = e.kind.as_label(), source, key, "subscription event");
            }
            EventKind::Relayed => {
                debug!(target: "notifier", source, seq = e.seq, "pass relayed");
            }
            EventKind::JobPanicked => {
                warn!(
                    target: "notifier",
                    reason = e.reason.as_deref().unwrap_or("unknown"),
                    "dispatcher job panicked"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn listener_stops_on_cancel() {
        let bus = Bus::new(4);
        let token = CancellationToken::new();
        let handle = LogWriter::new().spawn(&bus, token.clone());

        bus.publish(Event::new(EventKind::Started).with_source("test"));
        bus.publish(Event::job_panicked("boom".to_string()));
        token.cancel();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("exited in time")
            .expect("no panic");
    }

    #[test]
    fn write_handles_sparse_events() {
        let w = LogWriter::new();
        for kind in [EventKind::Subscribed, EventKind::Rejected, EventKind::Relayed] {
            w.write(&Event::new(kind));
        }
    }
}
