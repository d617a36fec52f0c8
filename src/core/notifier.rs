//! # Notifier: keyed, time-bounded subscriptions with serialized delivery.
//!
//! A [`Notifier`] owns a registry of `key → (handler, expiry)` entries and
//! delivers one argument type to them through five paths:
//!
//! ```text
//! subscribe(h, key, ttl, stopped)  ──► insert / renew expiry / h(&stopped) on refusal
//! unsubscribe(&key, unsubscribed)  ──► remove ──► h(&unsubscribed)
//! purge(expired)                   ──► detach all ──► expired:   h(&expired), drop
//!                                                 └─► unexpired: restore
//! invoke(args)                     ──► [invocation lock] detach all ──► h(&args)
//!                                                 ├─ true  + running ─► reattach
//!                                                 ├─ true  + stopped ─► drop (stop wins)
//!                                                 └─ false           ─► drop
//! relay(args)                      ──► Strand::post(invoke pass)   (FIFO per notifier)
//! ```
//!
//! ## Locks
//! - **Registry lock** (upgradable reader/writer): guards the map and the running
//!   flag. Held only for map touches, never while a handler runs.
//! - **Invocation lock** (mutex): held for a whole `invoke`/`relay` pass, so the
//!   handler bodies of two passes never overlap.
//! - **Purge lock** (mutex): held for a whole `purge`. `shutdown` takes it
//!   before its final pass, so a purge that detached entries has put the
//!   unexpired ones back before the drain runs.
//!
//! `purge` does not take the invocation lock; it may interleave with an
//! invocation pass. Both detach before touching entries, so neither sees a
//! half-updated map. Detached entries keep their capacity slot until the pass
//! settles them.
//!
//! ## Reentrancy
//! A handler must not call [`Notifier::invoke`], [`Notifier::purge`] or
//! [`Notifier::shutdown`] on the notifier delivering to it, nor block on
//! anything that does: the pass already holds one of the locks above and the
//! call deadlocks. `subscribe`, `unsubscribe`, `relay`, `start` and `stop` are
//! safe from inside a handler.
//!
//! ## Event keys
//! Events carry a rendered key only when the notifier was built with
//! [`NotifierBuilder::with_key_label`] or [`NotifierBuilder::with_debug_keys`].
//!
//! ## Teardown
//! Dropping a notifier that still holds subscriptions panics. Drain it first:
//! [`Notifier::shutdown`] stops the notifier and runs one last pass in which every
//! handler is called and dropped.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::dispatch::Strand;
use crate::error::DispatchError;
use crate::events::{Bus, Event, EventKind};
use crate::handlers::Handler;

use super::{
    builder::NotifierBuilder,
    clock::Clock,
    config::Config,
    registry::{Admission, Reattach, Registry},
    subscription::{Subscription, expiry_after},
    sweeper,
};

/// Thread-safe subscription registry with synchronous and relayed delivery.
///
/// `K` identifies a subscription; `A` is the argument value every handler
/// receives, whatever the delivery path.
pub struct Notifier<K, A> {
    name: Arc<str>,
    registry: Registry<K, A>,
    invocation: Mutex<()>,
    purging: Mutex<()>,
    clock: Arc<dyn Clock>,
    bus: Bus,
    strand: Option<Strand>,
    sweep_period: Option<Duration>,
    key_label: Option<KeyLabel<K>>,
}

/// Renders a key for the `key` field of published events.
pub type KeyLabel<K> = fn(&K) -> String;

impl<K, A> Notifier<K, A>
where
    K: Eq + Hash + Send + Sync + 'static,
    A: Send + 'static,
{
    /// Returns a builder for a notifier with the given configuration.
    pub fn builder(cfg: Config) -> NotifierBuilder<K, A> {
        NotifierBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        clock: Arc<dyn Clock>,
        bus: Bus,
        strand: Option<Strand>,
        key_label: Option<KeyLabel<K>>,
    ) -> Self {
        Self {
            registry: Registry::new(cfg.capacity_limit()),
            sweep_period: cfg.sweep_period(),
            name: Arc::from(cfg.name),
            invocation: Mutex::new(()),
            purging: Mutex::new(()),
            clock,
            bus,
            strand,
            key_label,
        }
    }

    /// Starts accepting subscriptions. No-op if already running.
    pub fn start(&self) {
        if self.registry.start() {
            self.bus.publish_with(|| self.event(EventKind::Started, None));
        }
    }

    /// Stops accepting subscriptions. No-op if already stopped.
    ///
    /// Live entries stay registered; handlers that ask to stay during a later
    /// pass are dropped instead of reattached.
    pub fn stop(&self) {
        if self.registry.stop() {
            self.bus.publish_with(|| self.event(EventKind::Stopped, None));
        }
    }

    /// Returns true while subscriptions are accepted.
    pub fn is_running(&self) -> bool {
        self.registry.is_running()
    }

    /// Registers `handler` under `key` until `now + duration`.
    ///
    /// - Stopped, or bounded and full: `handler` is called right away with
    ///   `stopped` on this thread and nothing is registered.
    /// - `key` already registered: only its expiry moves; `handler` is dropped.
    /// - Otherwise the entry is inserted.
    pub fn subscribe<H>(&self, handler: H, key: K, duration: Duration, stopped: A)
    where
        H: Handler<A>,
    {
        let label = self.label(&key);
        let expiry = expiry_after(self.clock.now(), duration);
        let offered = Subscription::new(Box::new(handler), expiry);

        match self.registry.admit(key, offered) {
            Admission::Inserted => self
                .bus
                .publish_with(|| self.event(EventKind::Subscribed, label).with_ttl(duration)),
            Admission::Renewed(_unused) => self
                .bus
                .publish_with(|| self.event(EventKind::Renewed, label).with_ttl(duration)),
            Admission::Rejected(mut refused, why) => {
                refused.notify(&stopped);
                self.bus.publish_with(|| {
                    self.event(EventKind::Rejected, label)
                        .with_reason(why.as_reason())
                });
            }
        }
    }

    /// Removes `key` and calls its handler with `unsubscribed`.
    ///
    /// No-op while stopped or when `key` is not registered. The handler runs
    /// after the registry lock is released.
    pub fn unsubscribe(&self, key: &K, unsubscribed: A) {
        let Some(mut removed) = self.registry.remove(key) else {
            return;
        };
        removed.notify(&unsubscribed);
        self.bus
            .publish_with(|| self.event(EventKind::Unsubscribed, self.label(key)));
    }

    /// Evicts every entry whose expiry has passed, calling its handler with `expired`.
    ///
    /// The time is sampled once. Unexpired entries are put back one at a time;
    /// entries subscribed by other threads during the pass are left alone.
    pub fn purge(&self, expired: A) {
        let _sweep = self.purging.lock();
        let now = self.clock.now();

        let mut pass = self.registry.detach();
        while let Some((key, mut sub)) = pass.next() {
            let label = self.label(&key);
            if sub.is_expired(now) {
                pass.release();
                sub.notify(&expired);
                self.bus.publish_with(|| self.event(EventKind::Expired, label));
                continue;
            }
            if let Reattach::Superseded(_stale) = pass.restore(key, sub) {
                self.bus
                    .publish_with(|| self.event(EventKind::Superseded, label));
            }
        }
    }

    /// Delivers `args` to every subscriber on the calling thread.
    ///
    /// Handlers returning `true` are reattached if the notifier is still running
    /// when they return; the rest are dropped.
    ///
    /// ### Precondition
    /// Must not be called from a handler of this notifier (see module docs).
    pub fn invoke(&self, args: A) {
        self.deliver(&args);
    }

    /// Queues an invocation pass with `args` on this notifier's strand.
    ///
    /// Passes relayed by any number of threads run in the order they were
    /// queued. The queued job holds an `Arc` of the notifier, keeping it alive
    /// until the pass has run.
    pub fn relay(self: &Arc<Self>, args: A) -> Result<(), DispatchError> {
        let strand = self.strand.as_ref().ok_or(DispatchError::NotConfigured)?;
        let this = Arc::clone(self);
        strand.post(move || this.deliver(&args))?;
        self.bus.publish_with(|| self.event(EventKind::Relayed, None));
        Ok(())
    }

    /// Stops the notifier, then delivers `args` to every subscriber and drops them all.
    ///
    /// Waits for an in-flight [`purge`](Self::purge) to finish first, so the
    /// notifier is empty on return unless another thread purges afterwards.
    /// Same precondition as [`invoke`](Self::invoke).
    pub fn shutdown(&self, args: A) {
        self.stop();
        // A running purge restores unexpired entries regardless of the flag.
        let _sweep = self.purging.lock();
        self.deliver(&args);
    }

    /// Starts a background task that purges with `expired` every
    /// [`Config::sweep_interval`].
    ///
    /// Returns `None` when the interval is zero. The task holds only a weak
    /// reference and exits when `token` is cancelled or the notifier is gone.
    /// Must be called from within a tokio runtime.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        expired: A,
        token: CancellationToken,
    ) -> Option<JoinHandle<()>>
    where
        A: Clone,
    {
        let period = self.sweep_period?;
        Some(sweeper::spawn(Arc::downgrade(self), period, expired, token))
    }

    /// Returns true if `key` is currently registered.
    ///
    /// Entries detached by an in-flight pass are not visible.
    pub fn contains(&self, key: &K) -> bool {
        self.registry.contains(key)
    }

    /// Number of registered subscriptions.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notifier name used as event `source`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bus this notifier publishes to.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// One invocation pass: detach, notify, reattach survivors.
    fn deliver(&self, args: &A) {
        let _pass = self.invocation.lock();

        let mut pass = self.registry.detach();
        while let Some((key, mut sub)) = pass.next() {
            let label = self.label(&key);
            if !sub.notify(args) {
                pass.release();
                self.bus.publish_with(|| self.event(EventKind::Dropped, label));
                continue;
            }
            match pass.reattach(key, sub) {
                Reattach::Restored => {}
                Reattach::Discarded(_) => self
                    .bus
                    .publish_with(|| self.event(EventKind::Discarded, label)),
                Reattach::Superseded(_) => self
                    .bus
                    .publish_with(|| self.event(EventKind::Superseded, label)),
            }
        }
    }

    /// Renders `key` for events, only when a renderer is set and the bus is observed.
    fn label(&self, key: &K) -> Option<Arc<str>> {
        let render = self.key_label?;
        self.bus.is_observed().then(|| Arc::from(render(key)))
    }

    fn event(&self, kind: EventKind, key: Option<Arc<str>>) -> Event {
        let ev = Event::new(kind).with_source(Arc::clone(&self.name));
        match key {
            Some(key) => ev.with_key(key),
            None => ev,
        }
    }
}

impl<K, A> Drop for Notifier<K, A> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            return;
        }
        let live = self.registry.len_mut();
        assert!(
            live == 0,
            "notifier `{}` dropped with {live} live subscription(s); call `shutdown` before dropping",
            self.name
        );
    }
}
