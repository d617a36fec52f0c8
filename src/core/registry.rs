//! # Subscription registry and lifecycle flag.
//!
//! The registry owns the key → subscription map and the running/stopped flag
//! behind one upgradable reader/writer lock.
//!
//! ## Lock protocol
//! ```text
//! upgradable_read()                 (one upgrader, many plain readers)
//!   ├─ inspect running flag / key presence / size
//!   ├─ no-op?  → release (no exclusive contention)
//!   └─ mutate? → upgrade() → exclusive → mutate → release
//! write()                           (detach, and settling each detached entry)
//! ```
//!
//! ## Rules
//! - Every mutation happens under the exclusive lock.
//! - Handlers never run here: anything that must be called is handed back to
//!   the caller inside the returned value and runs after the guard is gone.
//! - Keys are unique; renewing a key only touches its expiry.
//! - A bounded, full registry rejects new keys and never evicts. Entries
//!   taken out by an in-flight pass still occupy their slot until settled.

use std::collections::HashMap;
use std::collections::hash_map::IntoIter;
use std::hash::Hash;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};

use super::subscription::Subscription;

/// Why a subscription was refused.
///
/// Handlers cannot tell the two apart (both receive the stopped arguments);
/// the distinction only surfaces in published events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Rejection {
    Stopped,
    Capacity,
}

impl Rejection {
    pub(crate) fn as_reason(&self) -> &'static str {
        match self {
            Rejection::Stopped => "stopped",
            Rejection::Capacity => "capacity",
        }
    }
}

/// Outcome of [`Registry::admit`].
pub(crate) enum Admission<A> {
    /// New key inserted.
    Inserted,
    /// Key already present; its expiry was refreshed and the offered record is returned unused.
    Renewed(Subscription<A>),
    /// Nothing changed; the caller must notify the returned record.
    Rejected(Subscription<A>, Rejection),
}

/// Outcome of putting a detached record back.
pub(crate) enum Reattach<A> {
    Restored,
    /// Notifier stopped while the record was detached.
    Discarded(Subscription<A>),
    /// Key was subscribed again while the record was detached; the live entry wins.
    Superseded(Subscription<A>),
}

struct State<K, A> {
    running: bool,
    subscriptions: HashMap<K, Subscription<A>>,
    /// Entries held by in-flight passes, not yet put back or released.
    detached: usize,
}

/// Key → subscription map plus lifecycle flag.
pub(crate) struct Registry<K, A> {
    state: RwLock<State<K, A>>,
    limit: Option<usize>,
}

impl<K, A> Registry<K, A>
where
    K: Eq + Hash,
    A: 'static,
{
    /// Creates a stopped, empty registry.
    pub(crate) fn new(limit: Option<usize>) -> Self {
        Self {
            state: RwLock::new(State {
                running: false,
                subscriptions: HashMap::new(),
                detached: 0,
            }),
            limit,
        }
    }

    /// Stopped → running. Returns true if a transition happened.
    pub(crate) fn start(&self) -> bool {
        self.transition(true)
    }

    /// Running → stopped. Returns true if a transition happened.
    pub(crate) fn stop(&self) -> bool {
        self.transition(false)
    }

    fn transition(&self, running: bool) -> bool {
        let state = self.state.upgradable_read();
        if state.running == running {
            return false;
        }
        let mut state = RwLockUpgradableReadGuard::upgrade(state);
        state.running = running;
        true
    }

    pub(crate) fn is_running(&self) -> bool {
        self.state.read().running
    }

    /// Inserts `sub` under `key`, renews an existing key, or rejects.
    pub(crate) fn admit(&self, key: K, sub: Subscription<A>) -> Admission<A> {
        let state = self.state.upgradable_read();
        if !state.running {
            return Admission::Rejected(sub, Rejection::Stopped);
        }

        if state.subscriptions.contains_key(&key) {
            let mut state = RwLockUpgradableReadGuard::upgrade(state);
            if let Some(live) = state.subscriptions.get_mut(&key) {
                live.renew(sub.expiry());
            }
            return Admission::Renewed(sub);
        }

        let occupied = state.subscriptions.len() + state.detached;
        if self.limit.is_some_and(|limit| occupied >= limit) {
            return Admission::Rejected(sub, Rejection::Capacity);
        }

        let mut state = RwLockUpgradableReadGuard::upgrade(state);
        state.subscriptions.insert(key, sub);
        Admission::Inserted
    }

    /// Removes `key` while running. `None` when stopped or absent.
    pub(crate) fn remove(&self, key: &K) -> Option<Subscription<A>> {
        let state = self.state.upgradable_read();
        if !state.running || !state.subscriptions.contains_key(key) {
            return None;
        }
        let mut state = RwLockUpgradableReadGuard::upgrade(state);
        state.subscriptions.remove(key)
    }

    /// Swaps the live map for an empty one and hands the old contents to a pass.
    ///
    /// Every taken entry keeps its capacity slot until the pass settles it
    /// ([`Detached::reattach`], [`Detached::restore`], [`Detached::release`])
    /// or the pass is dropped.
    pub(crate) fn detach(&self) -> Detached<'_, K, A> {
        let mut state = self.state.write();
        let taken = std::mem::take(&mut state.subscriptions);
        state.detached += taken.len();
        Detached {
            registry: self,
            unsettled: taken.len(),
            entries: taken.into_iter(),
        }
    }

    fn put_back(&self, key: K, sub: Subscription<A>, stop_wins: bool) -> Reattach<A> {
        let mut state = self.state.write();
        state.detached = state.detached.saturating_sub(1);
        if stop_wins && !state.running {
            return Reattach::Discarded(sub);
        }
        if state.subscriptions.contains_key(&key) {
            return Reattach::Superseded(sub);
        }
        state.subscriptions.insert(key, sub);
        Reattach::Restored
    }

    pub(crate) fn contains(&self, key: &K) -> bool {
        self.state.read().subscriptions.contains_key(key)
    }
}

impl<K, A> Registry<K, A> {
    pub(crate) fn len(&self) -> usize {
        self.state.read().subscriptions.len()
    }

    /// Entry count through exclusive access (no locking).
    pub(crate) fn len_mut(&mut self) -> usize {
        self.state.get_mut().subscriptions.len()
    }

    fn forget(&self, count: usize) {
        if count == 0 {
            return;
        }
        let mut state = self.state.write();
        state.detached = state.detached.saturating_sub(count);
    }
}

/// Entries taken out of the registry by one pass.
///
/// Each yielded entry must be settled exactly once. Whatever is still
/// unsettled when the pass is dropped (a handler panicked, say) gives its
/// capacity slot back and is dropped without a callback.
pub(crate) struct Detached<'a, K, A> {
    registry: &'a Registry<K, A>,
    entries: IntoIter<K, Subscription<A>>,
    unsettled: usize,
}

impl<K, A> Detached<'_, K, A>
where
    K: Eq + Hash,
    A: 'static,
{
    /// Puts back a record whose handler asked to stay, unless stopped meanwhile.
    pub(crate) fn reattach(&mut self, key: K, sub: Subscription<A>) -> Reattach<A> {
        self.unsettled = self.unsettled.saturating_sub(1);
        self.registry.put_back(key, sub, true)
    }

    /// Puts back an unexpired record after a purge, regardless of the running flag.
    pub(crate) fn restore(&mut self, key: K, sub: Subscription<A>) -> Reattach<A> {
        self.unsettled = self.unsettled.saturating_sub(1);
        self.registry.put_back(key, sub, false)
    }

    /// Frees the slot of a record that is not coming back.
    pub(crate) fn release(&mut self) {
        self.unsettled = self.unsettled.saturating_sub(1);
        self.registry.forget(1);
    }
}

impl<K, A> Iterator for Detached<'_, K, A> {
    type Item = (K, Subscription<A>);

    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }
}

impl<K, A> Drop for Detached<'_, K, A> {
    fn drop(&mut self) {
        self.registry.forget(self.unsettled);
    }
}
