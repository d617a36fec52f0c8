//! Subscription record: a handler and the instant after which it may be evicted.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::handlers::Handler;

/// Horizon used when `now + duration` overflows `Instant` (~30 years).
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

/// One registered interest.
///
/// The key lives in the registry map; the record owns the handler by value.
pub(crate) struct Subscription<A> {
    /// Never locked, only reached through `get_mut`. Keeps the record `Sync`
    /// for the shared registry while handlers themselves need only `Send`.
    handler: Mutex<Box<dyn Handler<A>>>,
    expiry: Instant,
}

impl<A: 'static> Subscription<A> {
    pub(crate) fn new(handler: Box<dyn Handler<A>>, expiry: Instant) -> Self {
        Self {
            handler: Mutex::new(handler),
            expiry,
        }
    }

    #[inline]
    pub(crate) fn expiry(&self) -> Instant {
        self.expiry
    }

    #[inline]
    pub(crate) fn renew(&mut self, expiry: Instant) {
        self.expiry = expiry;
    }

    /// True once `now` is strictly past the expiry.
    #[inline]
    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        now > self.expiry
    }

    /// Runs the handler; returns its keep flag.
    #[inline]
    pub(crate) fn notify(&mut self, args: &A) -> bool {
        self.handler.get_mut().call(args)
    }
}

/// Absolute expiry for a subscription taken at `now`, saturating on overflow.
pub(crate) fn expiry_after(now: Instant, duration: Duration) -> Instant {
    now.checked_add(duration)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}
