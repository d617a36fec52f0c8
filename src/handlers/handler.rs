//! # Subscription handler trait.
//!
//! Provides [`Handler`], the callable stored inside every subscription.
//!
//! A handler receives the notifier's argument value by reference and returns a
//! continuation flag. The same argument type is used on every delivery path:
//!
//! ```text
//! invoke / relay        ──► handler(&args)      ──► true = keep, false = drop
//! subscribe (rejected)  ──► handler(&stopped)   ──► return value ignored
//! unsubscribe           ──► handler(&unsubscribed)
//! purge (expired)       ──► handler(&expired)
//! shutdown              ──► handler(&args)      ──► always dropped
//! ```
//!
//! Closures implement the trait through a blanket impl:
//! ```rust
//! use notifier::Handler;
//!
//! fn takes_handler(_h: impl Handler<u32>) {}
//!
//! takes_handler(|height: &u32| *height < 100);
//! ```

/// Callback registered against a key.
///
/// ### Implementation requirements
/// - Must not call [`Notifier::invoke`](crate::Notifier::invoke),
///   [`Notifier::purge`](crate::Notifier::purge) or
///   [`Notifier::shutdown`](crate::Notifier::shutdown) (or wait on anything
///   that does) on the notifier that is delivering to it; the pass holds the
///   matching lock and reentry deadlocks.
/// - Only ever called through `&mut self`, so `Sync` is not required.
/// - Runs on whatever thread delivers: the caller of `invoke`/`subscribe`/
///   `unsubscribe`/`purge`, or a blocking-pool thread for relayed passes.
pub trait Handler<A>: Send + 'static {
    /// Handles one notification; returns `true` to stay subscribed.
    fn call(&mut self, args: &A) -> bool;
}

impl<A, F> Handler<A> for F
where
    F: FnMut(&A) -> bool + Send + 'static,
{
    #[inline]
    fn call(&mut self, args: &A) -> bool {
        self(args)
    }
}
