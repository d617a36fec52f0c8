//! Error types used by the notifier runtime.
//!
//! Notifier operations never fail: stopped services, absent keys and full
//! registries are silent no-ops reported to the handler itself. The only
//! fallible surface is deferred delivery, described by [`DispatchError`].
//!
//! [`DispatchError`] provides helper methods (`as_label`, `as_message`) for logging/metrics.

use thiserror::Error;

/// # Errors produced when scheduling deferred work.
///
/// Returned by [`Strand::post`](crate::Strand::post),
/// [`Dispatcher::current`](crate::Dispatcher::current) and
/// [`Notifier::relay`](crate::Notifier::relay).
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchError {
    /// Notifier was built without a dispatcher (builder didn't call `with_dispatcher`).
    #[error("dispatcher not configured")]
    NotConfigured,

    /// No tokio runtime is available on the calling thread.
    #[error("no tokio runtime on the calling thread")]
    NoRuntime,

    /// Strand worker is gone (runtime shut down); the job was not queued.
    #[error("dispatcher strand closed")]
    Closed,
}

impl DispatchError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use notifier::DispatchError;
    ///
    /// assert_eq!(DispatchError::Closed.as_label(), "dispatch_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DispatchError::NotConfigured => "dispatch_not_configured",
            DispatchError::NoRuntime => "dispatch_no_runtime",
            DispatchError::Closed => "dispatch_closed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            DispatchError::NotConfigured => {
                "relay requires a dispatcher; set one with NotifierBuilder::with_dispatcher"
                    .to_string()
            }
            DispatchError::NoRuntime => "dispatcher must be created inside a tokio runtime".to_string(),
            DispatchError::Closed => "strand worker stopped; runtime is shutting down".to_string(),
        }
    }
}
