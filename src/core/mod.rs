//! Notifier core: registry, locking, delivery and expiry.
//!
//! The public API from this module is [`Notifier`] (with its builder and
//! configuration) and the [`Clock`] abstraction.
//!
//! Internal modules:
//! - [`registry`]: key → subscription map and running flag under the upgradable lock;
//! - [`subscription`]: handler + expiry record;
//! - [`notifier`]: subscribe/unsubscribe/purge/invoke/relay;
//! - [`sweeper`]: periodic purge on the tokio runtime;
//! - [`clock`]: monotonic and manual time sources.

mod builder;
mod clock;
mod config;
mod notifier;
mod registry;
mod subscription;
mod sweeper;

pub use builder::NotifierBuilder;
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::Config;
pub use notifier::{KeyLabel, Notifier};
