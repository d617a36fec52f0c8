//! Subscription handlers.
//!
//! - [`Handler`] callable invoked with the notifier's argument value

mod handler;

pub use handler::Handler;
