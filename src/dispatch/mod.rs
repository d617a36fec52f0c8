//! Deferred, order-preserving delivery.
//!
//! - [`Dispatcher`] binds to a tokio runtime and opens strands
//! - [`Strand`] owner token; jobs posted to it run FIFO on the blocking pool

mod dispatcher;

pub use dispatcher::{Dispatcher, Strand};
