//! Built-in event observers.
//!
//! - [`LogWriter`] forwards bus events to `tracing` (feature `logging`)

mod log;

pub use log::LogWriter;
