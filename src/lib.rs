//! # notifier
//!
//! **notifier** is a keyed subscription primitive for node and wallet
//! infrastructure: components register time-bounded callbacks against a key
//! ("block at this hash", "timeout for this peer") and get called when the
//! event happens, when the subscription expires, when it is cancelled, or
//! when the owning subsystem shuts down.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   producers (any thread)
//!     │ subscribe / unsubscribe          │ invoke           │ relay
//!     ▼                                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Notifier<K, A>                                                   │
//! │  - Registry (K → handler + expiry, running flag; upgradable lock) │
//! │  - invocation lock (one delivery pass at a time)                  │
//! │  - Clock (expiry instants)                                        │
//! │  - Strand (own FIFO queue on the Dispatcher)                      │
//! └──────┬──────────────────────────┬──────────────────────┬──────────┘
//!        │ publish(Event)           │ post(pass)           │ purge
//!        ▼                          ▼                      │
//!   ┌─────────┐              ┌──────────────┐       ┌──────┴──────┐
//!   │   Bus   │◄─ panics ────│  Dispatcher  │       │   Sweeper   │
//!   └────┬────┘              │ strand queue │       │ (interval)  │
//!        ▼                   │ → blocking   │       └─────────────┘
//!    LogWriter               │   pool, FIFO │
//!   (→ tracing)              └──────────────┘
//! ```
//!
//! ### Delivery pass
//! ```text
//! lock invocation
//!   detach registry (swap with empty map, exclusive lock held briefly)
//!   for each (key, sub):
//!     keep = handler(&args)             (no registry lock held)
//!     keep && running  → reattach       (upgradable → exclusive)
//!     keep && stopped  → Discarded      (stop wins)
//!     !keep            → Dropped
//! unlock invocation
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                     |
//! |-------------------|---------------------------------------------------------------|----------------------------------------|
//! | **Registry**      | Keyed, expiring subscriptions with optional capacity.         | [`Notifier`], [`Config`]               |
//! | **Handlers**      | Closures or types returning a keep/drop flag.                 | [`Handler`]                            |
//! | **Ordered relay** | Per-owner FIFO delivery on tokio's blocking pool.             | [`Dispatcher`], [`Strand`]             |
//! | **Expiry**        | Pluggable time source, manual or periodic purge.              | [`Clock`], [`ManualClock`]             |
//! | **Events**        | Broadcast of registry and lifecycle changes.                  | [`Bus`], [`Event`], [`EventKind`]      |
//! | **Errors**        | Typed errors for deferred delivery.                           | [`DispatchError`]                      |
//!
//! ## Optional features
//! - `logging` _(default)_: exports [`LogWriter`], which forwards bus events to `tracing`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use notifier::{Config, Dispatcher, Bus, Notifier};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! enum BlockEvent { Connected(u64), Stopped, Expired, Unsubscribed }
//!
//! #[tokio::main(flavor = "multi_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Dispatcher::current(Bus::default())?;
//!     let blocks = Notifier::<String, BlockEvent>::builder(Config::default())
//!         .with_dispatcher(&dispatcher)
//!         .build();
//!     blocks.start();
//!
//!     blocks.subscribe(
//!         |ev: &BlockEvent| {
//!             println!("wallet saw {ev:?}");
//!             matches!(ev, BlockEvent::Connected(_))
//!         },
//!         "wallet".to_string(),
//!         Duration::from_secs(60),
//!         BlockEvent::Stopped,
//!     );
//!
//!     blocks.invoke(BlockEvent::Connected(1));   // caller thread
//!     blocks.relay(BlockEvent::Connected(2))?;   // strand, FIFO
//!
//!     // Teardown: stop and drain. A relayed pass still queued finds an empty registry.
//!     let closing = blocks.clone();
//!     tokio::task::spawn_blocking(move || closing.shutdown(BlockEvent::Stopped)).await?;
//!     Ok(())
//! }
//! ```
mod core;
mod dispatch;
mod error;
mod events;
mod handlers;

// ---- Public re-exports ----

pub use crate::core::{
    Clock, Config, KeyLabel, ManualClock, MonotonicClock, Notifier, NotifierBuilder,
};
pub use dispatch::{Dispatcher, Strand};
pub use error::DispatchError;
pub use events::{Bus, Event, EventKind};
pub use handlers::Handler;

// Optional: expose a bus listener that logs through `tracing`.
// Enabled by default; disable with `--no-default-features`.
#[cfg(feature = "logging")]
mod observers;
#[cfg(feature = "logging")]
pub use observers::LogWriter;
