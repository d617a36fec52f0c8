//! # Ordered task queue.
//!
//! Provides [`Dispatcher`] and [`Strand`]: per-owner FIFO scheduling of
//! blocking jobs onto tokio's blocking pool.
//!
//! ## Architecture
//! ```text
//! Dispatcher::strand() ──► [unbounded queue] ──► drain task ──► spawn_blocking(job)
//!                                                     │               │
//!                                                     │  awaits each job before the next
//!                                                     └──► panic → EventKind::JobPanicked
//! ```
//!
//! ## Rules
//! - **Per-strand FIFO**: jobs posted to one strand run one at a time, in post order,
//!   no matter which thread posted them.
//! - **No cross-strand ordering**: strand A may run job N while strand B runs job N+5.
//! - **Non-blocking**: `post()` returns immediately (unbounded queue).
//! - **Isolation**: a panicking job is reported and the worker moves on to the next job.
//! - **Lifetime**: the drain task exits once every `Strand` clone is dropped and the
//!   queue is empty. A job owns whatever it captures, so an `Arc` moved into it keeps
//!   its target alive until the job has run.

use std::any::Any;

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::error::DispatchError;
use crate::events::{Bus, Event};

/// Deferred unit of work.
type Job = Box<dyn FnOnce() + Send + 'static>;

/// Factory for ordered strands bound to one tokio runtime.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    runtime: Handle,
    bus: Bus,
}

impl Dispatcher {
    /// Creates a dispatcher that spawns strand workers on `runtime`.
    pub fn new(runtime: Handle, bus: Bus) -> Self {
        Self { runtime, bus }
    }

    /// Creates a dispatcher bound to the runtime of the calling thread.
    ///
    /// Fails with [`DispatchError::NoRuntime`] outside a tokio runtime.
    pub fn current(bus: Bus) -> Result<Self, DispatchError> {
        let runtime = Handle::try_current().map_err(|_| DispatchError::NoRuntime)?;
        Ok(Self::new(runtime, bus))
    }

    /// Opens a new strand and spawns its drain task.
    #[must_use]
    pub fn strand(&self) -> Strand {
        let (tx, rx) = mpsc::unbounded_channel::<Job>();
        self.runtime.spawn(drain(rx, self.bus.clone()));
        Strand { tx }
    }

    /// Bus that receives `JobPanicked` events.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }
}

/// Owner token of an ordered queue.
///
/// Cloning a strand yields another handle to the **same** queue.
#[derive(Clone, Debug)]
pub struct Strand {
    tx: mpsc::UnboundedSender<Job>,
}

impl Strand {
    /// Queues `job` behind every job previously posted to this strand.
    ///
    /// Fails with [`DispatchError::Closed`] when the drain task is gone.
    pub fn post<F>(&self, job: F) -> Result<(), DispatchError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.tx
            .send(Box::new(job))
            .map_err(|_| DispatchError::Closed)
    }

    /// Returns true if the drain task has stopped accepting jobs.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Runs queued jobs sequentially until the queue closes.
async fn drain(mut rx: mpsc::UnboundedReceiver<Job>, bus: Bus) {
    while let Some(job) = rx.recv().await {
        match tokio::task::spawn_blocking(job).await {
            Ok(()) => {}
            Err(err) if err.is_panic() => {
                bus.publish(Event::job_panicked(panic_message(err.into_panic())));
            }
            // Cancelled: the runtime is shutting down.
            Err(_) => break,
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crate::events::EventKind;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn jobs_run_in_post_order() {
        let d = Dispatcher::current(Bus::new(8)).expect("runtime");
        let strand = d.strand();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();

        for i in 0..64u32 {
            let seen = Arc::clone(&seen);
            strand
                .post(move || {
                    // Later jobs are faster; order must still hold.
                    std::thread::sleep(Duration::from_micros(u64::from(64 - i)));
                    seen.lock().unwrap().push(i);
                })
                .expect("post");
        }
        strand.post(move || drop(done_tx.send(()))).expect("post");

        done_rx.await.expect("done");
        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen, (0..64).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn panicking_job_is_reported_and_worker_continues() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let d = Dispatcher::current(bus).expect("runtime");
        let strand = d.strand();
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();

        strand.post(|| panic!("job exploded")).expect("post");
        strand.post(move || drop(done_tx.send(()))).expect("post");

        done_rx.await.expect("second job ran");
        let ev = rx.recv().await.expect("panic event");
        assert_eq!(ev.kind, EventKind::JobPanicked);
        assert_eq!(ev.reason.as_deref(), Some("job exploded"));
    }

    #[test]
    fn current_outside_runtime_fails() {
        let err = Dispatcher::current(Bus::new(1)).unwrap_err();
        assert_eq!(err, DispatchError::NoRuntime);
    }

    #[test]
    fn post_after_runtime_shutdown_is_closed() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");
        let d = Dispatcher::new(rt.handle().clone(), Bus::new(1));
        let strand = d.strand();
        drop(rt);

        assert!(strand.is_closed());
        assert_eq!(strand.post(|| {}), Err(DispatchError::Closed));
    }
}
