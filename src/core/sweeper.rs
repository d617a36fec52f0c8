//! # Background purge loop.
//!
//! ```text
//! interval(period) ──tick──► Weak::upgrade ──► spawn_blocking(purge(expired.clone()))
//!        │                         │
//!        │                         └─ notifier gone ─► exit
//!        └─ token cancelled ─► exit
//! ```
//!
//! The first tick fires one full period after spawning. Missed ticks are
//! delayed, not bursted: a slow purge never triggers back-to-back passes.

use std::hash::Hash;
use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::events::Event;

use super::Notifier;

/// Spawns the sweeper on the current tokio runtime.
pub(crate) fn spawn<K, A>(
    notifier: Weak<Notifier<K, A>>,
    period: Duration,
    expired: A,
    token: CancellationToken,
) -> JoinHandle<()>
where
    K: Eq + Hash + Send + Sync + 'static,
    A: Clone + Send + 'static,
{
    tokio::spawn(async move {
        let start = tokio::time::Instant::now() + period;
        let mut ticker = tokio::time::interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    let Some(target) = notifier.upgrade() else { break };
                    let bus = target.bus().clone();
                    let args = expired.clone();

                    match tokio::task::spawn_blocking(move || target.purge(args)).await {
                        Ok(()) => {}
                        Err(err) if err.is_panic() => {
                            bus.publish(Event::job_panicked("purge handler panicked".to_string()));
                        }
                        Err(_) => break,
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::{Config, clock::ManualClock};

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn sweeper_purges_expired_entries() {
        let clock = Arc::new(ManualClock::new());
        let n: Arc<Notifier<&'static str, &'static str>> = Notifier::builder(Config {
            sweep_interval: Duration::from_millis(10),
            ..Config::default()
        })
        .with_clock(clock.clone())
        .build();
        n.start();

        let (tx, rx) = tokio::sync::oneshot::channel::<&'static str>();
        let tx = std::sync::Mutex::new(Some(tx));
        n.subscribe(
            move |s: &&'static str| {
                if let Some(tx) = tx.lock().unwrap().take() {
                    let _ = tx.send(*s);
                }
                false
            },
            "peer",
            Duration::from_secs(1),
            "stopped",
        );

        let token = CancellationToken::new();
        let handle = n.spawn_sweeper("expired", token.clone()).expect("enabled");

        clock.advance(Duration::from_secs(2));
        let got = tokio::time::timeout(Duration::from_secs(5), rx)
            .await
            .expect("purged in time")
            .expect("handler fired");
        assert_eq!(got, "expired");
        assert!(n.is_empty());

        token.cancel();
        handle.await.expect("sweeper exits");
    }

    #[tokio::test]
    async fn sweeper_disabled_by_zero_interval() {
        let n: Arc<Notifier<u8, ()>> = Notifier::builder(Config::default()).build();
        assert!(n.spawn_sweeper((), CancellationToken::new()).is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn sweeper_exits_when_notifier_dropped() {
        let n: Arc<Notifier<u8, ()>> = Notifier::builder(Config {
            sweep_interval: Duration::from_millis(5),
            ..Config::default()
        })
        .build();
        let handle = n
            .spawn_sweeper((), CancellationToken::new())
            .expect("enabled");

        drop(n);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("exited in time")
            .expect("no panic");
    }
}
