use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use notifier::{Bus, Config, EventKind, ManualClock, Notifier};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PeerEvent {
    Message(u32),
    ServiceStopped,
    Unsubscribed,
    Timeout,
}

fn peers(limit: usize, bus: Bus) -> (Arc<Notifier<String, PeerEvent>>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let n = Notifier::builder(Config {
        name: "peers".to_string(),
        limit,
        ..Config::default()
    })
    .with_clock(clock.clone())
    .with_bus(bus)
    .with_debug_keys()
    .build();
    n.start();
    (n, clock)
}

#[test]
fn event_stream_follows_subscription_lifecycle() {
    let bus = Bus::new(64);
    let mut rx = bus.subscribe();
    let (n, clock) = peers(1, bus);

    let keep = |_: &PeerEvent| true;
    n.subscribe(keep, "a".to_string(), Duration::from_secs(10), PeerEvent::ServiceStopped);
    n.subscribe(keep, "a".to_string(), Duration::from_secs(20), PeerEvent::ServiceStopped);
    n.subscribe(keep, "b".to_string(), Duration::from_secs(10), PeerEvent::ServiceStopped);
    n.invoke(PeerEvent::Message(1));
    clock.advance(Duration::from_secs(30));
    n.purge(PeerEvent::Timeout);
    n.stop();

    let seen: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
        .map(|ev| (ev.kind, ev.key.as_deref().map(str::to_string)))
        .collect();
    assert_eq!(
        seen,
        vec![
            (EventKind::Started, None),
            (EventKind::Subscribed, Some("\"a\"".to_string())),
            (EventKind::Renewed, Some("\"a\"".to_string())),
            (EventKind::Rejected, Some("\"b\"".to_string())),
            (EventKind::Expired, Some("\"a\"".to_string())),
            (EventKind::Stopped, None),
        ]
    );
    assert!(n.is_empty());
}

#[test]
fn every_delivery_path_uses_the_same_argument_type() {
    let (n, clock) = peers(1, Bus::default());
    let log: Arc<Mutex<Vec<(String, PeerEvent)>>> = Arc::default();

    let handler = |tag: &str| {
        let log = Arc::clone(&log);
        let tag = tag.to_string();
        move |ev: &PeerEvent| {
            log.lock().unwrap().push((tag.clone(), *ev));
            true
        }
    };

    n.subscribe(handler("first"), "first".into(), Duration::from_secs(5), PeerEvent::ServiceStopped);
    n.subscribe(handler("full"), "full".into(), Duration::from_secs(5), PeerEvent::ServiceStopped);
    n.invoke(PeerEvent::Message(9));
    n.unsubscribe(&"first".to_string(), PeerEvent::Unsubscribed);
    n.subscribe(handler("timed"), "timed".into(), Duration::from_secs(5), PeerEvent::ServiceStopped);
    clock.advance(Duration::from_secs(6));
    n.purge(PeerEvent::Timeout);
    n.stop();
    n.subscribe(handler("late"), "late".into(), Duration::from_secs(5), PeerEvent::ServiceStopped);

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            ("full".to_string(), PeerEvent::ServiceStopped),
            ("first".to_string(), PeerEvent::Message(9)),
            ("first".to_string(), PeerEvent::Unsubscribed),
            ("timed".to_string(), PeerEvent::Timeout),
            ("late".to_string(), PeerEvent::ServiceStopped),
        ]
    );
    assert!(n.is_empty());
}

#[test]
fn concurrent_registry_traffic_stays_consistent() {
    let (n, _) = peers(0, Bus::default());

    let workers: Vec<_> = (0..8)
        .map(|w| {
            let n = Arc::clone(&n);
            thread::spawn(move || {
                for i in 0..200 {
                    let key = format!("peer-{}", (w * 7 + i) % 32);
                    match i % 4 {
                        0 | 1 => n.subscribe(
                            |_: &PeerEvent| true,
                            key,
                            Duration::from_secs(60),
                            PeerEvent::ServiceStopped,
                        ),
                        2 => n.unsubscribe(&key, PeerEvent::Unsubscribed),
                        _ => n.invoke(PeerEvent::Message(i)),
                    }
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    assert!(n.len() <= 32);
    n.shutdown(PeerEvent::ServiceStopped);
    assert!(n.is_empty());
}

#[test]
fn purge_and_invoke_may_interleave() {
    let (n, clock) = peers(0, Bus::default());
    for i in 0..64 {
        let ttl = if i % 2 == 0 { 1 } else { 3600 };
        n.subscribe(
            |_: &PeerEvent| true,
            format!("peer-{i}"),
            Duration::from_secs(ttl),
            PeerEvent::ServiceStopped,
        );
    }
    clock.advance(Duration::from_secs(2));

    let purger = {
        let n = Arc::clone(&n);
        thread::spawn(move || {
            for _ in 0..20 {
                n.purge(PeerEvent::Timeout);
            }
        })
    };
    let invoker = {
        let n = Arc::clone(&n);
        thread::spawn(move || {
            for h in 0..20 {
                n.invoke(PeerEvent::Message(h));
            }
        })
    };
    purger.join().unwrap();
    invoker.join().unwrap();
    n.purge(PeerEvent::Timeout);

    assert_eq!(n.len(), 32);
    for i in (1..64).step_by(2) {
        assert!(n.contains(&format!("peer-{i}")));
    }
    n.shutdown(PeerEvent::ServiceStopped);
}
