use std::fmt::Debug;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::{
    core::{Config, KeyLabel, Notifier, clock::Clock, clock::MonotonicClock},
    dispatch::Dispatcher,
    events::Bus,
};

/// Builder for constructing a [`Notifier`] with optional collaborators.
pub struct NotifierBuilder<K, A> {
    cfg: Config,
    clock: Option<Arc<dyn Clock>>,
    dispatcher: Option<Dispatcher>,
    bus: Option<Bus>,
    key_label: Option<KeyLabel<K>>,
    _types: PhantomData<fn() -> (K, A)>,
}

impl<K, A> NotifierBuilder<K, A>
where
    K: Eq + Hash + Send + Sync + 'static,
    A: Send + 'static,
{
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            clock: None,
            dispatcher: None,
            bus: None,
            key_label: None,
            _types: PhantomData,
        }
    }

    /// Sets the time source used for expiry. Defaults to [`MonotonicClock`].
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Enables [`Notifier::relay`]: the notifier gets its own strand on `dispatcher`.
    ///
    /// Unless [`with_bus`](Self::with_bus) is also called, the notifier publishes
    /// to the dispatcher's bus.
    pub fn with_dispatcher(mut self, dispatcher: &Dispatcher) -> Self {
        self.dispatcher = Some(dispatcher.clone());
        self
    }

    /// Publishes events to an existing bus instead of a private one.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Renders keys into the `key` field of published events.
    ///
    /// Without a renderer, events carry no key.
    pub fn with_key_label(mut self, render: KeyLabel<K>) -> Self {
        self.key_label = Some(render);
        self
    }

    /// Builds the notifier. It starts in the stopped state.
    ///
    /// Bus resolution: explicit bus, then the dispatcher's bus, then a new bus
    /// with [`Config::bus_capacity`].
    pub fn build(self) -> Arc<Notifier<K, A>> {
        let bus = self
            .bus
            .or_else(|| self.dispatcher.as_ref().map(|d| d.bus().clone()))
            .unwrap_or_else(|| Bus::new(self.cfg.bus_capacity_clamped()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(MonotonicClock));
        let strand = self.dispatcher.as_ref().map(Dispatcher::strand);

        Arc::new(Notifier::new_internal(
            self.cfg,
            clock,
            bus,
            strand,
            self.key_label,
        ))
    }
}

impl<K, A> NotifierBuilder<K, A>
where
    K: Eq + Hash + Debug + Send + Sync + 'static,
    A: Send + 'static,
{
    /// Renders event keys with their `Debug` output.
    pub fn with_debug_keys(self) -> Self {
        self.with_key_label(debug_label::<K> as KeyLabel<K>)
    }
}

fn debug_label<K: Debug>(key: &K) -> String {
    format!("{key:?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[test]
    fn defaults_to_private_bus_and_no_strand() {
        let n: Arc<Notifier<u32, ()>> = NotifierBuilder::new(Config::default()).build();
        assert!(!n.is_running());
        assert_eq!(n.name(), "notifier");
        assert!(!n.bus().is_observed());
    }

    #[test]
    fn explicit_bus_receives_events() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let n: Arc<Notifier<u32, ()>> = NotifierBuilder::new(Config {
            name: "blocks".to_string(),
            ..Config::default()
        })
        .with_bus(bus)
        .build();

        n.start();
        let ev = rx.try_recv().expect("started");
        assert_eq!(ev.kind, EventKind::Started);
        assert_eq!(ev.source.as_deref(), Some("blocks"));
    }

    #[test]
    fn key_renderer_fills_event_keys() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let n: Arc<Notifier<u32, ()>> = NotifierBuilder::new(Config::default())
            .with_bus(bus)
            .with_key_label(|height| format!("height={height}"))
            .build();

        n.start();
        n.subscribe(|_: &()| true, 7, std::time::Duration::from_secs(1), ());
        let keys: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter_map(|ev| ev.key)
            .collect();
        assert_eq!(keys.len(), 1);
        assert_eq!(&*keys[0], "height=7");
        n.shutdown(());
    }
}
