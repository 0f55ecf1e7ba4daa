use super::counter::Counter;
use super::meter::Meter;
use crate::domain::metric::Metric;
use crate::domain::ports::MetricRegistry;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::warn;

#[derive(Clone)]
enum Entry {
    Meter(Arc<Meter>),
    Counter(Arc<Counter>),
    Other(Arc<dyn Metric>),
}

impl Entry {
    fn as_metric(&self) -> Arc<dyn Metric> {
        match self {
            Entry::Meter(m) => m.clone() as Arc<dyn Metric>,
            Entry::Counter(c) => c.clone() as Arc<dyn Metric>,
            Entry::Other(o) => o.clone(),
        }
    }
}

/// Named in-process metrics shared across the application.
///
/// Cloning is cheap; clones share the same underlying map.
#[derive(Clone, Default)]
pub struct InMemoryRegistry {
    entries: Arc<RwLock<BTreeMap<String, Entry>>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `metric` under `name`. Returns false if the name is taken.
    pub fn register(&self, name: impl Into<String>, metric: Arc<dyn Metric>) -> bool {
        self.insert(name.into(), Entry::Other(metric))
    }

    fn insert(&self, name: String, entry: Entry) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries.contains_key(&name) {
            warn!("InMemoryRegistry: Metric {} already registered", name);
            return false;
        }
        entries.insert(name, entry);
        true
    }

    /// Existing meter under `name`, or a freshly registered one.
    /// `None` when the name is held by a metric of another kind.
    pub fn get_or_register_meter(&self, name: &str) -> Option<Arc<Meter>> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        match entries.get(name) {
            Some(Entry::Meter(m)) => Some(m.clone()),
            Some(_) => {
                warn!(
                    "InMemoryRegistry: {} is registered with a different kind, not a meter",
                    name
                );
                None
            }
            None => {
                let meter = Arc::new(Meter::new());
                entries.insert(name.to_string(), Entry::Meter(meter.clone()));
                Some(meter)
            }
        }
    }

    /// Existing counter under `name`, or a freshly registered one.
    pub fn get_or_register_counter(&self, name: &str) -> Option<Arc<Counter>> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        match entries.get(name) {
            Some(Entry::Counter(c)) => Some(c.clone()),
            Some(_) => {
                warn!(
                    "InMemoryRegistry: {} is registered with a different kind, not a counter",
                    name
                );
                None
            }
            None => {
                let counter = Arc::new(Counter::new());
                entries.insert(name.to_string(), Entry::Counter(counter.clone()));
                Some(counter)
            }
        }
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(name)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MetricRegistry for InMemoryRegistry {
    /// Sorted by name.
    fn snapshot(&self) -> Vec<(String, Arc<dyn Metric>)> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(name, entry)| (name.clone(), entry.as_metric()))
            .collect()
    }
}
