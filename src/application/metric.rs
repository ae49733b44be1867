//! Registry of metric providers keyed by metric type.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::port::outbound::metric::MetricProvider;

/// Explicitly constructed map from metric type to provider.
///
/// Built once at startup and shared read-only with the scheduler.
#[derive(Default)]
pub struct MetricRegistry {
    providers: HashMap<String, Arc<dyn MetricProvider>>,
}

impl MetricRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own name, replacing any previous one.
    pub fn register(&mut self, provider: Arc<dyn MetricProvider>) {
        let name = provider.name().to_string();
        if self.providers.insert(name.clone(), provider).is_some() {
            warn!(metric = %name, "Replaced previously registered metric provider");
        } else {
            debug!(metric = %name, "Registered metric provider");
        }
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, provider: Arc<dyn MetricProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Look up a provider by metric type.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn MetricProvider>> {
        self.providers.get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Registered metric types, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
