use crate::config::DetectorConfig;
use crate::error::ValidationError;
use crate::reading::Reading;
use crate::window::{BoundedWindow, Subscriber, Update};
use fxhash::FxHashMap;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteOutcome {
    /// True when this reading opened a new series.
    pub created: bool,
    pub update: Update,
}

/// Maps each series key to its [`BoundedWindow`].
///
/// Windows are created on the first valid reading for a key and live as long as
/// the registry. Routing is the only way a window is created or updated.
pub struct Registry {
    config: DetectorConfig,
    subscribers: Vec<Arc<dyn Subscriber>>,
    windows: FxHashMap<String, BoundedWindow>,
}

impl Registry {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            subscribers: Vec::new(),
            windows: FxHashMap::default(),
        }
    }

    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscriber>) -> Self {
        self.add_subscriber(subscriber);
        self
    }

    /// Adds a subscriber to the set attached to windows created from now on.
    pub fn add_subscriber(&mut self, subscriber: Arc<dyn Subscriber>) {
        self.subscribers.push(subscriber);
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Validates a decoded record and routes it. Invalid records touch nothing.
    pub fn route_record(&mut self, record: &Value) -> Result<RouteOutcome, ValidationError> {
        let reading = Reading::from_record(record, &self.config.fields)?;
        Ok(self.route(reading))
    }

    pub fn route(&mut self, reading: Reading) -> RouteOutcome {
        if let Some(window) = self.windows.get_mut(&reading.key) {
            let update = window.insert(reading.value, reading.timestamp);
            return RouteOutcome {
                created: false,
                update,
            };
        }

        let mut window = BoundedWindow::with_subscribers(
            reading.key.as_str(),
            self.config.window_capacity,
            self.subscribers.iter().cloned(),
        );
        let update = window.insert(reading.value, reading.timestamp);
        self.windows.insert(reading.key, window);
        RouteOutcome {
            created: true,
            update,
        }
    }

    pub fn get(&self, key: &str) -> Option<&BoundedWindow> {
        self.windows.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.windows.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.windows.keys().map(String::as_str)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}
