use crate::alert::{Alert, AlertEvaluator};
use crate::config::DetectorConfig;
use crate::error::ValidationError;
use crate::reading::Reading;
use crate::registry::Registry;
use crate::sink::CollectingSink;
use crate::stage::{OutputCollector, Stage};
use serde_json::Value;
use std::sync::Arc;

/// What the detector forwards for one input record.
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    /// First reading of a key; its window was just created.
    Tracked(String),
    Alert(Alert),
    Rejected(ValidationError),
}

/// Routes decoded records through a [`Registry`] and forwards the alerts they raise.
///
/// The registry's evaluator writes into a private buffer that is drained after
/// every record, so alerts leave in the order their readings arrived.
pub struct Detector {
    registry: Registry,
    raised: Arc<CollectingSink>,
}

impl Detector {
    pub fn new(config: DetectorConfig) -> Self {
        let raised = Arc::new(CollectingSink::new());
        let evaluator = AlertEvaluator::with_threshold(config.threshold, raised.clone());
        let registry = Registry::new(config).with_subscriber(Arc::new(evaluator));
        Self { registry, raised }
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

impl Stage<Value, Detection> for Detector {
    fn process<C>(&mut self, record: Value, collector: &mut C)
    where
        C: OutputCollector<Detection>,
    {
        let reading = match Reading::from_record(&record, &self.registry.config().fields) {
            Ok(reading) => reading,
            Err(e) => return collector.push(Detection::Rejected(e)),
        };
        let new_key = (!self.registry.contains(&reading.key)).then(|| reading.key.clone());
        self.registry.route(reading);
        if let Some(key) = new_key {
            collector.push(Detection::Tracked(key));
        }
        for alert in self.raised.drain() {
            collector.push(Detection::Alert(alert));
        }
    }
}
