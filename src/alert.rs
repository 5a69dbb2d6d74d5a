use crate::config::SPOT_CHANGE_THRESHOLD;
use crate::error::{SinkError, SubscriberError};
use crate::window::{BoundedWindow, Subscriber};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    #[serde(rename = "spotChange")]
    SpotChange,
}

/// Emitted when the newest value of a series strays too far from its window average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub timestamp: f64,
    #[serde(rename = "currencyPair")]
    pub key: String,
    pub alert: AlertKind,
}

impl Alert {
    pub fn spot_change(key: impl Into<String>, timestamp: f64) -> Self {
        Self {
            timestamp,
            key: key.into(),
            alert: AlertKind::SpotChange,
        }
    }
}

/// Destination for raised alerts.
pub trait AlertSink: Send + Sync {
    fn emit(&self, alert: &Alert) -> Result<(), SinkError>;
}

/// `|latest - average| > threshold * average`.
///
/// A zero average makes any non-zero deviation an alert, and a negative
/// average alerts on every reading.
#[inline(always)]
pub fn is_spot_change(latest: f64, average: f64, threshold: f64) -> bool {
    (latest - average).abs() > threshold * average
}

/// Window subscriber that raises a spot-change alert for outlying readings.
pub struct AlertEvaluator {
    threshold: f64,
    sink: Arc<dyn AlertSink>,
    raised: AtomicU64,
}

impl AlertEvaluator {
    pub fn new(sink: Arc<dyn AlertSink>) -> Self {
        Self::with_threshold(SPOT_CHANGE_THRESHOLD, sink)
    }

    pub fn with_threshold(threshold: f64, sink: Arc<dyn AlertSink>) -> Self {
        Self {
            threshold,
            sink,
            raised: AtomicU64::new(0),
        }
    }

    /// Alerts accepted by the sink so far.
    pub fn raised(&self) -> u64 {
        self.raised.load(Ordering::Relaxed)
    }

    pub fn evaluate(&self, window: &BoundedWindow) -> Option<Alert> {
        let (latest, timestamp) = window.latest();
        if is_spot_change(latest, window.average(), self.threshold) {
            Some(Alert::spot_change(window.key(), timestamp))
        } else {
            None
        }
    }
}

impl Subscriber for AlertEvaluator {
    fn on_update(&self, window: &BoundedWindow) -> Result<(), SubscriberError> {
        if let Some(alert) = self.evaluate(window) {
            self.sink.emit(&alert)?;
            self.raised.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }
}
