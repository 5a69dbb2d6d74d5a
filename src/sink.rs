use crate::alert::{Alert, AlertSink};
use crate::error::SinkError;
use spdlog::warn;
use std::io::Write;
use std::mem;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Writes each alert as one JSON line.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
    written: AtomicU64,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            written: AtomicU64::new(0),
        }
    }

    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    pub fn flush(&self) -> Result<(), SinkError> {
        let mut writer = self.writer.lock().map_err(|_| SinkError::Poisoned)?;
        writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W, SinkError> {
        self.writer.into_inner().map_err(|_| SinkError::Poisoned)
    }
}

impl<W: Write + Send> AlertSink for JsonLinesSink<W> {
    fn emit(&self, alert: &Alert) -> Result<(), SinkError> {
        let line = serde_json::to_string(alert)?;
        let mut writer = self.writer.lock().map_err(|_| SinkError::Poisoned)?;
        writeln!(writer, "{}", line)?;
        self.written.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Reports alerts through the logger.
#[derive(Debug, Default)]
pub struct LogSink;

impl AlertSink for LogSink {
    fn emit(&self, alert: &Alert) -> Result<(), SinkError> {
        warn!(
            "[Alert] spotChange for {} at {}",
            alert.key, alert.timestamp
        );
        Ok(())
    }
}

/// Keeps alerts in memory until drained.
#[derive(Debug, Default)]
pub struct CollectingSink {
    alerts: Mutex<Vec<Alert>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Alert> {
        match self.alerts.lock() {
            Ok(mut alerts) => mem::take(&mut *alerts),
            Err(poisoned) => mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn snapshot(&self) -> Vec<Alert> {
        match self.alerts.lock() {
            Ok(alerts) => alerts.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.alerts.lock().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AlertSink for CollectingSink {
    fn emit(&self, alert: &Alert) -> Result<(), SinkError> {
        self.alerts
            .lock()
            .map_err(|_| SinkError::Poisoned)?
            .push(alert.clone());
        Ok(())
    }
}
