use crate::error::SubscriberError;
use spdlog::warn;
use std::collections::VecDeque;
use std::sync::Arc;

/// Reacts to every update of a [`BoundedWindow`].
///
/// Subscribers run synchronously, in attachment order, after the window has
/// committed the new reading. A failing subscriber never rolls the window back.
pub trait Subscriber: Send + Sync {
    fn on_update(&self, window: &BoundedWindow) -> Result<(), SubscriberError>;
}

impl<F> Subscriber for F
where
    F: Fn(&BoundedWindow) -> Result<(), SubscriberError> + Send + Sync,
{
    fn on_update(&self, window: &BoundedWindow) -> Result<(), SubscriberError> {
        (self)(window)
    }
}

/// Result of a single [`BoundedWindow::insert`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Update {
    /// Value that slid out of the window (a zero placeholder during warm-up).
    pub evicted: f64,
    pub average: f64,
    pub subscriber_failures: usize,
}

/// Fixed-capacity FIFO of the most recent `(value, timestamp)` pairs of one series.
///
/// The window is pre-filled with `capacity` zero placeholders so its length never
/// changes. The sum of the stored values is maintained incrementally; the average
/// divides it by the number of real insertions seen so far (capped at capacity),
/// so placeholders never dilute it.
pub struct BoundedWindow {
    key: String,
    capacity: usize,
    values: VecDeque<f64>,
    timestamps: VecDeque<f64>,
    running_sum: f64,
    inserted_count: usize,
    average: f64,
    since_resync: usize,
    subscribers: Vec<Arc<dyn Subscriber>>,
}

impl BoundedWindow {
    pub fn new(key: impl Into<String>, capacity: usize) -> Self {
        assert!(capacity > 0, "window capacity must be greater than 0");
        Self {
            key: key.into(),
            capacity,
            values: VecDeque::from(vec![0.0; capacity]),
            timestamps: VecDeque::from(vec![0.0; capacity]),
            running_sum: 0.0,
            inserted_count: 0,
            average: 0.0,
            since_resync: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn with_subscribers(
        key: impl Into<String>,
        capacity: usize,
        subscribers: impl IntoIterator<Item = Arc<dyn Subscriber>>,
    ) -> Self {
        let mut window = Self::new(key, capacity);
        for subscriber in subscribers {
            window.attach(subscriber);
        }
        window
    }

    /// Attaches a subscriber. Returns `false` if this exact subscriber is already attached.
    pub fn attach(&mut self, subscriber: Arc<dyn Subscriber>) -> bool {
        let already = self
            .subscribers
            .iter()
            .any(|s| std::ptr::addr_eq(Arc::as_ptr(s), Arc::as_ptr(&subscriber)));
        if already {
            return false;
        }
        self.subscribers.push(subscriber);
        true
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Pushes a reading, evicting the oldest one, then notifies all subscribers.
    pub fn insert(&mut self, value: f64, timestamp: f64) -> Update {
        // The length is pinned at capacity, so the head always exists.
        let evicted = self.values.pop_front().unwrap_or(0.0);
        self.timestamps.pop_front();
        self.values.push_back(value);
        self.timestamps.push_back(timestamp);

        if self.inserted_count < self.capacity {
            self.inserted_count += 1;
        }

        self.running_sum += value - evicted;
        if self.is_warm() {
            self.since_resync += 1;
            if self.since_resync >= self.capacity {
                self.running_sum = self.exact_sum();
                self.since_resync = 0;
            }
        }
        self.average = self.running_sum / self.inserted_count as f64;

        let subscriber_failures = self.notify_all();
        Update {
            evicted,
            average: self.average,
            subscriber_failures,
        }
    }

    fn notify_all(&self) -> usize {
        let mut failures = 0;
        for subscriber in &self.subscribers {
            if let Err(e) = subscriber.on_update(self) {
                failures += 1;
                warn!("[Window:{}] subscriber failed: {}", self.key, e);
            }
        }
        failures
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Always equal to [`capacity`](Self::capacity).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inserted_count == 0
    }

    pub fn inserted_count(&self) -> usize {
        self.inserted_count
    }

    /// True once `capacity` real readings have been inserted.
    pub fn is_warm(&self) -> bool {
        self.inserted_count == self.capacity
    }

    pub fn running_sum(&self) -> f64 {
        self.running_sum
    }

    /// Sum of the stored values by a full scan.
    pub fn exact_sum(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn average(&self) -> f64 {
        self.average
    }

    /// Most recent `(value, timestamp)`.
    pub fn latest(&self) -> (f64, f64) {
        (
            self.values.back().copied().unwrap_or(0.0),
            self.timestamps.back().copied().unwrap_or(0.0),
        )
    }

    /// Oldest stored `(value, timestamp)`, which may be a placeholder.
    pub fn oldest(&self) -> (f64, f64) {
        (
            self.values.front().copied().unwrap_or(0.0),
            self.timestamps.front().copied().unwrap_or(0.0),
        )
    }

    pub fn values(&self) -> &VecDeque<f64> {
        &self.values
    }

    pub fn timestamps(&self) -> &VecDeque<f64> {
        &self.timestamps
    }
}

impl std::fmt::Debug for BoundedWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedWindow")
            .field("key", &self.key)
            .field("capacity", &self.capacity)
            .field("inserted_count", &self.inserted_count)
            .field("average", &self.average)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
