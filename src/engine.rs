use crate::alert::{AlertEvaluator, AlertSink};
use crate::config::DetectorConfig;
use crate::error::{Error, Result};
use crate::reading::Reading;
use crate::registry::Registry;
use serde_json::Value;
use spdlog::{debug, info};
use std::sync::Arc;
use std::sync::mpsc::{self, SyncSender};
use std::thread;

const SHARD_QUEUE_DEPTH: usize = 4096;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub readings: u64,
    pub keys: usize,
    pub alerts: u64,
    pub subscriber_failures: u64,
}

struct Shard {
    sender: SyncSender<Reading>,
    handle: thread::JoinHandle<EngineStats>,
}

/// Key-sharded detection engine.
///
/// Each shard runs on its own thread with a private [`Registry`]. A key always
/// hashes to the same shard, so its readings are applied in arrival order while
/// distinct keys proceed without any shared lock. Only the alert sink is shared.
pub struct ShardedEngine {
    config: DetectorConfig,
    shards: Vec<Shard>,
}

impl ShardedEngine {
    pub fn new(config: DetectorConfig, shard_count: usize, sink: Arc<dyn AlertSink>) -> Result<Self> {
        assert!(shard_count > 0, "shard_count must be greater than 0");
        let mut shards = Vec::with_capacity(shard_count);
        for shard_id in 0..shard_count {
            let (sender, receiver) = mpsc::sync_channel::<Reading>(SHARD_QUEUE_DEPTH);
            let evaluator = Arc::new(AlertEvaluator::with_threshold(config.threshold, sink.clone()));
            let mut registry = Registry::new(config).with_subscriber(evaluator.clone());

            let handle = thread::Builder::new()
                .name(format!("shard-{}", shard_id))
                .spawn(move || {
                    let mut stats = EngineStats::default();
                    for reading in receiver {
                        let outcome = registry.route(reading);
                        stats.readings += 1;
                        stats.subscriber_failures += outcome.update.subscriber_failures as u64;
                    }
                    stats.keys = registry.len();
                    stats.alerts = evaluator.raised();
                    debug!(
                        "[Shard:{}] drained {} readings over {} keys",
                        shard_id, stats.readings, stats.keys
                    );
                    stats
                })
                .map_err(|e| Error::Engine(format!("cannot spawn shard {}: {}", shard_id, e)))?;

            shards.push(Shard { sender, handle });
        }
        info!("[Engine] started {} shards", shard_count);
        Ok(Self { config, shards })
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Shard that owns `key`.
    pub fn shard_of(&self, key: &str) -> usize {
        (fxhash::hash64(key) % self.shards.len() as u64) as usize
    }

    /// Validates a record on the calling thread and hands it to its shard.
    pub fn send_record(&self, record: &Value) -> Result<()> {
        let reading = Reading::from_record(record, &self.config.fields)?;
        self.send(reading)
    }

    pub fn send(&self, reading: Reading) -> Result<()> {
        let shard = self.shard_of(&reading.key);
        self.shards[shard]
            .sender
            .send(reading)
            .map_err(|_| Error::Engine(format!("shard {} stopped", shard)))
    }

    /// Closes the inputs, waits for every shard to drain and merges their stats.
    pub fn shutdown(self) -> Result<EngineStats> {
        let mut total = EngineStats::default();
        let mut panicked = Vec::new();
        for (shard_id, shard) in self.shards.into_iter().enumerate() {
            drop(shard.sender);
            match shard.handle.join() {
                Ok(stats) => {
                    total.readings += stats.readings;
                    total.keys += stats.keys;
                    total.alerts += stats.alerts;
                    total.subscriber_failures += stats.subscriber_failures;
                }
                Err(_) => panicked.push(shard_id),
            }
        }
        if !panicked.is_empty() {
            return Err(Error::Engine(format!("shards {:?} panicked", panicked)));
        }
        Ok(total)
    }
}
