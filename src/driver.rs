use crate::alert::AlertSink;
use crate::cli::Args;
use crate::config::DetectorConfig;
use crate::engine::ShardedEngine;
use crate::error::{ArgumentError, Error, Result, SinkError, SourceError};
use crate::pipe::{Detection, Detector, latency, progress};
use crate::sink::{JsonLinesSink, LogSink};
use crate::source::JsonLinesSource;
use crate::stage::Stage;
use serde_json::Value;
use spdlog::{debug, info, warn};
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub strict: bool,
    pub shards: usize,
    pub progress_interval: usize,
    pub latency_sample_rate: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            strict: false,
            shards: 1,
            progress_interval: 1_000_000,
            latency_sample_rate: 1000,
        }
    }
}

impl From<&Args> for RunOptions {
    fn from(args: &Args) -> Self {
        Self {
            strict: args.strict,
            shards: args.shards.get(),
            progress_interval: args.progress_interval.get(),
            latency_sample_rate: args.latency_sample_rate.get(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Lines decoded into records.
    pub records: u64,
    /// Records applied to a window.
    pub readings: u64,
    pub rejected: u64,
    pub malformed: u64,
    pub alerts: u64,
    pub keys: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "records={} readings={} rejected={} malformed={} alerts={} keys={}",
            self.records, self.readings, self.rejected, self.malformed, self.alerts, self.keys
        )
    }
}

/// Entry point used by the binary.
pub fn run(args: &Args) -> Result<RunSummary> {
    let input = args.input.as_ref().ok_or(ArgumentError::NoInput)?;
    let source = JsonLinesSource::open(input)?;
    info!("[Driver] Reading {:?}", input);
    let options = RunOptions::from(args);

    let summary = if args.log_alerts {
        process(source, &options, Arc::new(LogSink))?
    } else {
        let writer: Box<dyn Write + Send> = match &args.alerts {
            Some(path) => Box::new(BufWriter::new(File::create(path).map_err(SinkError::Io)?)),
            None => Box::new(io::stdout()),
        };
        let sink = Arc::new(JsonLinesSink::new(writer));
        let summary = process(source, &options, sink.clone())?;
        sink.flush()?;
        summary
    };
    info!("[Driver] {}", summary);
    Ok(summary)
}

/// Drains `source` through the detector, writing alerts to `sink`.
pub fn process<R: BufRead>(
    source: JsonLinesSource<R>,
    options: &RunOptions,
    sink: Arc<dyn AlertSink>,
) -> Result<RunSummary> {
    if options.shards > 1 {
        process_sharded(source, options, sink)
    } else {
        process_inline(source, options, sink.as_ref())
    }
}

/// Unwraps the next source item, isolating malformed lines unless strict.
fn next_record(
    item: std::result::Result<Value, SourceError>,
    options: &RunOptions,
    summary: &mut RunSummary,
) -> Result<Option<Value>> {
    match item {
        Ok(record) => {
            summary.records += 1;
            Ok(Some(record))
        }
        Err(e @ SourceError::Malformed { .. }) => {
            summary.malformed += 1;
            if options.strict {
                return Err(e.into());
            }
            warn!("[Driver] skipping {}", e);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn process_inline<R: BufRead>(
    source: JsonLinesSource<R>,
    options: &RunOptions,
    sink: &dyn AlertSink,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    let mut pipeline = crate::pipe![
        progress::<Value>("Ingest", options.progress_interval),
        latency::<Value, Detection, _>(
            "Detect",
            options.progress_interval,
            options.latency_sample_rate,
            Detector::new(DetectorConfig::default())
        )
    ];

    for item in source {
        let Some(record) = next_record(item, options, &mut summary)? else {
            continue;
        };

        let mut failure: Option<Error> = None;
        pipeline.process(record, &mut |detection: Detection| match detection {
            Detection::Tracked(key) => {
                summary.keys += 1;
                debug!("[Driver] tracking {}", key);
            }
            Detection::Alert(alert) => match sink.emit(&alert) {
                Ok(()) => summary.alerts += 1,
                Err(e) => {
                    failure.get_or_insert(e.into());
                }
            },
            Detection::Rejected(e) => {
                summary.rejected += 1;
                if options.strict {
                    failure.get_or_insert(e.into());
                } else {
                    warn!("[Driver] rejected record {}: {}", summary.records, e);
                }
            }
        });
        if let Some(e) = failure {
            return Err(e);
        }
    }

    summary.readings = summary.records - summary.rejected;
    Ok(summary)
}

fn process_sharded<R: BufRead>(
    source: JsonLinesSource<R>,
    options: &RunOptions,
    sink: Arc<dyn AlertSink>,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    let engine = ShardedEngine::new(DetectorConfig::default(), options.shards, sink)?;

    for item in source {
        let Some(record) = next_record(item, options, &mut summary)? else {
            continue;
        };
        match engine.send_record(&record) {
            Ok(()) => {}
            Err(Error::Validation(e)) => {
                summary.rejected += 1;
                if options.strict {
                    return Err(e.into());
                }
                warn!("[Driver] rejected record {}: {}", summary.records, e);
            }
            Err(e) => return Err(e),
        }
    }

    let stats = engine.shutdown()?;
    if stats.subscriber_failures > 0 {
        // The evaluator only fails when the sink does, so a failed write is fatal.
        return Err(Error::Engine(format!(
            "{} alerts could not be written",
            stats.subscriber_failures
        )));
    }
    summary.readings = stats.readings;
    summary.keys = stats.keys;
    summary.alerts = stats.alerts;
    Ok(summary)
}
