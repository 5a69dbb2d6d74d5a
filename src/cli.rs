use clap::{Parser, ValueEnum};
use spdlog::{Level, LevelFilter};
use std::num::NonZeroUsize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::Error,
            LogLevel::Warn => Level::Warn,
            LogLevel::Info => Level::Info,
            LogLevel::Debug => Level::Debug,
            LogLevel::Trace => Level::Trace,
        }
    }
}

/// Raise spot-change alerts from a JSON Lines stream of exchange-rate readings.
#[derive(Parser, Debug, Clone)]
#[command(name = "rate-watch", version)]
pub struct Args {
    /// JSON Lines file with `currencyPair`, `rate` and `timestamp` per line
    pub input: Option<PathBuf>,

    /// Write alerts to this file instead of stdout
    #[arg(long)]
    pub alerts: Option<PathBuf>,

    /// Report alerts through the logger instead of writing JSON lines
    #[arg(long, conflicts_with = "alerts")]
    pub log_alerts: bool,

    /// Abort on the first malformed or invalid record instead of skipping it
    #[arg(long)]
    pub strict: bool,

    /// Number of key shards; more than one runs each shard on its own thread
    #[arg(long, default_value = "1")]
    pub shards: NonZeroUsize,

    /// Log progress and latency every N records
    #[arg(long, default_value = "1000000")]
    pub progress_interval: NonZeroUsize,

    /// Time one in every N records
    #[arg(long, default_value = "1000")]
    pub latency_sample_rate: NonZeroUsize,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

pub fn init_logging(level: LogLevel) {
    spdlog::default_logger().set_level_filter(LevelFilter::MoreSevereEqual(level.into()));
}
