mod alert;
pub mod cli;
mod config;
pub mod driver;
mod engine;
mod error;
mod macros;
pub mod measure;
mod pipe;
mod reading;
mod registry;
mod sink;
mod source;
mod stage;
mod window;

pub use crate::alert::{Alert, AlertEvaluator, AlertKind, AlertSink, is_spot_change};
pub use crate::config::{DetectorConfig, RecordFields, SPOT_CHANGE_THRESHOLD, WINDOW_CAPACITY};
pub use crate::engine::{EngineStats, ShardedEngine};
pub use crate::error::{
    ArgumentError, Error, Result, SinkError, SourceError, SubscriberError, ValidationError,
};
pub use crate::pipe::*;
pub use crate::reading::Reading;
pub use crate::registry::{Registry, RouteOutcome};
pub use crate::sink::{CollectingSink, JsonLinesSink, LogSink};
pub use crate::source::JsonLinesSource;
pub use crate::stage::{OutputCollector, Pipeline, Stage, StageExt};
pub use crate::window::{BoundedWindow, Subscriber, Update};
