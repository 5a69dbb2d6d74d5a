use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A record could not be turned into a [`Reading`](crate::Reading).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("record is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` must be a {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("the file \"{}\" does not exist", path.display())]
    NotFound { path: PathBuf },

    #[error("cannot open \"{}\": {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed record at line {line}, column {column} (byte {offset}): {source}")]
    Malformed {
        line: usize,
        column: usize,
        offset: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("read failed: {0}")]
    Io(#[from] io::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("no input provided")]
    NoInput,
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("alert sink write failed: {0}")]
    Io(#[from] io::Error),

    #[error("alert encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("alert sink is poisoned")]
    Poisoned,
}

#[derive(Error, Debug)]
pub enum SubscriberError {
    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("{0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("engine failure: {0}")]
    Engine(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
