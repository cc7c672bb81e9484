use std::io;
use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Statledger errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StatsError {
    /// Reading or writing the backing file failed.
    #[error("stats file io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The backing file exists but is not valid YAML.
    #[error("failed to parse stats document {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    /// The in-memory document could not be serialized.
    #[error("failed to serialize stats document: {0}")]
    Serialize(#[from] serde_yaml::Error),
    /// A dotted path was empty or had an empty segment.
    #[error("invalid stat path: {0}")]
    InvalidPath(String),
    /// Configuration file could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),
    /// A section-resolver step reported failure.
    #[error("section resolver: {0}")]
    Resolver(String),
    /// The periodic flush task could not be started.
    #[error("scheduler: {0}")]
    Scheduler(String),
}

pub type Result<T> = std::result::Result<T, StatsError>;

impl StatsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StatsError::Io {
            path: path.into(),
            source,
        }
    }
}
