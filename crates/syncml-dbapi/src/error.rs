use thiserror::Error;

/// Error taxonomy for the DBApi runtime.
///
/// Variants prefixed with nothing map to the engine-facing outcomes a
/// plugin call can report; the remaining variants are host-side
/// failures (loading, parsing, I/O) that never cross the plugin ABI.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not found")]
    NotFound,
    #[error("forbidden")]
    Forbidden,
    #[error("fatal error: {0}")]
    Fatal(String),
    #[error("{0}")]
    Generic(String),
    #[error("datastore full")]
    Full,
    #[error("synchronization anchor too old")]
    TooOld,
    #[error("not implemented")]
    NotImplemented,
    #[error("already exists")]
    Already,
    #[error("items merged")]
    DataMerged,
    #[error("item replaced")]
    DataReplaced,
    #[error("conflicting changes")]
    Conflict,

    #[error("plugin loader error: {0}")]
    Loader(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(format!("{} at line {} column {}", err, err.line(), err.column()))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
