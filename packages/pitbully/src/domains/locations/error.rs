use std::path::PathBuf;
use thiserror::Error;

/// Failures inside a location backend.
///
/// Backends log these with operation context before returning them;
/// `LocationFacade` turns them into absent results.
#[derive(Debug, Error)]
pub enum LocationError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed location document: {0}")]
    Document(#[from] serde_yaml::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid connection settings: {0}")]
    ConnectionUrl(String),

    #[error("stored actor id {0:?} is not a valid id")]
    InvalidActorId(String),

    #[error("stored location type {0:?} is not recognised")]
    InvalidLocationKind(String),
}

impl LocationError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        LocationError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type StoreResult<T> = Result<T, LocationError>;
