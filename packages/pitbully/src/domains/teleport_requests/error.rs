use thiserror::Error;

/// Failures constructing the request coordinator.
///
/// Request lifecycle problems (duplicates, lapsed requests, offline actors)
/// are not errors: they are reported as outcomes and notices.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Expiry timers need a tokio runtime to be spawned on.
    #[error("teleport requests need a tokio runtime: {0}")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}
