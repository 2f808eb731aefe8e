//! Collector-specific error types

use thiserror::Error;
use watchpost_domain::WatchpostError;

/// Errors surfaced by collector operations.
///
/// Every public operation fails on the first error; a failure partway
/// through a multi-machine loop leaves earlier machines' work committed and
/// aborts the rest. Callers may re-invoke the operation: machine upserts are
/// keyed by machine id and already-sent signals are excluded by the `sent`
/// flag, so repeated runs do not duplicate effects.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// Connection failure or non-2xx response from the collector
    #[error("Transport failure: {0}")]
    Transport(String),

    /// Local store read or write failure
    #[error("Storage failure: {0}")]
    Storage(String),

    /// Credential could not be established or decoded
    #[error("Credential failure: {0}")]
    Credential(String),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected internal failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<WatchpostError> for CollectorError {
    fn from(err: WatchpostError) -> Self {
        match err {
            WatchpostError::Database(message) | WatchpostError::NotFound(message) => {
                Self::Storage(message)
            }
            WatchpostError::Network(message) => Self::Transport(message),
            WatchpostError::Auth(message) => Self::Credential(message),
            WatchpostError::Config(message) => Self::Config(message),
            WatchpostError::InvalidInput(message) | WatchpostError::Internal(message) => {
                Self::Internal(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_collector_kinds() {
        assert!(matches!(
            CollectorError::from(WatchpostError::Database("db".into())),
            CollectorError::Storage(_)
        ));
        assert!(matches!(
            CollectorError::from(WatchpostError::Network("net".into())),
            CollectorError::Transport(_)
        ));
        assert!(matches!(
            CollectorError::from(WatchpostError::Auth("denied".into())),
            CollectorError::Credential(_)
        ));
        assert!(matches!(
            CollectorError::from(WatchpostError::Config("bad".into())),
            CollectorError::Config(_)
        ));
    }
}
