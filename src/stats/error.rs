//! Statistics Error Types

use crate::core::error_handling::ContextualError;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("Statistics I/O failed")]
    Io(#[from] io::Error),

    #[error("Local statistics database error")]
    Sqlite(#[source] rusqlite::Error),

    #[error("Malformed statistics record for bucket '{bucket}'")]
    Serialization {
        bucket: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Statistics server reported {kind}: {message}")]
    Remote { kind: String, message: String },

    #[error("Statistics protocol violation: {message}")]
    Protocol { message: String },

    #[error("Unexpected write result {summary} saving bucket '{bucket}'")]
    UnexpectedWrite { bucket: String, summary: String },

    #[error("Invalid statistics server address '{address}': {message}")]
    InvalidServer { address: String, message: String },

    #[error("Statistics store lock poisoned: {message}")]
    Poisoned { message: String },

    #[error("Statistics store is closed")]
    Closed,
}

impl From<rusqlite::Error> for StatsError {
    /// SQLite reports a full disk through its own error code; surface it as
    /// `StorageFull` so that it is recognised as storage exhaustion.
    fn from(error: rusqlite::Error) -> Self {
        match error.sqlite_error_code() {
            Some(rusqlite::ErrorCode::DiskFull) => StatsError::Io(io::Error::new(
                io::ErrorKind::StorageFull,
                error,
            )),
            _ => StatsError::Sqlite(error),
        }
    }
}

impl StatsError {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        StatsError::Protocol {
            message: message.into(),
        }
    }
}

impl ContextualError for StatsError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, StatsError::InvalidServer { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            StatsError::InvalidServer { message, .. } => Some(message),
            _ => None,
        }
    }
}

/// Result type for statistics operations
pub type StatsResult<T> = Result<T, StatsError>;
