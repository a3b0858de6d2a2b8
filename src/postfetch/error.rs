//! Postfetch Error Types

use crate::core::error_handling::ContextualError;
use crate::queue::QueueError;
use crate::stats::StatsError;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum PostfetchError {
    #[error("Queue operation failed")]
    Queue(#[from] QueueError),

    #[error("Statistics store failed")]
    Stats(#[from] StatsError),

    #[error("I/O failure")]
    Io(#[from] io::Error),

    #[error("Listener '{listener}' failed")]
    Listener {
        listener: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Processing failed: {message}")]
    Processing { message: String },

    #[error("Failed to spawn thread for stage '{stage}'")]
    Spawn {
        stage: String,
        #[source]
        source: io::Error,
    },
}

impl PostfetchError {
    /// Wrap an arbitrary listener failure, keeping it as the error source
    pub fn listener<E>(listener: impl Into<String>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        PostfetchError::Listener {
            listener: listener.into(),
            source: source.into(),
        }
    }
}

impl ContextualError for PostfetchError {
    fn is_user_actionable(&self) -> bool {
        match self {
            PostfetchError::Stats(inner) => inner.is_user_actionable(),
            _ => false,
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            PostfetchError::Stats(inner) => inner.user_message(),
            _ => None,
        }
    }
}

/// Result type for postfetch operations
pub type PostfetchResult<T> = Result<T, PostfetchError>;
