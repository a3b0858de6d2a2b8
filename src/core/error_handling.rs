//! Generic error handling utilities
//!
//! Provides the fatal/transient classification used by stage loops and a
//! unified way of logging errors with the right amount of detail.

use crate::core::logging::{log_at, Severity};
use std::error::Error;
use std::io;

/// Trait for errors that can distinguish between user-actionable and system errors
///
/// # Implementation Consistency
/// When `is_user_actionable()` returns `true`, `user_message()` should return
/// `Some(message)` with a helpful, actionable message. When it returns `false`,
/// `user_message()` should return `None`.
pub trait ContextualError: std::error::Error {
    /// Returns true if this error carries a specific message the operator can act on
    ///
    /// Examples of user-actionable errors:
    /// - Configuration file problems
    /// - Invalid server addresses
    ///
    /// Examples of system errors:
    /// - IO failures
    /// - Remote store failures
    fn is_user_actionable(&self) -> bool;

    /// Returns the specific user message if this is a user-actionable error
    fn user_message(&self) -> Option<&str>;
}

/// How a stage loop must react to an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Storage is exhausted: shut the stage down and exit the process
    Fatal,
    /// Anything else: log, back off briefly, keep going
    Transient,
}

/// Classify an error by walking its source chain for storage exhaustion
///
/// An `io::Error` anywhere in the chain whose OS code is `ENOSPC`, or whose
/// kind is `StorageFull`, makes the whole error fatal.
pub fn classify(error: &(dyn Error + 'static)) -> ErrorClass {
    let mut current: Option<&(dyn Error + 'static)> = Some(error);
    while let Some(err) = current {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            if is_storage_exhausted(io_err) {
                return ErrorClass::Fatal;
            }
        }
        current = err.source();
    }
    ErrorClass::Transient
}

/// True for the platform's "no space left on device" condition
pub fn is_storage_exhausted(error: &io::Error) -> bool {
    error.raw_os_error() == Some(libc::ENOSPC) || error.kind() == io::ErrorKind::StorageFull
}

/// Render an error and all of its sources as `outer: inner: innermost`
pub fn error_chain(error: &(dyn Error + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut current = error.source();
    while let Some(err) = current {
        rendered.push_str(": ");
        rendered.push_str(&err.to_string());
        current = err.source();
    }
    rendered
}

/// Log errors with appropriate detail level based on error specificity
///
/// - User-actionable errors show their specific message
/// - System errors show the operation context plus the error chain
/// - Debug details are always available at debug level
///
/// # Examples
/// ```rust,no_run
/// # use postfetch::core::error_handling::log_error_with_context;
/// # use postfetch::core::logging::Severity;
/// # use postfetch::queue::QueueError;
/// let err = QueueError::Full { max_size: 10 };
/// log_error_with_context(&err, "forwarding to next stage", Severity::Critical);
/// ```
pub fn log_error_with_context<E>(error: &E, operation_context: &str, severity: Severity)
where
    E: ContextualError + std::fmt::Debug + 'static,
{
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => {
            log_at(severity, format_args!("{}: {}", operation_context, user_msg));
        }
        _ => {
            log_at(
                severity,
                format_args!("{}: {}", operation_context, error_chain(error)),
            );
        }
    }
    log::debug!("DEBUG_DETAILS: {:?}", error);
}
