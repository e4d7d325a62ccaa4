//! Error types.

use thiserror::Error;

/// A task in a [`TaskList`](crate::TaskList) panicked with a message payload.
///
/// Collected errors are `anyhow::Error`s; downcast to this type to tell a
/// panic message apart from an error value the task panicked with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("panic: {message}")]
pub struct TaskPanic {
    message: String,
}

impl TaskPanic {
    /// Creates a panic error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The panic message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Invalid lock configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A zero timeout would fail every contended acquisition.
    #[error("lock timeout must be non-zero")]
    ZeroTimeout,
    /// An environment variable did not hold whole milliseconds.
    #[error("invalid {var} value {value:?}: expected whole milliseconds")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
    },
    /// Malformed JSON configuration.
    #[error("malformed lock configuration: {0}")]
    Json(#[from] serde_json::Error),
}
