//! Error types for the quadcopter task.

use thiserror::Error;

/// Errors surfaced by the task and its simulator collaborators.
///
/// The reward arithmetic never produces one of these; degenerate numeric
/// cases are returned as non-finite rewards instead.
#[derive(Debug, Error)]
pub enum TaskError {
    /// Invalid task or simulator configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Wrong number of rotor commands.
    #[error("invalid action: expected {expected} rotor commands, got {actual}")]
    InvalidAction {
        /// Number of actuators the task drives.
        expected: usize,
        /// Number of commands received.
        actual: usize,
    },

    /// The simulator collaborator failed.
    #[error("simulator error: {0}")]
    Simulator(String),

    /// Reading or writing a configuration file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration YAML could not be (de)serialized.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl TaskError {
    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Creates an invalid action error.
    #[must_use]
    pub const fn invalid_action(expected: usize, actual: usize) -> Self {
        Self::InvalidAction { expected, actual }
    }

    /// Creates a simulator error.
    #[must_use]
    pub fn simulator(reason: impl Into<String>) -> Self {
        Self::Simulator(reason.into())
    }
}

/// Result type for task operations.
pub type Result<T> = std::result::Result<T, TaskError>;
