use std::io;

/// Error type for scheduling operations.
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Errors that can occur before or while setting up a simulation.
///
/// Every variant is detected before the stepping loop starts, so a
/// simulation either runs to completion or does not run at all.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// A task was described with a non-positive cost or a negative arrival time.
    #[error("invalid task \"{name}\": {reason}")]
    InvalidInput { name: String, reason: String },

    /// The engine was given an empty task set.
    #[error("no tasks to schedule")]
    NoTasks,

    /// The policy selector did not name one of the known policies.
    #[error("unknown scheduling policy \"{0}\" (expected fifo, sjf, stcf or rr)")]
    UnknownPolicy(String),

    /// A task spec or workload file could not be understood.
    #[error("malformed workload: {0}")]
    Workload(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SchedulerError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            name: name.to_owned(),
            reason: reason.into(),
        }
    }
}
