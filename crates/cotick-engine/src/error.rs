//! Engine error types.

/// Requests the scheduler refuses synchronously.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    /// A deferral would push the defer chain past the configured ceiling
    #[error("max defer depth reached ({depth} > {limit})")]
    DeferDepthExceeded {
        /// Depth the new entry would have had
        depth: u32,
        /// Configured ceiling
        limit: u32,
    },
}

/// Errors raised by the scripting API helpers in [`crate::tasklib`].
///
/// Runtimes turn these into task failures of the calling task.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TaskLibError {
    /// The callee was neither a function nor a task
    #[error("expected function or task, got {found}")]
    NotCallable {
        /// Type name of the offending value
        found: &'static str,
    },

    /// The callee must be a task
    #[error("expected task, got {found}")]
    NotATask {
        /// Type name of the offending value
        found: &'static str,
    },

    /// A delay duration was not a number
    #[error("expected number for delay, got {found}")]
    InvalidDuration {
        /// Type name of the offending value
        found: &'static str,
    },

    /// Deferral rejected by the scheduler
    #[error("max defer depth reached")]
    DeferDepth(#[from] SchedulerError),
}
