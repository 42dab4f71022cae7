//! Cotick engine
//!
//! Cooperative, single-threaded task scheduler for script runtimes.
//!
//! A runtime hands the [`Scheduler`](scheduler::Scheduler) suspendable tasks
//! (anything implementing [`Coroutine`](scheduler::Coroutine)); the scheduler
//! resumes them immediately (`spawn`), after a virtual-time delay (`delay`),
//! or later in the current tick (`defer`), and drops every queued reference
//! when a task is cancelled or the scheduler is closed.
//!
//! The host drives everything by calling
//! [`Scheduler::update`](scheduler::Scheduler::update) once per tick until it
//! reports that no time-delayed work is left.

pub mod error;
pub mod scheduler;
pub mod tasklib;
pub mod value;

pub use error::{SchedulerError, TaskLibError};
pub use scheduler::{
    Callable, Coroutine, ResumeStatus, Scheduler, SchedulerLimits, SchedulerStats, Task,
    TaskContext, TaskError, TaskId, TaskRef, TaskState, TraceFrame,
};
pub use value::{FunctionRef, Value};
