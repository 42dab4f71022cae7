//! Task scheduler: cooperative and single-threaded
//!
//! Tasks run until they voluntarily suspend. The scheduler keeps two kinds
//! of pending work: time-delayed entries that fire once the virtual clock
//! passes their due time, and deferred entries that fire later in the same
//! tick. Both queues have an overflow buffer so tasks resumed during a tick
//! can enqueue work without disturbing the pass in progress.

mod entry;
#[allow(clippy::module_inception)]
mod scheduler;
mod task;
mod trace;

pub use scheduler::{
    Scheduler, SchedulerLimits, SchedulerStats, DEFAULT_MAX_DEFERRED_PER_TICK,
    DEFAULT_MAX_DEFER_DEPTH,
};
pub use task::{
    from_fn, Callable, Coroutine, FnCoroutine, ResumeStatus, Task, TaskContext, TaskId, TaskRef,
    TaskState,
};
pub use trace::{TaskError, TraceFrame};
