//! Task structure and execution state

use crate::scheduler::{Scheduler, TaskError};
use crate::value::Value;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a Task
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

impl TaskId {
    /// Generate a new unique TaskId
    pub fn new() -> Self {
        TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the numeric ID value
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

/// State of a Task, as seen by the scheduler
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TaskState {
    /// Just created, never resumed
    Created,
    /// Currently executing
    Running,
    /// Voluntarily yielded; may be resumed again
    Suspended,
    /// Ran to completion
    Completed,
    /// Raised an error
    Failed,
    /// Execution state was reset by `cancel`
    Cancelled,
}

impl TaskState {
    /// A dead task can never be resumed again
    pub fn is_dead(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Cancelled
        )
    }
}

/// Outcome of resuming a task once
#[derive(Debug, Clone, PartialEq)]
pub enum ResumeStatus {
    /// Ran to the end or returned
    Completed,
    /// Yielded control back to the resumer
    Suspended,
    /// Raised an error
    Failed(TaskError),
}

impl ResumeStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, ResumeStatus::Completed)
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self, ResumeStatus::Suspended)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ResumeStatus::Failed(_))
    }

    /// Error carried by a failed resume
    pub fn error(&self) -> Option<&TaskError> {
        match self {
            ResumeStatus::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// A suspendable unit of execution supplied by a runtime.
///
/// `resume` runs the body until it finishes, fails, or yields. The first
/// resume receives the task's arguments; later resumes receive whatever the
/// resumer passes (for `wait`, the elapsed time).
pub trait Coroutine {
    fn resume(&mut self, cx: &TaskContext<'_>, args: Vec<Value>) -> ResumeStatus;

    /// Discard any suspended execution state
    fn reset(&mut self) {}
}

/// Something new tasks can be created from (a script function, a closure)
pub trait Callable {
    fn name(&self) -> &str;

    fn instantiate(&self) -> Box<dyn Coroutine>;
}

/// Shared handle to a task. Queue entries hold one of these as their pin.
pub type TaskRef = Rc<Task>;

/// What a running task can see of its surroundings
pub struct TaskContext<'a> {
    scheduler: &'a Scheduler,
    task: &'a TaskRef,
    originator: Option<&'a TaskRef>,
}

impl<'a> TaskContext<'a> {
    /// The scheduler resuming this task
    pub fn scheduler(&self) -> &'a Scheduler {
        self.scheduler
    }

    /// Handle of the running task itself
    pub fn task(&self) -> &'a TaskRef {
        self.task
    }

    /// Task that requested this resume, if any
    pub fn originator(&self) -> Option<&'a TaskRef> {
        self.originator
    }

    /// Current virtual time
    pub fn now(&self) -> f64 {
        self.scheduler.time()
    }
}

/// A suspendable task plus the metadata the scheduler keeps for it
pub struct Task {
    /// Unique identifier
    id: TaskId,

    /// Name for diagnostics (usually the function it was created from)
    name: String,

    /// Current state
    state: Cell<TaskState>,

    /// Length of the same-tick defer chain that produced this task's entry
    defer_depth: Cell<u32>,

    /// `cancel` arrived while the task was running
    cancel_requested: Cell<bool>,

    /// The coroutine itself; mutably borrowed for the duration of a resume
    body: RefCell<Box<dyn Coroutine>>,
}

impl Task {
    pub(crate) fn new(name: impl Into<String>, body: Box<dyn Coroutine>) -> Self {
        Self {
            id: TaskId::new(),
            name: name.into(),
            state: Cell::new(TaskState::Created),
            defer_depth: Cell::new(0),
            cancel_requested: Cell::new(false),
            body: RefCell::new(body),
        }
    }

    /// Get the Task's unique ID
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the current state
    pub fn state(&self) -> TaskState {
        self.state.get()
    }

    pub fn defer_depth(&self) -> u32 {
        self.defer_depth.get()
    }

    pub fn set_defer_depth(&self, depth: u32) {
        self.defer_depth.set(depth);
    }

    /// Cancelled, or cancellation pending until the current resume returns
    pub fn is_cancelled(&self) -> bool {
        self.cancel_requested.get() || self.state.get() == TaskState::Cancelled
    }

    /// Run the body once. Handles dead and re-entrant resumes.
    pub(crate) fn resume(
        self: &Rc<Self>,
        scheduler: &Scheduler,
        originator: Option<&TaskRef>,
        args: Vec<Value>,
    ) -> ResumeStatus {
        if self.state.get().is_dead() {
            return ResumeStatus::Failed(TaskError::new("cannot resume dead task"));
        }

        let Ok(mut body) = self.body.try_borrow_mut() else {
            return ResumeStatus::Failed(TaskError::new("cannot resume non-suspended task"));
        };

        self.state.set(TaskState::Running);
        let cx = TaskContext {
            scheduler,
            task: self,
            originator,
        };
        let status = body.resume(&cx, args);

        self.state.set(match &status {
            ResumeStatus::Completed => TaskState::Completed,
            ResumeStatus::Suspended => TaskState::Suspended,
            ResumeStatus::Failed(_) => TaskState::Failed,
        });

        if self.cancel_requested.replace(false) {
            body.reset();
            if self.state.get() == TaskState::Suspended {
                self.state.set(TaskState::Cancelled);
            }
        }

        status
    }

    /// Invalidate suspended execution state. A running task is reset as soon
    /// as its current resume returns.
    pub(crate) fn reset(&self) {
        match self.body.try_borrow_mut() {
            Ok(mut body) => {
                body.reset();
                if !matches!(self.state.get(), TaskState::Completed | TaskState::Failed) {
                    self.state.set(TaskState::Cancelled);
                }
            }
            Err(_) => self.cancel_requested.set(true),
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id.as_u64())
            .field("name", &self.name)
            .field("state", &self.state.get())
            .field("defer_depth", &self.defer_depth.get())
            .finish()
    }
}

/// Coroutine backed by a closure; each resume calls the closure once.
pub struct FnCoroutine<F> {
    f: F,
}

/// Wrap a closure as a [`Coroutine`]
pub fn from_fn<F>(f: F) -> FnCoroutine<F>
where
    F: FnMut(&TaskContext<'_>, Vec<Value>) -> ResumeStatus,
{
    FnCoroutine { f }
}

impl<F> Coroutine for FnCoroutine<F>
where
    F: FnMut(&TaskContext<'_>, Vec<Value>) -> ResumeStatus,
{
    fn resume(&mut self, cx: &TaskContext<'_>, args: Vec<Value>) -> ResumeStatus {
        (self.f)(cx, args)
    }
}
