//! Main task scheduler: work queues and the tick algorithm

use crate::error::SchedulerError;
use crate::scheduler::entry::{resumer, DeferredEntry, QueueEntry, ScheduledEntry};
use crate::scheduler::{Coroutine, ResumeStatus, Task, TaskRef};
use crate::value::Value;
use log::{debug, error, trace, warn};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// Longest chain of same-tick deferrals before `defer` refuses
pub const DEFAULT_MAX_DEFER_DEPTH: u32 = 40;

/// Deferred entries resumed per tick before the rest is carried over
pub const DEFAULT_MAX_DEFERRED_PER_TICK: usize = 100_000;

/// Scheduler statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Total tasks created through the scheduler
    pub tasks_spawned: u64,

    /// Total resumes attempted
    pub resumes: u64,

    /// Resumes that ran the task to completion
    pub tasks_completed: u64,

    /// Resumes that ended in an error
    pub tasks_failed: u64,

    /// Suspensions where yielding was not allowed
    pub yield_violations: u64,

    /// `defer` requests refused by the depth ceiling
    pub defers_rejected: u64,

    /// Calls to `cancel`
    pub cancellations: u64,
}

/// Limits enforced by the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerLimits {
    /// Maximum defer chain depth
    pub max_defer_depth: u32,

    /// Maximum deferred entries resumed in one tick
    pub max_deferred_per_tick: usize,
}

impl Default for SchedulerLimits {
    fn default() -> Self {
        Self {
            max_defer_depth: DEFAULT_MAX_DEFER_DEPTH,
            max_deferred_per_tick: DEFAULT_MAX_DEFERRED_PER_TICK,
        }
    }
}

/// Cooperative task scheduler
///
/// All methods take `&self`: tasks resumed by [`update`](Self::update) call
/// back into the scheduler while the tick is in progress. Work queued during
/// a tick goes to an overflow buffer and is merged at a safe point;
/// cancellation during a tick only marks entries as erased.
pub struct Scheduler {
    /// Virtual clock, as of the last tick
    time: Cell<f64>,

    /// Inside `update`
    updating: Cell<bool>,

    /// Time-delayed entries
    scheduled: RefCell<Vec<ScheduledEntry>>,

    /// Time-delayed entries added during a tick
    scheduled_overflow: RefCell<Vec<ScheduledEntry>>,

    /// Entries to run this tick
    deferred: RefCell<VecDeque<DeferredEntry>>,

    /// Deferred entries added during a tick
    deferred_overflow: RefCell<Vec<DeferredEntry>>,

    limits: SchedulerLimits,

    stats: RefCell<SchedulerStats>,
}

impl Scheduler {
    /// Create a scheduler with default limits
    pub fn new() -> Self {
        Self::with_limits(SchedulerLimits::default())
    }

    /// Create a scheduler with custom limits
    pub fn with_limits(limits: SchedulerLimits) -> Self {
        Self {
            time: Cell::new(0.0),
            updating: Cell::new(false),
            scheduled: RefCell::new(Vec::new()),
            scheduled_overflow: RefCell::new(Vec::new()),
            deferred: RefCell::new(VecDeque::new()),
            deferred_overflow: RefCell::new(Vec::new()),
            limits,
            stats: RefCell::new(SchedulerStats::default()),
        }
    }

    /// Allocate a new task around `body`. Nothing is queued.
    pub fn create_task(&self, name: impl Into<String>, body: Box<dyn Coroutine>) -> TaskRef {
        let task = Rc::new(Task::new(name, body));
        self.record(|s| s.tasks_spawned += 1);
        trace!("created task {} ({})", task.id().as_u64(), task.name());
        task
    }

    /// Resume `task` immediately with `args`.
    ///
    /// Failures and forbidden suspensions are reported here and never
    /// propagate further than the returned status.
    pub fn spawn(
        &self,
        task: &TaskRef,
        originator: Option<&TaskRef>,
        args: Vec<Value>,
        can_yield: bool,
    ) -> ResumeStatus {
        self.record(|s| s.resumes += 1);
        let status = task.resume(self, originator, args);

        match &status {
            ResumeStatus::Completed => self.record(|s| s.tasks_completed += 1),
            ResumeStatus::Suspended if can_yield => {}
            ResumeStatus::Suspended => {
                self.record(|s| s.yield_violations += 1);
                error!(
                    "task {} ({}) cannot yield here",
                    task.id().as_u64(),
                    task.name()
                );
            }
            ResumeStatus::Failed(err) => {
                self.record(|s| s.tasks_failed += 1);
                error!("{}", err.render());
            }
        }

        status
    }

    /// Queue `task` to resume once the clock reaches `time + delay_time`.
    ///
    /// With `yield_delta` and no `args`, the task is resumed with the
    /// elapsed virtual time instead.
    pub fn delay(
        &self,
        task: TaskRef,
        originator: Option<TaskRef>,
        args: Vec<Value>,
        delay_time: f64,
        yield_delta: bool,
    ) {
        let now = self.time.get();
        let entry = ScheduledEntry {
            target: task,
            originator,
            args,
            resume_at: now + delay_time,
            start: now,
            yield_delta,
            erase: false,
        };
        debug!(
            "delay task {} until {} (yield_delta={})",
            entry.target.id().as_u64(),
            entry.resume_at,
            yield_delta
        );

        if self.updating.get() {
            self.scheduled_overflow.borrow_mut().push(entry);
        } else {
            self.scheduled.borrow_mut().push(entry);
        }
    }

    /// Queue `task` to run later in the current tick, or in the next one
    /// when called outside a tick.
    ///
    /// Refuses when the chain of deferrals leading here is already
    /// `max_defer_depth` long; nothing is pinned in that case.
    pub fn defer(
        &self,
        task: TaskRef,
        originator: Option<TaskRef>,
        args: Vec<Value>,
    ) -> Result<(), SchedulerError> {
        let depth = 1 + originator.as_ref().map_or(0, |from| from.defer_depth());
        let limit = self.limits.max_defer_depth;
        if depth > limit {
            self.record(|s| s.defers_rejected += 1);
            debug!(
                "rejected defer of task {}: depth {} > {}",
                task.id().as_u64(),
                depth,
                limit
            );
            return Err(SchedulerError::DeferDepthExceeded { depth, limit });
        }

        debug!("defer task {} at depth {}", task.id().as_u64(), depth);
        let entry = DeferredEntry {
            target: task,
            originator,
            args,
            depth,
            erase: false,
        };

        if self.updating.get() {
            self.deferred_overflow.borrow_mut().push(entry);
        } else {
            self.deferred.borrow_mut().push_back(entry);
        }
        Ok(())
    }

    /// Reset `task` and drop every queued entry it targets or issued.
    ///
    /// During a tick, entries in the queues being walked are only marked
    /// erased and released when the tick reaches them.
    pub fn cancel(&self, task: &TaskRef) {
        task.reset();
        self.record(|s| s.cancellations += 1);

        let soft = self.updating.get();
        let mut removed = 0;
        removed += if soft {
            tombstone(self.scheduled.borrow_mut().iter_mut(), task)
        } else {
            sweep_vec(&self.scheduled, task)
        };
        removed += if soft {
            tombstone(self.deferred.borrow_mut().iter_mut(), task)
        } else {
            sweep_deque(&self.deferred, task)
        };
        // Overflow buffers are never walked, so removal there is always physical
        removed += sweep_vec(&self.scheduled_overflow, task);
        removed += sweep_vec(&self.deferred_overflow, task);

        debug!(
            "cancel task {}: {} entries {}",
            task.id().as_u64(),
            removed,
            if soft { "marked" } else { "removed" }
        );
    }

    /// Run one tick at virtual time `now`.
    ///
    /// Returns whether time-delayed work is still pending (or deferred work
    /// was carried over), i.e. whether the host should keep ticking.
    pub fn update(&self, now: f64, dt: f64) -> bool {
        if self.updating.get() {
            debug_assert!(false, "Scheduler::update re-entered from a task");
            error!("Scheduler::update called during a tick; ignored");
            return true;
        }

        self.updating.set(true);
        self.time.set(now);
        trace!("tick now={} dt={}", now, dt);

        self.run_scheduled(now);
        self.merge_scheduled_overflow();

        self.run_deferred();

        // Delays issued by deferred tasks become visible next tick as well
        self.merge_scheduled_overflow();
        let reaped: Vec<ScheduledEntry> = {
            let mut queue = self.scheduled.borrow_mut();
            let (erased, kept) = std::mem::take(&mut *queue)
                .into_iter()
                .partition(|entry| entry.erase);
            *queue = kept;
            erased
        };
        drop(reaped);

        self.updating.set(false);
        debug_assert!(self.deferred_overflow.borrow().is_empty());

        self.has_pending_work()
    }

    /// Walk the scheduled queue, resuming due entries and dropping
    /// tombstones. Not-yet-due entries keep their order.
    fn run_scheduled(&self, now: f64) {
        let mut index = 0;
        loop {
            let mut entry = {
                let mut queue = self.scheduled.borrow_mut();
                match queue.get(index) {
                    None => break,
                    Some(entry) if entry.erase || now >= entry.resume_at => {}
                    Some(_) => {
                        index += 1;
                        continue;
                    }
                }
                queue.remove(index)
            };

            if entry.erase {
                continue;
            }

            let args = entry.take_resume_args(now);
            let from = resumer(&entry.target, entry.originator.as_ref());
            self.spawn(&entry.target, from, args, true);
        }
    }

    /// Drain the deferred queue front to back, including entries deferred by
    /// the tasks it resumes.
    fn run_deferred(&self) {
        let mut budget = self.limits.max_deferred_per_tick;
        loop {
            // Defers issued by scheduled tasks or the previous entry
            self.merge_deferred_overflow();
            let next = self.deferred.borrow_mut().pop_front();
            let Some(mut entry) = next else {
                break;
            };

            if !entry.erase {
                if budget == 0 {
                    let carried = self.deferred.borrow().len() + 1;
                    warn!(
                        "deferred budget of {} exhausted; carrying {} entries to the next tick",
                        self.limits.max_deferred_per_tick, carried
                    );
                    self.deferred.borrow_mut().push_front(entry);
                    break;
                }
                budget -= 1;

                let args = std::mem::take(&mut entry.args);
                let from = resumer(&entry.target, entry.originator.as_ref());
                entry.target.set_defer_depth(entry.depth);
                self.spawn(&entry.target, from, args, true);
                entry.target.set_defer_depth(0);
            }

            drop(entry);
        }
    }

    fn merge_scheduled_overflow(&self) {
        let pending = std::mem::take(&mut *self.scheduled_overflow.borrow_mut());
        if !pending.is_empty() {
            self.scheduled.borrow_mut().extend(pending);
        }
    }

    fn merge_deferred_overflow(&self) {
        let pending = std::mem::take(&mut *self.deferred_overflow.borrow_mut());
        if !pending.is_empty() {
            self.deferred.borrow_mut().extend(pending);
        }
    }

    /// Release every queued entry. Returns how many entries were dropped.
    pub fn close(&self) -> usize {
        debug_assert!(!self.updating.get(), "Scheduler::close called during a tick");

        let scheduled = std::mem::take(&mut *self.scheduled.borrow_mut());
        let scheduled_overflow = std::mem::take(&mut *self.scheduled_overflow.borrow_mut());
        let deferred = std::mem::take(&mut *self.deferred.borrow_mut());
        let deferred_overflow = std::mem::take(&mut *self.deferred_overflow.borrow_mut());

        let released =
            scheduled.len() + scheduled_overflow.len() + deferred.len() + deferred_overflow.len();
        if released > 0 {
            debug!("scheduler closed with {} pending entries", released);
        }
        released
    }

    /// Whether another tick has anything to do
    pub fn has_pending_work(&self) -> bool {
        !self.scheduled.borrow().is_empty()
            || !self.scheduled_overflow.borrow().is_empty()
            || !self.deferred.borrow().is_empty()
    }

    /// Virtual time of the current (or last) tick
    pub fn time(&self) -> f64 {
        self.time.get()
    }

    /// Whether a tick is in progress
    pub fn is_updating(&self) -> bool {
        self.updating.get()
    }

    /// Number of time-delayed entries, including those added this tick
    pub fn scheduled_len(&self) -> usize {
        self.scheduled.borrow().len() + self.scheduled_overflow.borrow().len()
    }

    /// Number of deferred entries, including those added this tick
    pub fn deferred_len(&self) -> usize {
        self.deferred.borrow().len() + self.deferred_overflow.borrow().len()
    }

    pub fn limits(&self) -> &SchedulerLimits {
        &self.limits
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> SchedulerStats {
        self.stats.borrow().clone()
    }

    fn record(&self, update: impl FnOnce(&mut SchedulerStats)) {
        update(&mut self.stats.borrow_mut());
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Mark matching entries as erased; returns how many were newly marked
fn tombstone<'a, E: QueueEntry + 'a>(
    entries: impl Iterator<Item = &'a mut E>,
    task: &TaskRef,
) -> usize {
    let mut marked = 0;
    for entry in entries {
        if !entry.is_erased() && entry.references(task) {
            entry.mark_erased();
            marked += 1;
        }
    }
    marked
}

fn sweep_vec<E: QueueEntry>(queue: &RefCell<Vec<E>>, task: &TaskRef) -> usize {
    let removed: Vec<E> = {
        let mut queue = queue.borrow_mut();
        let (removed, kept) = std::mem::take(&mut *queue)
            .into_iter()
            .partition(|entry| entry.references(task));
        *queue = kept;
        removed
    };
    removed.len()
}

fn sweep_deque<E: QueueEntry>(queue: &RefCell<VecDeque<E>>, task: &TaskRef) -> usize {
    let removed: Vec<E> = {
        let mut queue = queue.borrow_mut();
        let (removed, kept): (Vec<E>, Vec<E>) = std::mem::take(&mut *queue)
            .into_iter()
            .partition(|entry| entry.references(task));
        *queue = kept.into();
        removed
    };
    removed.len()
}
