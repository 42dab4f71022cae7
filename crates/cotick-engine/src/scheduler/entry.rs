//! Queue entries
//!
//! An entry owns strong references to its target and originator for as long
//! as it sits in a queue; dropping the entry releases both pins.

use crate::scheduler::TaskRef;
use crate::value::Value;
use std::rc::Rc;

/// A task waiting for the virtual clock to reach `resume_at`
pub(crate) struct ScheduledEntry {
    pub target: TaskRef,
    pub originator: Option<TaskRef>,
    pub args: Vec<Value>,
    pub resume_at: f64,
    pub start: f64,
    /// Resume with the elapsed time when no explicit args were given
    pub yield_delta: bool,
    /// Tombstone set by `cancel` during a tick
    pub erase: bool,
}

impl ScheduledEntry {
    /// Arguments to resume with at virtual time `now`
    pub fn take_resume_args(&mut self, now: f64) -> Vec<Value> {
        if self.yield_delta && self.args.is_empty() {
            vec![Value::Number(now - self.start)]
        } else {
            std::mem::take(&mut self.args)
        }
    }
}

/// A task to run later in the current (or next) tick
pub(crate) struct DeferredEntry {
    pub target: TaskRef,
    pub originator: Option<TaskRef>,
    pub args: Vec<Value>,
    /// Defer chain length at the time the entry was queued
    pub depth: u32,
    pub erase: bool,
}

/// What `cancel` needs from either entry kind
pub(crate) trait QueueEntry {
    fn target(&self) -> &TaskRef;
    fn originator(&self) -> Option<&TaskRef>;
    fn is_erased(&self) -> bool;
    fn mark_erased(&mut self);

    /// Entry targets `task` or was issued by it
    fn references(&self, task: &TaskRef) -> bool {
        Rc::ptr_eq(self.target(), task)
            || self.originator().is_some_and(|from| Rc::ptr_eq(from, task))
    }
}

impl QueueEntry for ScheduledEntry {
    fn target(&self) -> &TaskRef {
        &self.target
    }

    fn originator(&self) -> Option<&TaskRef> {
        self.originator.as_ref()
    }

    fn is_erased(&self) -> bool {
        self.erase
    }

    fn mark_erased(&mut self) {
        self.erase = true;
    }
}

impl QueueEntry for DeferredEntry {
    fn target(&self) -> &TaskRef {
        &self.target
    }

    fn originator(&self) -> Option<&TaskRef> {
        self.originator.as_ref()
    }

    fn is_erased(&self) -> bool {
        self.erase
    }

    fn mark_erased(&mut self) {
        self.erase = true;
    }
}

/// Originator as passed to the resumed task: a task is never its own resumer
pub(crate) fn resumer<'a>(target: &TaskRef, originator: Option<&'a TaskRef>) -> Option<&'a TaskRef> {
    originator.filter(|from| !Rc::ptr_eq(from, target))
}
