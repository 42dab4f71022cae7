//! Scripting API shared by runtimes
//!
//! These helpers implement the `spawn`, `delay`, `defer`, `wait` and
//! `cancel` builtins on top of [`Scheduler`](crate::scheduler::Scheduler).
//! The calling task is always the originator of the work it queues.
//!
//! A runtime maps each builtin call to one function here and turns a
//! [`TaskLibError`] into a failure of the calling task.

use crate::error::TaskLibError;
use crate::scheduler::{TaskContext, TaskRef};
use crate::value::Value;

/// Task to run for `callee`: a fresh task for a function, the task itself
/// for a task handle.
fn prepare(cx: &TaskContext<'_>, callee: &Value) -> Result<TaskRef, TaskLibError> {
    match callee {
        Value::Task(task) => Ok(task.clone()),
        Value::Function(function) => Ok(cx
            .scheduler()
            .create_task(function.name(), function.instantiate())),
        other => Err(TaskLibError::NotCallable {
            found: other.type_name(),
        }),
    }
}

/// Seconds from a script value. NaN counts as zero so it cannot park an
/// entry forever.
fn duration(value: &Value) -> Result<f64, TaskLibError> {
    match value.as_number() {
        Some(seconds) if seconds.is_nan() => Ok(0.0),
        Some(seconds) => Ok(seconds),
        None => Err(TaskLibError::InvalidDuration {
            found: value.type_name(),
        }),
    }
}

/// `spawn(fn_or_task, ...args)`: resume right away, return the task
pub fn spawn(
    cx: &TaskContext<'_>,
    callee: &Value,
    args: Vec<Value>,
) -> Result<TaskRef, TaskLibError> {
    let task = prepare(cx, callee)?;
    cx.scheduler().spawn(&task, Some(cx.task()), args, true);
    Ok(task)
}

/// `delay(seconds, fn_or_task, ...args)`: resume once `seconds` of virtual
/// time have passed
pub fn delay(
    cx: &TaskContext<'_>,
    seconds: &Value,
    callee: &Value,
    args: Vec<Value>,
) -> Result<TaskRef, TaskLibError> {
    let seconds = duration(seconds)?;
    let task = prepare(cx, callee)?;
    cx.scheduler()
        .delay(task.clone(), Some(cx.task().clone()), args, seconds, false);
    Ok(task)
}

/// `defer(fn_or_task, ...args)`: resume later in the current tick
pub fn defer(
    cx: &TaskContext<'_>,
    callee: &Value,
    args: Vec<Value>,
) -> Result<TaskRef, TaskLibError> {
    let task = prepare(cx, callee)?;
    cx.scheduler()
        .defer(task.clone(), Some(cx.task().clone()), args)?;
    Ok(task)
}

/// `wait(seconds?)`: queue the calling task to resume with the elapsed
/// virtual time. The caller must suspend right after this returns.
pub fn wait(cx: &TaskContext<'_>, seconds: &Value) -> Result<(), TaskLibError> {
    let seconds = if seconds.is_nil() {
        0.0
    } else {
        duration(seconds)?
    };
    let me = cx.task().clone();
    cx.scheduler().delay(me.clone(), Some(me), vec![], seconds, true);
    Ok(())
}

/// `cancel(task)`
pub fn cancel(cx: &TaskContext<'_>, target: &Value) -> Result<(), TaskLibError> {
    let task = target.as_task().ok_or(TaskLibError::NotATask {
        found: target.type_name(),
    })?;
    cx.scheduler().cancel(task);
    Ok(())
}
