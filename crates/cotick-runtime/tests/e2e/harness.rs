//! Test harness for end-to-end execution
//!
//! Scripts print into an in-memory buffer. Virtual time advances by a fixed
//! step per tick, so timing-dependent output is deterministic.

use cotick_runtime::{HostLoop, OutputBuffer, RunOutcome, Runtime, RuntimeOptions};
use cotick_engine::SchedulerLimits;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

/// Virtual seconds added per tick
pub const STEP: f64 = 0.25;

/// Upper bound on ticks before a script is considered stuck
const MAX_TICKS: u32 = 10_000;

/// Result of running a script to completion
pub struct Run {
    pub runtime: Runtime,
    pub output: OutputBuffer,
    pub outcome: RunOutcome,
}

impl Run {
    pub fn stdout(&self) -> String {
        self.output.contents()
    }

    pub fn failures(&self) -> u64 {
        self.runtime.scheduler().stats().tasks_failed
    }
}

fn options(limits: SchedulerLimits) -> RuntimeOptions {
    RuntimeOptions {
        tick_interval: Duration::ZERO,
        limits,
    }
}

/// Load `source`, tick until idle, then shut down
pub fn run_with_limits(source: &str, limits: SchedulerLimits) -> Run {
    let output = OutputBuffer::new();
    let runtime = Runtime::with_output(options(limits), Box::new(output.clone()));
    runtime
        .load_source("test", source)
        .unwrap_or_else(|err| panic!("compile failed: {}", err));

    let mut now = 0.0;
    let mut ticks = 0;
    let outcome = HostLoop::new(Duration::ZERO).run_with_clock(
        &runtime,
        &AtomicBool::new(false),
        || {
            ticks += 1;
            assert!(ticks < MAX_TICKS, "script did not finish");
            now += STEP;
            now
        },
    );
    runtime.shutdown();

    Run {
        runtime,
        output,
        outcome,
    }
}

pub fn run(source: &str) -> Run {
    run_with_limits(source, SchedulerLimits::default())
}

/// Run `source` and compare everything it printed
pub fn expect_output(source: &str, expected: &str) {
    let run = run(source);
    assert_eq!(run.outcome, RunOutcome::Completed);
    assert_eq!(run.stdout(), expected);
}

/// Compile `source`, expecting a compile error
pub fn compile_error(source: &str) -> String {
    let runtime = Runtime::with_output(
        options(SchedulerLimits::default()),
        Box::new(OutputBuffer::new()),
    );
    match runtime.load_source("test", source) {
        Ok(_) => panic!("expected a compile error"),
        Err(err) => err.to_string(),
    }
}
