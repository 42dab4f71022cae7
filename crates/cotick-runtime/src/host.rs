//! Host loop: drives scheduler ticks from a clock.

use crate::{Runtime, RuntimeOptions};
use log::{debug, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// How a host loop run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The scheduler ran out of work
    Completed,
    /// The stop flag was raised first
    Interrupted,
}

/// Calls `update` once per tick interval until no work is left
#[derive(Debug, Clone)]
pub struct HostLoop {
    tick_interval: Duration,
}

impl HostLoop {
    pub fn new(tick_interval: Duration) -> Self {
        Self { tick_interval }
    }

    pub fn from_options(options: &RuntimeOptions) -> Self {
        Self::new(options.tick_interval)
    }

    /// Run against the monotonic clock, counting seconds from now
    pub fn run(&self, runtime: &Runtime, stop: &AtomicBool) -> RunOutcome {
        let started = Instant::now();
        self.run_with_clock(runtime, stop, || started.elapsed().as_secs_f64())
    }

    /// Run with `clock` as the source of virtual time. The clock must not go
    /// backwards.
    pub fn run_with_clock(
        &self,
        runtime: &Runtime,
        stop: &AtomicBool,
        mut clock: impl FnMut() -> f64,
    ) -> RunOutcome {
        let scheduler = runtime.scheduler();
        let mut last = scheduler.time();
        let mut ticks: u64 = 0;

        loop {
            if stop.load(Ordering::SeqCst) {
                info!("stop requested after {} ticks", ticks);
                return RunOutcome::Interrupted;
            }

            let now = clock().max(last);
            let dt = now - last;
            last = now;
            ticks += 1;

            if !scheduler.update(now, dt) {
                debug!("no pending work after {} ticks", ticks);
                return RunOutcome::Completed;
            }

            if !self.tick_interval.is_zero() {
                std::thread::sleep(self.tick_interval);
            }
        }
    }
}

impl Default for HostLoop {
    fn default() -> Self {
        Self::from_options(&RuntimeOptions::default())
    }
}
