//! Cotick Runtime
//!
//! Binds the scheduler from `cotick-engine` to the script language: compiles
//! source files, runs their top-level code as tasks and drives ticks from a
//! host loop until no work is left.

pub mod environment;
pub mod error;
pub mod host;
pub mod interp;
pub mod loader;
pub mod script;

pub use environment::{Environment, OutputBuffer};
pub use error::RuntimeError;
pub use host::{HostLoop, RunOutcome};
pub use interp::{ScriptFunction, ScriptTask, MAX_CALL_DEPTH};
pub use script::{compile, CompileError, Program};

use cotick_engine::scheduler::{Callable, Scheduler, SchedulerLimits, TaskRef};
use log::{debug, info};
use std::cell::Cell;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Sleep between host loop ticks
    pub tick_interval: Duration,
    pub limits: SchedulerLimits,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(1),
            limits: SchedulerLimits::default(),
        }
    }
}

/// A scheduler plus the host environment its script tasks share
pub struct Runtime {
    options: RuntimeOptions,
    scheduler: Scheduler,
    env: Rc<Environment>,
    shut_down: Cell<bool>,
}

impl Runtime {
    /// Runtime printing to stdout
    pub fn new(options: RuntimeOptions) -> Self {
        Self::with_environment(options, Environment::stdout())
    }

    /// Runtime printing to `output`
    pub fn with_output(options: RuntimeOptions, output: Box<dyn Write>) -> Self {
        Self::with_environment(options, Environment::new(output))
    }

    fn with_environment(options: RuntimeOptions, env: Environment) -> Self {
        Self {
            scheduler: Scheduler::with_limits(options.limits.clone()),
            options,
            env: Rc::new(env),
            shut_down: Cell::new(false),
        }
    }

    /// Compile and start the script at `path`
    pub fn load_file(&self, path: &Path) -> Result<TaskRef, RuntimeError> {
        let source = loader::read_source(path)?;
        self.load_source(&loader::chunk_name(path), &source)
    }

    /// Compile `source` and run its top-level code as a new task. The task
    /// runs until its first suspension before this returns.
    pub fn load_source(&self, chunk: &str, source: &str) -> Result<TaskRef, RuntimeError> {
        let program = Rc::new(compile(chunk, source)?);
        let main = ScriptFunction::main(program, self.env.clone());
        let task = self.scheduler.create_task(main.name(), main.instantiate());

        debug!("starting {} as task {}", chunk, task.id().as_u64());
        self.scheduler.spawn(&task, None, Vec::new(), true);
        Ok(task)
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    /// Run every exit callback once, then tear down the scheduler. Returns
    /// the number of queue entries released. Later calls do nothing.
    pub fn shutdown(&self) -> usize {
        if self.shut_down.replace(true) {
            return 0;
        }

        let callbacks = self.env.take_exit_callbacks();
        if !callbacks.is_empty() {
            info!("running {} exit callback(s)", callbacks.len());
        }
        for callback in callbacks {
            let task = self
                .scheduler
                .create_task(callback.name(), callback.instantiate());
            self.scheduler.spawn(&task, None, Vec::new(), false);
        }

        self.scheduler.close()
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.shutdown();
    }
}
