//! `cotick run`: execute a script until it has no work left.

use crate::signal;
use cotick_engine::SchedulerLimits;
use cotick_runtime::{HostLoop, RunOutcome, Runtime, RuntimeOptions};
use log::{info, warn};
use std::path::PathBuf;
use std::time::Duration;

pub struct RunArgs {
    pub file: PathBuf,
    pub tick_ms: u64,
    pub max_defer_depth: u32,
}

impl RunArgs {
    fn options(&self) -> RuntimeOptions {
        RuntimeOptions {
            tick_interval: Duration::from_millis(self.tick_ms),
            limits: SchedulerLimits {
                max_defer_depth: self.max_defer_depth,
                ..SchedulerLimits::default()
            },
        }
    }
}

/// Returns the process exit code: 0 when the script ran out of work, 1 when
/// loading failed or the run was interrupted.
pub fn execute(args: RunArgs) -> anyhow::Result<i32> {
    let runtime = Runtime::new(args.options());

    if let Err(err) = runtime.load_file(&args.file) {
        eprintln!("error: {}", err);
        return Ok(1);
    }

    if !signal::install() {
        warn!("could not install SIGINT handler; Ctrl+C will terminate immediately");
    }

    let outcome = HostLoop::from_options(runtime.options()).run(&runtime, signal::stop_flag());
    let released = runtime.shutdown();
    info!(
        "{} finished: {:?}, {} pending entries released",
        args.file.display(),
        outcome,
        released
    );

    Ok(match outcome {
        RunOutcome::Completed => 0,
        RunOutcome::Interrupted => 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(file: PathBuf) -> RunArgs {
        RunArgs {
            file,
            tick_ms: 0,
            max_defer_depth: 40,
        }
    }

    #[test]
    fn test_missing_file_exits_with_one() {
        let dir = tempfile::tempdir().unwrap();
        let code = execute(args(dir.path().join("nope.ct"))).unwrap();
        assert_eq!(code, 1);
    }

    #[test]
    fn test_compile_error_exits_with_one() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "let = 2").unwrap();
        assert_eq!(execute(args(file.path().to_path_buf())).unwrap(), 1);
    }

    #[test]
    fn test_script_runs_to_completion() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "wait(0.001)").unwrap();
        assert_eq!(execute(args(file.path().to_path_buf())).unwrap(), 0);
    }

    #[test]
    fn test_options_carry_limits() {
        let options = RunArgs {
            file: PathBuf::from("x.ct"),
            tick_ms: 5,
            max_defer_depth: 7,
        }
        .options();
        assert_eq!(options.tick_interval, Duration::from_millis(5));
        assert_eq!(options.limits.max_defer_depth, 7);
        assert_eq!(options.limits.max_deferred_per_tick, 100_000);
    }
}
