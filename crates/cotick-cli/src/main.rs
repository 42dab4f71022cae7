//! Cotick command-line runner
//!
//! Loads a script, drives the scheduler until the script has no pending work
//! (or Ctrl+C is pressed), then runs exit callbacks.

mod commands;
mod signal;

use clap::{Parser, Subcommand};
use cotick_engine::scheduler::DEFAULT_MAX_DEFER_DEPTH;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cotick")]
#[command(about = "Cooperative task scripting runtime", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script file
    Run {
        /// Script to run
        file: PathBuf,
        /// Milliseconds to sleep between ticks
        #[arg(long, default_value_t = 1)]
        tick_ms: u64,
        /// Maximum nesting of deferred calls
        #[arg(long, default_value_t = DEFAULT_MAX_DEFER_DEPTH)]
        max_defer_depth: u32,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .try_init()
        .ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help and --version are not failures
            let code = if err.use_stderr() { 1 } else { 0 };
            err.print()?;
            std::process::exit(code);
        }
    };

    let code = match cli.command {
        Commands::Run {
            file,
            tick_ms,
            max_defer_depth,
        } => commands::run::execute(commands::run::RunArgs {
            file,
            tick_ms,
            max_defer_depth,
        })?,
        Commands::Version => commands::version::execute()?,
    };

    std::process::exit(code);
}
