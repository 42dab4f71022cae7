//! Runtime error types.

use crate::script::CompileError;
use std::path::PathBuf;

/// Errors that can occur while loading a script
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Script file could not be read
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Lexing, parsing or compilation failed
    #[error("{0}")]
    Compile(#[from] CompileError),
}
