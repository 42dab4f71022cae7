//! Script front end: source text to [`Program`]
//!
//! `lexer` → `parser` → `compiler`. Every stage reports failures as a
//! [`CompileError`] located by chunk name and line.

pub mod ast;
pub mod bytecode;
pub mod compiler;
pub mod lexer;
pub mod parser;
pub mod token;

pub use bytecode::{Builtin, Program};
pub use compiler::MAIN_FUNCTION;
pub use lexer::LexError;

use compiler::Compiler;
use parser::Parser;

/// A source file that failed to compile
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{chunk}:{line}: {message}")]
pub struct CompileError {
    /// Chunk (file) name
    pub chunk: String,
    pub line: u32,
    pub message: String,
}

impl CompileError {
    pub fn new(chunk: impl Into<String>, line: u32, message: impl Into<String>) -> Self {
        Self {
            chunk: chunk.into(),
            line,
            message: message.into(),
        }
    }

    fn from_lex(chunk: &str, err: &LexError) -> Self {
        Self::new(chunk, err.span().line, err.to_string())
    }
}

/// Compile `source`, naming it `chunk` in diagnostics.
///
/// Only the first error is reported.
pub fn compile(chunk: &str, source: &str) -> Result<Program, CompileError> {
    let tokens = lexer::tokenize(source).map_err(|errors| match errors.first() {
        Some(err) => CompileError::from_lex(chunk, err),
        None => CompileError::new(chunk, 0, "invalid source"),
    })?;
    let script = Parser::new(chunk, tokens).parse()?;
    let program = Compiler::new(chunk).compile(script)?;

    log::debug!(
        "compiled {}: {} functions, {} constants",
        chunk,
        program.functions.len(),
        program.constants.len()
    );
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_error_becomes_compile_error() {
        let err = compile("demo.tick", "let a = 1\nlet b = $\n").unwrap_err();
        assert_eq!(err.to_string(), "demo.tick:2: unexpected character '$'");
    }

    #[test]
    fn test_empty_source_compiles() {
        let program = compile("empty", "").unwrap();
        assert_eq!(program.functions.len(), 1);
        assert_eq!(program.functions[program.main].name, MAIN_FUNCTION);
    }
}
