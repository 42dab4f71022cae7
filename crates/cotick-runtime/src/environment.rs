//! Host state shared by every task of a runtime

use cotick_engine::FunctionRef;
use log::warn;
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

/// Output sink and exit-callback registry
pub struct Environment {
    output: RefCell<Box<dyn Write>>,
    exit_callbacks: RefCell<Vec<FunctionRef>>,
}

impl Environment {
    pub fn new(output: Box<dyn Write>) -> Self {
        Self {
            output: RefCell::new(output),
            exit_callbacks: RefCell::new(Vec::new()),
        }
    }

    /// Environment printing to the process's stdout
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Write one line of script output. Write errors are logged, never
    /// raised into the script.
    pub fn print(&self, line: &str) {
        let mut output = self.output.borrow_mut();
        if let Err(err) = writeln!(output, "{}", line).and_then(|()| output.flush()) {
            warn!("failed to write script output: {}", err);
        }
    }

    /// Register `callback` to run once at shutdown
    pub fn on_exit(&self, callback: FunctionRef) {
        self.exit_callbacks.borrow_mut().push(callback);
    }

    /// Remove and return every registered callback, in registration order
    pub fn take_exit_callbacks(&self) -> Vec<FunctionRef> {
        std::mem::take(&mut *self.exit_callbacks.borrow_mut())
    }
}

/// In-memory output sink; clones share the same buffer
#[derive(Clone, Default)]
pub struct OutputBuffer(Rc<RefCell<Vec<u8>>>);

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_goes_to_sink() {
        let buffer = OutputBuffer::new();
        let env = Environment::new(Box::new(buffer.clone()));

        env.print("hello");
        env.print("world");

        assert_eq!(buffer.contents(), "hello\nworld\n");
    }
}
