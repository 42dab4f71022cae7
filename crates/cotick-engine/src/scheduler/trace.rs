//! Task failure capture
//!
//! A failing task reports a message plus the frames that were active when
//! the error was raised, innermost first. Frames that belong to the host
//! (native builtins) are recorded but elided from the rendered traceback.

use std::fmt;

/// One frame of a task's call stack at the point of failure
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TraceFrame {
    /// Function name, if known
    pub name: Option<String>,
    /// Chunk or file the function was loaded from
    pub source: Option<String>,
    /// Current line within `source`
    pub line: Option<u32>,
    /// Frame belongs to the host rather than script code
    pub native: bool,
}

impl TraceFrame {
    /// Script frame with full location info
    pub fn script(name: impl Into<String>, source: impl Into<String>, line: u32) -> Self {
        Self {
            name: Some(name.into()),
            source: Some(source.into()),
            line: if line > 0 { Some(line) } else { None },
            native: false,
        }
    }

    /// Host frame; kept for completeness, never rendered
    pub fn native(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            source: None,
            line: None,
            native: true,
        }
    }
}

/// Error raised by a resumed task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskError {
    /// Error message as raised by the task
    pub message: String,
    /// Frames active when the error was raised, innermost first
    pub trace: Vec<TraceFrame>,
}

impl TaskError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            trace: Vec::new(),
        }
    }

    pub fn with_trace(message: impl Into<String>, trace: Vec<TraceFrame>) -> Self {
        Self {
            message: message.into(),
            trace,
        }
    }

    /// Frames that appear in the rendered traceback
    pub fn visible_frames(&self) -> impl Iterator<Item = &TraceFrame> {
        self.trace.iter().filter(|frame| !frame.native)
    }

    /// Render the message followed by one `at` line per script frame
    pub fn render(&self) -> String {
        let mut out = self.message.clone();
        for frame in self.visible_frames() {
            let name = frame.name.as_deref().unwrap_or("<anonymous>");
            match (&frame.source, frame.line) {
                (Some(source), Some(line)) => {
                    out.push_str(&format!("\n    at {} ({}:{})", name, source, line))
                }
                (Some(source), None) => out.push_str(&format!("\n    at {} ({})", name, source)),
                (None, _) => out.push_str(&format!("\n    at {}", name)),
            }
        }
        out
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TaskError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_without_frames() {
        let err = TaskError::new("boom");
        assert_eq!(err.render(), "boom");
    }

    #[test]
    fn test_render_elides_native_frames() {
        let err = TaskError::with_trace(
            "bad argument",
            vec![
                TraceFrame::native("wait"),
                TraceFrame::script("blink", "main.tick", 4),
                TraceFrame::script("main", "main.tick", 12),
            ],
        );

        assert_eq!(
            err.render(),
            "bad argument\n    at blink (main.tick:4)\n    at main (main.tick:12)"
        );
        assert_eq!(err.visible_frames().count(), 2);
    }

    #[test]
    fn test_render_missing_location() {
        let mut frame = TraceFrame::script("f", "chunk", 0);
        assert_eq!(frame.line, None);
        let err = TaskError::with_trace("x", vec![frame.clone()]);
        assert_eq!(err.render(), "x\n    at f (chunk)");

        frame.source = None;
        frame.name = None;
        let err = TaskError::with_trace("x", vec![frame]);
        assert_eq!(err.render(), "x\n    at <anonymous>");
    }
}
