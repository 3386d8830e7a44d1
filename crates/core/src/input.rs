//! Line-oriented user input
//!
//! The shell reads commands, continuation lines and confirmation answers
//! through [`LineSource`], so the same code runs against a terminal editor,
//! piped stdin or a scripted source in tests.

use crate::error::{Error, Result};

/// A source of input lines
pub trait LineSource {
    /// Show `prompt` and read one line without its line terminator
    ///
    /// Returns `Ok(None)` at end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Record a line entered at the command prompt
    fn add_history(&mut self, _line: &str) {}
}

/// Read a line that must not be empty
///
/// Empty input and end of input both abort the current operation.
pub fn read_non_empty(source: &mut dyn LineSource, prompt: &str) -> Result<String> {
    match source.read_line(prompt)? {
        Some(line) if !line.is_empty() => Ok(line),
        Some(_) => Err(Error::Aborted("aborted by user".into())),
        None => Err(Error::Aborted("unexpected end of input".into())),
    }
}

/// Source that yields a fixed list of lines, recording every prompt shown
#[cfg(any(test, feature = "testing"))]
#[derive(Debug, Default)]
pub struct ScriptedInput {
    lines: std::collections::VecDeque<String>,
    /// Prompts in the order they were shown
    pub prompts: Vec<String>,
}

#[cfg(any(test, feature = "testing"))]
impl ScriptedInput {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }

    /// Number of lines not consumed yet
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

#[cfg(any(test, feature = "testing"))]
impl LineSource for ScriptedInput {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.lines.pop_front())
    }
}
