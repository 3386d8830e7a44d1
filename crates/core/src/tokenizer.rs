//! Quote-aware command line tokenizer
//!
//! Splits an input line into arguments the way a minimal POSIX shell would:
//! single quotes keep everything literal, double quotes allow backslash
//! escapes, and outside of quotes a backslash makes the next character
//! literal. Only an unquoted space separates arguments. A line that ends
//! inside a quote or after a trailing backslash continues on the next line,
//! with the line break kept inside the argument.

use crate::error::{Error, Result};
use crate::input::LineSource;

/// Prompt shown while a quote or escape is still open
pub const CONTINUATION_PROMPT: &str = "> ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Quote {
    #[default]
    None,
    Single,
    Double,
}

/// Incremental tokenizer fed one line at a time
#[derive(Debug, Default)]
pub struct Tokenizer {
    tokens: Vec<String>,
    buffer: String,
    quote: Quote,
    escape: bool,
    token_start: Option<usize>,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one line
    ///
    /// Returns `true` when the command is complete, `false` when another line
    /// is needed to close a quote or escape.
    pub fn feed(&mut self, line: &str) -> bool {
        if self.needs_more() {
            self.buffer.push('\n');
        }
        self.token_start = None;

        for (pos, c) in line.char_indices() {
            match self.quote {
                Quote::Single => {
                    if c == '\'' {
                        self.quote = Quote::None;
                    } else {
                        self.buffer.push(c);
                    }
                }
                Quote::Double => {
                    if self.escape {
                        self.buffer.push(c);
                        self.escape = false;
                    } else if c == '"' {
                        self.quote = Quote::None;
                    } else if c == '\\' {
                        self.escape = true;
                    } else {
                        self.buffer.push(c);
                    }
                }
                Quote::None if self.escape => {
                    self.buffer.push(c);
                    self.escape = false;
                }
                Quote::None => {
                    if c == ' ' {
                        if !self.buffer.is_empty() {
                            self.tokens.push(std::mem::take(&mut self.buffer));
                        }
                        self.token_start = None;
                        continue;
                    }

                    if self.token_start.is_none() {
                        self.token_start = Some(pos);
                    }
                    match c {
                        '\\' => self.escape = true,
                        '\'' => self.quote = Quote::Single,
                        '"' => self.quote = Quote::Double,
                        _ => self.buffer.push(c),
                    }
                }
            }
        }

        !self.needs_more()
    }

    /// Whether a quote or escape is still open
    pub fn needs_more(&self) -> bool {
        self.escape || self.quote != Quote::None
    }

    /// Arguments completed so far
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Text of the argument currently being accumulated
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Byte offset in the last line where the pending argument starts
    pub fn pending_start(&self) -> Option<usize> {
        self.token_start
    }

    /// Finish tokenizing and return the argument vector
    pub fn finish(mut self) -> Result<Vec<String>> {
        if self.needs_more() {
            return Err(Error::Argument(
                "unterminated quote or escape at end of input".into(),
            ));
        }
        if !self.buffer.is_empty() {
            self.tokens.push(self.buffer);
        }
        Ok(self.tokens)
    }
}

/// Tokenize a single self-contained line
pub fn tokenize(line: &str) -> Result<Vec<String>> {
    let mut tokenizer = Tokenizer::new();
    tokenizer.feed(line);
    tokenizer.finish()
}

/// Tokenize `first`, pulling continuation lines from `more` while needed
pub fn tokenize_with(first: &str, more: &mut dyn LineSource) -> Result<Vec<String>> {
    let mut tokenizer = Tokenizer::new();
    let mut complete = tokenizer.feed(first);
    while !complete {
        match more.read_line(CONTINUATION_PROMPT)? {
            Some(line) => complete = tokenizer.feed(&line),
            None => break,
        }
    }
    tokenizer.finish()
}
