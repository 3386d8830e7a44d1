//! Output formatter for shell messages
//!
//! Ensures consistent output formatting across all commands. Output normally
//! goes to the terminal; a buffered formatter collects it instead so tests can
//! inspect what a command printed.

use std::sync::{Arc, Mutex};

use console::Style;

use super::OutputConfig;

#[derive(Debug, Clone, Default)]
enum Sink {
    #[default]
    Terminal,
    Buffer(Arc<Mutex<String>>),
}

/// Formatter for shell output
#[derive(Debug, Clone)]
pub struct Formatter {
    config: OutputConfig,
    sink: Sink,
}

impl Formatter {
    /// Formatter writing to the terminal
    pub fn new(config: OutputConfig) -> Self {
        Self {
            config,
            sink: Sink::Terminal,
        }
    }

    /// Create a formatter that records output instead of printing it
    pub fn buffered() -> Self {
        Self {
            config: OutputConfig {
                no_color: true,
                no_progress: true,
            },
            sink: Sink::Buffer(Arc::default()),
        }
    }

    /// Everything recorded so far by a buffered formatter
    pub fn captured(&self) -> String {
        match &self.sink {
            Sink::Terminal => String::new(),
            Sink::Buffer(buffer) => buffer.lock().map(|b| b.clone()).unwrap_or_default(),
        }
    }

    pub fn colors_enabled(&self) -> bool {
        !self.config.no_color
    }

    /// Check if progress spinners may be shown
    pub fn progress_enabled(&self) -> bool {
        !self.config.no_progress && matches!(self.sink, Sink::Terminal)
    }

    fn write(&self, line: &str, stderr: bool) {
        match &self.sink {
            Sink::Terminal if stderr => eprintln!("{line}"),
            Sink::Terminal => println!("{line}"),
            Sink::Buffer(buffer) => {
                if let Ok(mut buffer) = buffer.lock() {
                    buffer.push_str(line);
                    buffer.push('\n');
                }
            }
        }
    }

    fn paint(&self, style: Style, text: &str) -> String {
        style
            .force_styling(self.colors_enabled())
            .apply_to(text)
            .to_string()
    }

    /// Print a line of text
    pub fn println(&self, message: &str) {
        self.write(message, false);
    }

    /// Confirmation of a finished mutation
    pub fn success(&self, message: &str) {
        let line = self.paint(Style::new().green(), message);
        self.write(&line, false);
    }

    /// Output a warning banner line
    pub fn warning(&self, message: &str) {
        let line = self.paint(Style::new().red().bold(), message);
        self.write(&line, false);
    }

    /// Errors go to stderr prefixed with `ERR:`
    pub fn error(&self, message: &str) {
        let line = format!("{} {message}", self.paint(Style::new().red().bold(), "ERR:"));
        self.write(&line, true);
    }

    /// Target name as shown in the prompt
    pub fn target(&self, text: &str) -> String {
        self.paint(Style::new().green().bold(), text)
    }

    /// Current prefix as shown in the prompt
    pub fn prefix(&self, text: &str) -> String {
        self.paint(Style::new().blue().bold(), text)
    }

    /// Search match inside a listed name
    pub fn highlight(&self, text: &str) -> String {
        self.paint(Style::new().red().bold(), text)
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}
