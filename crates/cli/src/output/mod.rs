//! Output formatting utilities
//!
//! This module provides the formatter for shell output, listing row layout,
//! and progress spinners for batch operations.

mod formatter;
pub mod listing;
mod progress;

pub use formatter::Formatter;
pub use progress::{BatchProgress, ProgressBar};

/// Output configuration derived from CLI flags and settings
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Disable colored output
    pub no_color: bool,
    /// Disable progress spinners
    pub no_progress: bool,
}
