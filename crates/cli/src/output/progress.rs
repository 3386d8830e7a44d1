//! Progress display for batch operations
//!
//! A spinner shows the running byte total while a batch runs; per-object
//! lines are printed above it.

use s3c_core::BatchObserver;

use super::Formatter;

/// Spinner wrapper
///
/// Hidden when progress is disabled or output is not a terminal.
#[derive(Debug)]
pub struct ProgressBar {
    bar: Option<indicatif::ProgressBar>,
}

impl ProgressBar {
    /// Create a spinner for indeterminate progress
    pub fn spinner(formatter: &Formatter, message: &str) -> Self {
        let visible = formatter.progress_enabled() && console::Term::stdout().is_term();
        let bar = if visible {
            let bar = indicatif::ProgressBar::new_spinner();
            if let Ok(style) = indicatif::ProgressStyle::default_spinner().template("{spinner:.green} {msg}")
            {
                bar.set_style(style);
            }
            bar.set_message(message.to_string());
            bar.enable_steady_tick(std::time::Duration::from_millis(100));
            Some(bar)
        } else {
            None
        };

        Self { bar }
    }

    /// Set message
    pub fn set_message(&self, message: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(message.to_string());
        }
    }

    /// Run `f` with the spinner hidden, so printed lines do not tear it
    pub fn suspend<R>(&self, f: impl FnOnce() -> R) -> R {
        match &self.bar {
            Some(bar) => bar.suspend(f),
            None => f(),
        }
    }

    /// Finish and clear the spinner
    pub fn finish_and_clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

/// Batch observer printing one line per object
pub struct BatchProgress {
    formatter: Formatter,
    spinner: ProgressBar,
    action: &'static str,
}

impl BatchProgress {
    /// Start a spinner; each processed item prints `"  <action> <label>"`
    pub fn new(formatter: &Formatter, action: &'static str) -> Self {
        Self {
            formatter: formatter.clone(),
            spinner: ProgressBar::spinner(formatter, action),
            action,
        }
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl BatchObserver for BatchProgress {
    fn processed(&mut self, label: &str, _bytes: u64, total_bytes: u64) {
        let line = format!("  {} {label}", self.action);
        self.spinner.suspend(|| self.formatter.println(&line));
        self.spinner.set_message(&format!(
            "{} {}",
            self.action,
            humansize::format_size(total_bytes, humansize::BINARY)
        ));
    }
}

impl Drop for BatchProgress {
    fn drop(&mut self) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_hidden_when_buffered() {
        let formatter = Formatter::buffered();
        let bar = ProgressBar::spinner(&formatter, "copying");
        assert!(bar.bar.is_none());
    }

    #[test]
    fn test_batch_progress_prints_items() {
        let formatter = Formatter::buffered();
        let mut progress = BatchProgress::new(&formatter, "deleted");
        progress.processed("a/1", 3, 3);
        progress.processed("a/2", 4, 7);
        progress.finish();
        assert_eq!(formatter.captured(), "  deleted a/1\n  deleted a/2\n");
    }
}
