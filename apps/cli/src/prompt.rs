//! Terminal-backed [`ChoiceSource`] and the indicatif progress reporter.
//!
//! Both share one spinner; prompts suspend it so questions are not drawn
//! over.

use std::io::{BufRead, Write};
use std::time::Duration;

use dunning_core::{ChoiceSource, ProgressReporter};
use dunning_shared::{DunningError, Result};
use indicatif::{ProgressBar, ProgressStyle};

/// Build the shared spinner.
pub(crate) fn spinner() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        bar.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Reads answers from stdin, prints to stdout.
pub(crate) struct TerminalChoices {
    bar: ProgressBar,
}

impl TerminalChoices {
    pub(crate) fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }
}

impl ChoiceSource for TerminalChoices {
    fn show(&mut self, line: &str) {
        self.bar.suspend(|| println!("{line}"));
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        self.bar.suspend(|| {
            print!("{prompt}");
            std::io::stdout()
                .flush()
                .map_err(|e| DunningError::io("<stdout>", e))?;

            let mut line = String::new();
            let read = std::io::stdin()
                .lock()
                .read_line(&mut line)
                .map_err(|e| DunningError::io("<stdin>", e))?;
            if read == 0 {
                return Err(DunningError::InputClosed {
                    prompt: prompt.trim().to_string(),
                });
            }
            Ok(line.trim_end_matches(['\r', '\n']).to_string())
        })
    }
}

/// CLI progress reporter using the shared spinner.
pub(crate) struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    pub(crate) fn new(spinner: ProgressBar) -> Self {
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn customer(&self, name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Delivering [{current}/{total}] {name}"));
    }

    fn done(&self) {
        self.spinner.finish_and_clear();
    }
}
