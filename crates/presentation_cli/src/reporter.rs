//! User-facing error output

#![allow(clippy::print_stderr)]

use integration_bus::{ErrorReporter, ErrorSignal, SignalSource};

/// Prints each failure signal to stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    /// Create a reporter; verbose mode adds the failure details
    #[must_use]
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Render a signal as it is printed
    #[must_use]
    pub fn format(&self, signal: &ErrorSignal) -> String {
        if !self.verbose {
            return format!("❌ {}", signal.message);
        }

        let detail = match &signal.source {
            SignalSource::Envelope(body) => body.to_string(),
            SignalSource::Transport(detail) | SignalSource::Client(detail) => detail.clone(),
        };
        format!("❌ {}\n   {detail}", signal.message)
    }
}

impl ErrorReporter for ConsoleReporter {
    fn report(&self, signal: &ErrorSignal) {
        eprintln!("{}", self.format(signal));
    }
}
