//! Operator-facing progress lines.
//!
//! This is product output on stdout, separate from `tracing` diagnostics
//! (see [`crate::logging`]). Each line is `<marker> <message>`.

use std::fmt;

/// Severity of a progress line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Info,
    Success,
    Warning,
    Failure,
}

impl Status {
    pub fn marker(self) -> &'static str {
        match self {
            Self::Info => "ℹ",
            Self::Success => "✓",
            Self::Warning => "⚠",
            Self::Failure => "✗",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// Destination for progress lines.
pub trait Progress {
    fn emit(&self, status: Status, message: &str);

    fn info(&self, message: &str) {
        self.emit(Status::Info, message);
    }

    fn success(&self, message: &str) {
        self.emit(Status::Success, message);
    }

    fn warning(&self, message: &str) {
        self.emit(Status::Warning, message);
    }

    fn failure(&self, message: &str) {
        self.emit(Status::Failure, message);
    }
}

/// Writes progress lines to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleProgress;

impl Progress for ConsoleProgress {
    fn emit(&self, status: Status, message: &str) {
        println!("{}", format_line(status, message));
    }
}

pub fn format_line(status: Status, message: &str) -> String {
    format!("{} {}", status.marker(), message)
}
