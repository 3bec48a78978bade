//! Records the errors a run produced, split into compile-time and runtime.
//!
//! Nothing in here prints. The driver reads the flags to pick an exit code and
//! decides how (and whether) to show [`Diagnostics::reports`].

use std::fmt;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Compile,
    Runtime,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Compile => write!(f, "error"),
            Severity::Runtime => write!(f, "runtime error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub severity: Severity,
    pub text: String,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Renders one diagnostic line, e.g. `error: [line 2] at '=': Invalid assignment target.`
pub fn format_report(message: &str, severity: Severity) -> String {
    format!("{}: {}", severity, message)
}

#[derive(Debug, Default)]
pub struct Diagnostics {
    had_error: bool,
    had_runtime_error: bool,
    reports: Vec<Report>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, error: &Error) {
        let severity = if error.is_runtime_error() {
            self.had_runtime_error = true;
            Severity::Runtime
        } else {
            self.had_error = true;
            Severity::Compile
        };

        let text = format_report(&error.to_string(), severity);
        tracing::debug!(%severity, report = %text, "diagnostic recorded");
        self.reports.push(Report { severity, text });
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    /// Hands back the reports gathered so far, leaving the flags untouched.
    pub fn take_reports(&mut self) -> Vec<Report> {
        std::mem::take(&mut self.reports)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Token, TokenKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn compile_and_runtime_flags_are_independent() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.report(&Error::lexical(1, "Unexpected character '#'."));
        assert!(diagnostics.had_error());
        assert!(!diagnostics.had_runtime_error());

        let token = Token::new(TokenKind::Minus, "-", 2);
        diagnostics.report(&Error::type_error(token, "Operand must be a number."));
        assert!(diagnostics.had_runtime_error());

        assert_eq!(
            vec![
                "error: [line 1]: Unexpected character '#'.",
                "runtime error: [line 2] at '-': TypeError: Operand must be a number.",
            ],
            diagnostics.reports().iter().map(|r| r.to_string()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn take_reports_keeps_flags() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.report(&Error::lexical(1, "Unterminated string."));
        assert_eq!(1, diagnostics.take_reports().len());
        assert!(diagnostics.reports().is_empty());
        assert!(diagnostics.had_error());

        diagnostics.reset();
        assert!(!diagnostics.had_error());
    }

    #[test]
    fn format_report_prefixes_severity() {
        assert_eq!("runtime error: boom", format_report("boom", Severity::Runtime));
    }
}
