//! Classification of the scanner's stderr stream

use crate::utils::LINE_ENDING;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static WARNING_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^warning: ").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    Warning,
    Error,
}

/// One non-empty stderr line and its tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub line: String,
}

/// Ordered, tagged stderr lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    lines: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Tag every non-empty line: `warning: ` prefix (any case) is a warning,
    /// everything else an error. Order is kept.
    pub fn classify(stderr: &str) -> Self {
        let lines = stderr
            .lines()
            .filter(|line| !line.is_empty())
            .map(|line| Diagnostic {
                kind: if WARNING_PATTERN.is_match(line) {
                    DiagnosticKind::Warning
                } else {
                    DiagnosticKind::Error
                },
                line: line.to_string(),
            })
            .collect();
        Self { lines }
    }

    pub fn lines(&self) -> &[Diagnostic] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.lines.iter().filter(|d| d.kind == DiagnosticKind::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.lines.iter().filter(|d| d.kind == DiagnosticKind::Error)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Warning lines, each terminated by the platform separator
    pub fn warnings_text(&self) -> String {
        join_lines(self.warnings())
    }

    /// Error lines, each terminated by the platform separator
    pub fn errors_text(&self) -> String {
        join_lines(self.errors())
    }

    /// All lines rejoined in their original order
    pub fn to_text(&self) -> String {
        join_lines(self.lines.iter())
    }
}

fn join_lines<'a>(lines: impl Iterator<Item = &'a Diagnostic>) -> String {
    lines.fold(String::new(), |mut out, d| {
        out.push_str(&d.line);
        out.push_str(LINE_ENDING);
        out
    })
}
