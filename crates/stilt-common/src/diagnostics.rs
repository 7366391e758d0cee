//! Per-file diagnostics for the translator.
//!
//! Diagnostics are append-only per source file and never abort a
//! transformation: the visitor keeps walking and produces best-effort output.
//! The driver inspects the accumulated list after each file and decides
//! whether to proceed.

use serde::Serialize;

use crate::span::Span;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticCategory {
    Warning,
    Error,
}

/// A single translator diagnostic.
///
/// `code` is always 0: the translator has no numbered message catalog, and
/// downstream tooling keys on the message text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
}

impl Diagnostic {
    pub fn error(file: impl Into<String>, span: Span, message: impl Into<String>) -> Self {
        Diagnostic {
            category: DiagnosticCategory::Error,
            code: 0,
            file: file.into(),
            start: if span.is_dummy() { 0 } else { span.start },
            length: if span.is_dummy() { 0 } else { span.len() },
            message_text: message.into(),
        }
    }

    pub fn warning(file: impl Into<String>, span: Span, message: impl Into<String>) -> Self {
        Diagnostic {
            category: DiagnosticCategory::Warning,
            ..Diagnostic::error(file, span, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dummy_span_maps_to_zero() {
        let diag = Diagnostic::error("a.ts", Span::dummy(), "boom");
        assert_eq!(diag.start, 0);
        assert_eq!(diag.length, 0);
        assert_eq!(diag.code, 0);
    }
}
