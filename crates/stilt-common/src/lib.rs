//! Shared infrastructure for the stilt translator.
//!
//! This crate provides:
//! - `Span` - byte-range source locations
//! - `Diagnostic` - per-file error/warning records
//! - `TranslatorOptions` / `TranslatorHost` - the driver-facing configuration
//!   surface

pub mod diagnostics;
pub mod options;
pub mod span;

pub use diagnostics::{Diagnostic, DiagnosticCategory};
pub use options::{ModuleKind, TranslatorHost, TranslatorOptions};
pub use span::Span;
