//! Annotation emission for the stilt translator.
//!
//! This crate provides:
//! - `jsdoc` - the structured comment tag model, parsing and serialization
//! - `TypeTranslator` - checker-level types to Closure type strings
//! - `ModuleTranslator` - per-file aliases, forward declares, diagnostics
//! - `annotate_source_file` - the tree rewriter for non-declaration input
//! - `generate_externs` - the stub printer for declaration-only input
//! - `print_statements` - annotation-dialect JavaScript output
//!
//! The driver routes each source file either through `annotate_source_file`
//! (rewritten tree out) or `generate_externs` (string out); both share the
//! `ModuleTranslator` and, through it, the checker.

pub mod annotator;
mod class_members;
pub mod externs;
pub mod jsdoc;
pub mod module_translator;
pub mod printer;
pub mod testing;
pub mod type_translator;

pub use annotator::{annotate_source_file, AnnotationResult};
pub use externs::{generate_externs, ExternsResult, DECLARED_MODULE_ROOT};
pub use module_translator::{ForwardDeclare, ModuleTranslator, MutableJsDoc};
pub use printer::print_statements;
pub use type_translator::TypeTranslator;

#[cfg(test)]
mod externs_tests;
